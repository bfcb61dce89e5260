use chrono::{Datelike, NaiveDate};

/// A date found in free text, with the byte span it occupied so callers can
/// strip it when recovering a title.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    text: &'a str,
}

type RuleFn = fn(&[Token<'_>], NaiveDate) -> Option<DateMatch>;

/// Rules in fixed priority order. The first rule that matches anywhere in
/// the text wins; within a rule we scan left-to-right.
const RULES: [RuleFn; 5] = [
    rule_month_day_year,
    rule_month_day,
    rule_numeric_mdy,
    rule_numeric_md,
    rule_iso_ymd,
];

/// Parse a calendar date out of a text fragment. `today` supplies the year
/// for year-less formats; no-match policy belongs to the caller.
pub fn extract_date(text: &str, today: NaiveDate) -> Option<DateMatch> {
    let tokens = tokenize(text);
    for rule in RULES {
        if let Some(m) = rule(&tokens, today) {
            return Some(m);
        }
    }
    None
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token {
                    start: s,
                    text: &text[s..i],
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(Token {
            start: s,
            text: &text[s..],
        });
    }
    out
}

/// Strip surrounding punctuation a pasted cell tends to carry. Returns the
/// cleaned slice and its absolute start offset.
fn clean<'a>(tok: &Token<'a>) -> (&'a str, usize) {
    let mut s = tok.text;
    let mut off = tok.start;
    while let Some(rest) = s.strip_prefix(['(', '[']) {
        s = rest;
        off += 1;
    }
    while let Some(rest) = s.strip_suffix([',', '.', ';', ':', ')', ']']) {
        s = rest;
    }
    (s, off)
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Full month names and abbreviations of 3+ letters, case-insensitive.
fn month_from_name(s: &str) -> Option<u32> {
    if s.len() < 3 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let lower = s.to_ascii_lowercase();
    for (i, name) in MONTH_NAMES.iter().enumerate() {
        if name.starts_with(&lower) {
            return Some(i as u32 + 1);
        }
    }
    None
}

/// Day-of-month with an optional ordinal suffix ("26", "1st", "23rd").
fn parse_day(s: &str) -> Option<u32> {
    let mut digits = s;
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(rest) = strip_suffix_ci(digits, suffix) {
            digits = rest;
            break;
        }
    }
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let d: u32 = digits.parse().ok()?;
    (1..=31).contains(&d).then_some(d)
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() < suffix.len() {
        return None;
    }
    let (head, tail) = s.split_at(s.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn four_digit_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn rule_month_day_year(tokens: &[Token<'_>], _today: NaiveDate) -> Option<DateMatch> {
    for w in tokens.windows(3) {
        let (m_text, m_off) = clean(&w[0]);
        let Some(month) = month_from_name(m_text) else {
            continue;
        };
        let (d_text, _) = clean(&w[1]);
        let Some(day) = parse_day(d_text) else {
            continue;
        };
        let (y_text, y_off) = clean(&w[2]);
        let Some(year) = four_digit_year(y_text) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(DateMatch {
                date,
                start: m_off,
                end: y_off + y_text.len(),
            });
        }
    }
    None
}

fn rule_month_day(tokens: &[Token<'_>], today: NaiveDate) -> Option<DateMatch> {
    for w in tokens.windows(2) {
        let (m_text, m_off) = clean(&w[0]);
        let Some(month) = month_from_name(m_text) else {
            continue;
        };
        let (d_text, d_off) = clean(&w[1]);
        let Some(day) = parse_day(d_text) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
            return Some(DateMatch {
                date,
                start: m_off,
                end: d_off + d_text.len(),
            });
        }
    }
    None
}

fn numeric_parts(s: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .then_some(parts)
}

fn rule_numeric_mdy(tokens: &[Token<'_>], _today: NaiveDate) -> Option<DateMatch> {
    for tok in tokens {
        let (text, off) = clean(tok);
        let Some(parts) = numeric_parts(text) else {
            continue;
        };
        if parts.len() != 3 || parts[0].len() == 4 {
            // A 4-digit lead component is ISO; rule 5's business.
            continue;
        }
        let Ok(month) = parts[0].parse::<u32>() else {
            continue;
        };
        let Ok(day) = parts[1].parse::<u32>() else {
            continue;
        };
        let year: i32 = match (parts[2].len(), parts[2].parse::<i32>()) {
            (2, Ok(y)) => 2000 + y,
            (4, Ok(y)) => y,
            _ => continue,
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(DateMatch {
                date,
                start: off,
                end: off + text.len(),
            });
        }
    }
    None
}

fn rule_numeric_md(tokens: &[Token<'_>], today: NaiveDate) -> Option<DateMatch> {
    for tok in tokens {
        let (text, off) = clean(tok);
        if !text.contains('/') {
            continue;
        }
        let Some(parts) = numeric_parts(text) else {
            continue;
        };
        if parts.len() != 2 {
            continue;
        }
        let Ok(month) = parts[0].parse::<u32>() else {
            continue;
        };
        let Ok(day) = parts[1].parse::<u32>() else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
            return Some(DateMatch {
                date,
                start: off,
                end: off + text.len(),
            });
        }
    }
    None
}

fn rule_iso_ymd(tokens: &[Token<'_>], _today: NaiveDate) -> Option<DateMatch> {
    for tok in tokens {
        let (text, off) = clean(tok);
        let Some(parts) = numeric_parts(text) else {
            continue;
        };
        if parts.len() != 3 || parts[0].len() != 4 {
            continue;
        }
        let (Ok(year), Ok(month), Ok(day)) = (
            parts[0].parse::<i32>(),
            parts[1].parse::<u32>(),
            parts[2].parse::<u32>(),
        ) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(DateMatch {
                date,
                start: off,
                end: off + text.len(),
            });
        }
    }
    None
}
