use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::class_code::{find_class_code, ClassRegistry};
use super::{date, kind, looks_like_header, ParseError};
use crate::model::{new_id, normalize_class_code, AcademicItem, ClassInfo, ItemStatus};

/// Where each inferred field came from, kept intact for the review UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    Matched,
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassSource {
    Known,
    New,
    None,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub date: FieldSource,
    pub class: ClassSource,
    #[serde(rename = "type")]
    pub kind: FieldSource,
}

/// One Smart Paste candidate, for human review before commit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub item: AcademicItem,
    /// 1 = exam .. 6 = lecture; drives the review ordering only.
    pub rank: u8,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

/// Advisory note attached to candidates whose class code matches. Domain
/// data, injectable so the parser stays general.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRule {
    pub class_code: String,
    pub note: String,
}

/// The one product rule shipped by default.
pub fn default_annotation_rules() -> Vec<AnnotationRule> {
    vec![AnnotationRule {
        class_code: "MGMT495".to_string(),
        note: "Final exam is mandatory for this course".to_string(),
    }]
}

#[derive(Debug, Clone)]
pub struct FreeTextOutcome {
    pub candidates: Vec<Candidate>,
    pub new_classes: Vec<ClassInfo>,
}

fn is_separator_line(line: &str) -> bool {
    let mut saw_rule_char = false;
    for c in line.chars() {
        match c {
            '-' | '=' => saw_rule_char = true,
            c if c.is_whitespace() => {}
            _ => return false,
        }
    }
    saw_rule_char
}

/// Remove a byte span from `line`, keeping both sides.
fn strip_span(line: &str, start: usize, end: usize) -> String {
    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..start]);
    out.push(' ');
    out.push_str(&line[end..]);
    out
}

const TITLE_TRIM: &[char] = &['-', '|', ',', '.', ':', ' ', '\t'];

fn tidy_title(raw: &str) -> String {
    raw.trim_matches(TITLE_TRIM)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-effort heuristic parse of unstructured multi-line text. Every
/// candidate carries a valid date (today when none was recognized) and a
/// non-empty title; output is sorted by urgency rank, stable on input
/// order. Never touches persisted state.
pub fn parse_free_text(
    text: &str,
    known_classes: &[ClassInfo],
    today: NaiveDate,
    annotation_rules: &[AnnotationRule],
) -> Result<FreeTextOutcome, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut registry = ClassRegistry::new(known_classes);
    let mut candidates: Vec<Candidate> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || looks_like_header(line) || is_separator_line(line) {
            continue;
        }

        let date_match = date::extract_date(line, today);
        // Scan for the class code with the date already removed; "Feb 15"
        // has the letters-then-digits shape of a course code.
        let sans_date = match &date_match {
            Some(d) => strip_span(line, d.start, d.end),
            None => line.to_string(),
        };
        let class_match = find_class_code(&sans_date, registry.known());
        let (item_type, kind_matched) = kind::classify_with_provenance(line);

        let remainder = match &class_match {
            Some(c) => strip_span(&sans_date, c.start, c.end),
            None => sans_date.clone(),
        };

        let mut title = tidy_title(&remainder);
        if title.len() <= 2 {
            if date_match.is_none() && class_match.is_none() && !kind_matched {
                // Nothing recognizable on this line at all.
                continue;
            }
            title = item_type.display_name().to_string();
        }

        let class_source = match &class_match {
            Some(m) if m.known => ClassSource::Known,
            Some(_) => ClassSource::New,
            None => ClassSource::None,
        };
        let (class_code, class_name) = match &class_match {
            Some(m) => registry.resolve(&m.code, &m.name).unwrap_or_default(),
            None => (String::new(), String::new()),
        };

        let due_date = date_match.map(|m| m.date).unwrap_or(today);
        let normalized = normalize_class_code(&class_code);
        let annotations: Vec<String> = annotation_rules
            .iter()
            .filter(|r| !normalized.is_empty() && normalize_class_code(&r.class_code) == normalized)
            .map(|r| r.note.clone())
            .collect();

        candidates.push(Candidate {
            item: AcademicItem {
                id: new_id(),
                title,
                class_code,
                class_name,
                item_type,
                status: ItemStatus::default(),
                due_date: due_date.format("%Y-%m-%d").to_string(),
                time: None,
                grade: None,
                is_late: None,
                days_late: None,
                grade_category: None,
                semester_id: String::new(),
            },
            rank: item_type.rank(),
            provenance: Provenance {
                date: if date_match.is_some() {
                    FieldSource::Matched
                } else {
                    FieldSource::Defaulted
                },
                class: class_source,
                kind: if kind_matched {
                    FieldSource::Matched
                } else {
                    FieldSource::Defaulted
                },
            },
            annotations,
        });
    }

    if candidates.is_empty() {
        return Err(ParseError::ZeroYield);
    }

    // Exams surface first; sort_by_key is stable so input order breaks ties.
    candidates.sort_by_key(|c| c.rank);

    Ok(FreeTextOutcome {
        candidates,
        new_classes: registry.into_discovered(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("fixed today")
    }

    fn parse(text: &str) -> FreeTextOutcome {
        parse_free_text(text, &[], today(), &[]).expect("parse")
    }

    #[test]
    fn dash_separated_line_extracts_all_fields() {
        let out = parse("Feb 15 - ECON330 - Quiz 1");
        assert_eq!(out.candidates.len(), 1);
        let c = &out.candidates[0];
        assert_eq!(c.item.class_code, "ECON330");
        assert_eq!(c.item.item_type, ItemType::Quiz);
        assert_eq!(c.item.due_date, "2026-02-15");
        assert_eq!(c.item.title, "Quiz 1");
        assert_eq!(c.provenance.date, FieldSource::Matched);
        assert_eq!(c.provenance.class, ClassSource::New);
        assert_eq!(out.new_classes.len(), 1);
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let out = parse("CS200 homework 4");
        let c = &out.candidates[0];
        assert_eq!(c.item.due_date, "2026-03-01");
        assert_eq!(c.provenance.date, FieldSource::Defaulted);
    }

    #[test]
    fn titles_are_never_empty() {
        // Only a date and a class code; the type name becomes the title.
        let out = parse("MATH101 2/20/2026");
        let c = &out.candidates[0];
        assert_eq!(c.item.title, "Assignment");
        for text in ["exam ECON330 3/14/2026", "quiz", "Feb 20 essay"] {
            let out = parse(text);
            assert!(out.candidates.iter().all(|c| !c.item.title.is_empty()));
        }
    }

    #[test]
    fn unrecognizable_lines_are_dropped() {
        let out = parse("ok\nFeb 15 - ECON330 - Quiz 1\nzz");
        assert_eq!(out.candidates.len(), 1);
    }

    #[test]
    fn header_and_separator_lines_are_skipped() {
        let text = "Date | Class | Assignment\n----------\nFeb 15 - ECON330 - Quiz 1\n======";
        let out = parse(text);
        assert_eq!(out.candidates.len(), 1);
    }

    #[test]
    fn candidates_sort_by_urgency_stable() {
        let text = "CS200 homework 4\n\
                    ECON330 final exam May 8\n\
                    CS200 quiz Mar 20\n\
                    MATH101 midterm Apr 2";
        let out = parse(text);
        let kinds: Vec<ItemType> = out.candidates.iter().map(|c| c.item.item_type).collect();
        assert_eq!(
            kinds,
            [
                ItemType::Exam,
                ItemType::Exam,
                ItemType::Quiz,
                ItemType::Homework
            ]
        );
        // The two exams keep their input order.
        assert_eq!(out.candidates[0].item.class_code, "ECON330");
        assert_eq!(out.candidates[1].item.class_code, "MATH101");
    }

    #[test]
    fn annotation_rules_decorate_matching_candidates() {
        let rules = vec![AnnotationRule {
            class_code: "econ 330".to_string(),
            note: "Final exam is mandatory".to_string(),
        }];
        let out =
            parse_free_text("ECON330 final exam May 8\nCS200 quiz Mar 20", &[], today(), &rules)
                .expect("parse");
        assert_eq!(out.candidates[0].annotations, ["Final exam is mandatory"]);
        assert!(out.candidates[1].annotations.is_empty());
    }

    #[test]
    fn known_class_resolves_name_and_provenance() {
        let known = vec![ClassInfo {
            code: "ECON330".to_string(),
            name: "Intermediate Macro".to_string(),
            color: "blue".to_string(),
            has_late_penalty: false,
            kill_switch: None,
        }];
        let out = parse_free_text("ECON330 quiz Friday Mar 6", &known, today(), &[])
            .expect("parse");
        let c = &out.candidates[0];
        assert_eq!(c.provenance.class, ClassSource::Known);
        assert_eq!(c.item.class_name, "Intermediate Macro");
        assert!(out.new_classes.is_empty());
    }

    #[test]
    fn empty_and_unusable_input_error_distinctly() {
        assert_eq!(
            parse_free_text("  \n ", &[], today(), &[]).unwrap_err(),
            ParseError::EmptyInput
        );
        assert_eq!(
            parse_free_text("--------\nDate Class\n..", &[], today(), &[]).unwrap_err(),
            ParseError::ZeroYield
        );
    }
}
