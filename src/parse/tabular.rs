use chrono::NaiveDate;

use super::class_code::{split_code_name, ClassRegistry};
use super::{date, kind, looks_like_header, ParseError, ParsedBatch};
use crate::model::{new_id, AcademicItem, ClassInfo, ItemStatus, ItemType};

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    class: usize,
    title: usize,
    due: usize,
    kind: Option<usize>,
    time: Option<usize>,
}

fn find_column(cells: &[String], synonyms: &[&str]) -> Option<usize> {
    cells
        .iter()
        .position(|c| synonyms.iter().any(|s| c.eq_ignore_ascii_case(s)))
}

fn derive_columns(header_cells: &[String]) -> ColumnMap {
    ColumnMap {
        class: find_column(header_cells, &["class", "course", "subject"]).unwrap_or(0),
        title: find_column(header_cells, &["title", "name", "assignment"]).unwrap_or(1),
        due: find_column(header_cells, &["due date", "due", "date"]).unwrap_or(2),
        kind: find_column(header_cells, &["type", "category"]),
        time: find_column(header_cells, &["time"]),
    }
}

fn split_cells(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(|c| c.trim().to_string()).collect()
}

fn cell<'a>(cells: &'a [String], idx: usize) -> &'a str {
    cells.get(idx).map(String::as_str).unwrap_or("")
}

/// Parse multi-line delimited text with a header row into items plus any
/// newly seen classes. Multiple pasted sheets are supported: a row equal to
/// an earlier header line, or that looks like a header, restarts the column
/// mapping from that point.
pub fn parse_tabular(
    text: &str,
    known_classes: &[ClassInfo],
    today: NaiveDate,
) -> Result<ParsedBatch, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().ok_or(ParseError::EmptyInput)?;
    let delimiter = if header_line.contains('\t') { '\t' } else { ',' };

    let mut seen_headers: Vec<String> = vec![header_line.trim().to_string()];
    let mut columns = derive_columns(&split_cells(header_line, delimiter));

    let mut registry = ClassRegistry::new(known_classes);
    let mut items: Vec<AcademicItem> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if seen_headers.iter().any(|h| h == trimmed) || looks_like_header(trimmed) {
            // A repeated or fresh header: a new sheet begins here.
            seen_headers.push(trimmed.to_string());
            columns = derive_columns(&split_cells(line, delimiter));
            continue;
        }

        let cells = split_cells(line, delimiter);
        let class_cell = cell(&cells, columns.class);
        let title_cell = cell(&cells, columns.title);
        if class_cell.is_empty() && title_cell.is_empty() {
            continue;
        }

        let (raw_code, raw_name) = split_code_name(class_cell);
        let (class_code, class_name) = registry
            .resolve(&raw_code, &raw_name)
            .unwrap_or_default();

        let due_date = date::extract_date(cell(&cells, columns.due), today)
            .map(|m| m.date)
            .unwrap_or(today);

        let item_type = match columns.kind {
            Some(idx) if !cell(&cells, idx).is_empty() => kind::classify(cell(&cells, idx)),
            _ => ItemType::Assignment,
        };

        let time = columns
            .time
            .map(|idx| cell(&cells, idx))
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let title = if title_cell.is_empty() {
            item_type.display_name().to_string()
        } else {
            title_cell.to_string()
        };

        items.push(AcademicItem {
            id: new_id(),
            title,
            class_code,
            class_name,
            item_type,
            status: ItemStatus::default(),
            due_date: due_date.format("%Y-%m-%d").to_string(),
            time,
            grade: None,
            is_late: None,
            days_late: None,
            grade_category: None,
            semester_id: String::new(),
        });
    }

    if items.is_empty() {
        return Err(ParseError::ZeroYield);
    }

    Ok(ParsedBatch {
        items,
        new_classes: registry.into_discovered(),
    })
}
