pub mod class_code;
pub mod date;
pub mod free_text;
pub mod kind;
pub mod tabular;

use crate::model::{AcademicItem, ClassInfo};

/// Structured output of either paste parser: the records plus any classes
/// the text introduced, in first-seen order.
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub items: Vec<AcademicItem>,
    pub new_classes: Vec<ClassInfo>,
}

/// Parse failures the UI must distinguish; field-level problems degrade
/// instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Blank or whitespace-only paste, rejected before parsing.
    EmptyInput,
    /// Parsing ran but no usable record survived.
    ZeroYield,
}

impl ParseError {
    pub fn code(self) -> &'static str {
        match self {
            ParseError::EmptyInput => "empty_input",
            ParseError::ZeroYield => "zero_yield",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ParseError::EmptyInput => "paste some text first",
            ParseError::ZeroYield => {
                "no rows could be read; use Tab or comma to separate columns"
            }
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ParseError {}

/// Header-ish lines mention both a date column and a class/type column.
pub(crate) fn looks_like_header(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("date") && (lower.contains("class") || lower.contains("type"))
}
