use crate::model::{normalize_class_code, palette_color, ClassInfo};

/// A course-code token found in text: 2-6 letters, optional whitespace,
/// 2-4 digits ("MATH101", "CS 200").
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMatch {
    pub code: String,
    pub name: String,
    /// True when the code resolved against the known class list.
    pub known: bool,
    pub start: usize,
    pub end: usize,
}

/// Scan `text` for the first course-code token and resolve it against
/// `known` by exact normalized-code match. On a miss the normalized token
/// serves as both code and name.
pub fn find_class_code(text: &str, known: &[ClassInfo]) -> Option<ClassMatch> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_alphabetic() {
            i += 1;
            continue;
        }
        // Letter tokens must start at a word boundary.
        if i > 0 && bytes[i - 1].is_ascii_alphanumeric() {
            i += 1;
            continue;
        }
        let letters_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let letters_len = i - letters_start;
        if !(2..=6).contains(&letters_len) {
            continue;
        }
        let mut j = i;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let digits_len = j - digits_start;
        if !(2..=4).contains(&digits_len) {
            continue;
        }
        if j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
            // Trailing run continues; not a clean code token.
            i = j;
            continue;
        }
        let raw = &text[letters_start..j];
        let code = normalize_class_code(raw);
        if let Some(existing) = known.iter().find(|c| c.code == code) {
            return Some(ClassMatch {
                code: existing.code.clone(),
                name: existing.name.clone(),
                known: true,
                start: letters_start,
                end: j,
            });
        }
        return Some(ClassMatch {
            code: code.clone(),
            name: code,
            known: false,
            start: letters_start,
            end: j,
        });
    }
    None
}

/// Tabular class cells may carry "CODE - Name"; split on the first
/// space-dash-space. Otherwise the whole cell is the code and the name.
pub fn split_code_name(cell: &str) -> (String, String) {
    if let Some((code_part, name_part)) = cell.split_once(" - ") {
        let code = normalize_class_code(code_part);
        let name = name_part.trim().to_string();
        if !code.is_empty() && !name.is_empty() {
            return (code, name);
        }
    }
    let code = normalize_class_code(cell);
    (code.clone(), code)
}

/// Tracks known classes plus classes discovered during one parse, handing
/// out palette colors round-robin so a re-parse in the same session is
/// color-stable.
pub struct ClassRegistry<'a> {
    known: &'a [ClassInfo],
    discovered: Vec<ClassInfo>,
}

impl<'a> ClassRegistry<'a> {
    pub fn new(known: &'a [ClassInfo]) -> Self {
        Self {
            known,
            discovered: Vec::new(),
        }
    }

    pub fn known(&self) -> &[ClassInfo] {
        self.known
    }

    fn lookup(&self, code: &str) -> Option<&ClassInfo> {
        self.known
            .iter()
            .chain(self.discovered.iter())
            .find(|c| c.code == code)
    }

    /// Resolve a code/name pair, registering a new ClassInfo the first time
    /// a code is seen. Empty codes resolve to nothing.
    pub fn resolve(&mut self, code: &str, name: &str) -> Option<(String, String)> {
        if code.is_empty() {
            return None;
        }
        if let Some(existing) = self.lookup(code) {
            return Some((existing.code.clone(), existing.name.clone()));
        }
        let color = palette_color(self.known.len() + self.discovered.len());
        let info = ClassInfo {
            code: code.to_string(),
            name: name.to_string(),
            color,
            has_late_penalty: false,
            kill_switch: None,
        };
        let out = (info.code.clone(), info.name.clone());
        self.discovered.push(info);
        Some(out)
    }

    /// Newly discovered classes in first-seen order.
    pub fn into_discovered(self) -> Vec<ClassInfo> {
        self.discovered
    }
}
