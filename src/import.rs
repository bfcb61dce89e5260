use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{
    default_grade_weights, new_id, normalize_class_code, AcademicItem, ClassInfo, Semester,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Discard all prior state and install a fresh semester.
    Replace,
    /// Union into the current semester.
    Add,
}

impl ImportMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(ImportMode::Replace),
            "add" => Some(ImportMode::Add),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// Add-mode with no semester to merge into.
    NoTargetSemester,
}

impl MergeError {
    pub fn code(self) -> &'static str {
        match self {
            MergeError::NoTargetSemester => "merge_no_semester",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MergeError::NoTargetSemester => "no semester to add to; import with replace first",
        }
    }
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MergeError {}

/// The complete next persisted state; the caller applies it atomically.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub items: Vec<AcademicItem>,
    pub semesters: Vec<Semester>,
    pub current_semester_id: String,
}

fn season_name(today: NaiveDate) -> String {
    let season = match today.month() {
        1..=5 => "Spring",
        6..=8 => "Summer",
        _ => "Fall",
    };
    format!("{} {}", season, today.year())
}

/// Drop later duplicates by normalized code, preserving input order.
fn dedup_by_code(classes: Vec<ClassInfo>) -> Vec<ClassInfo> {
    let mut out: Vec<ClassInfo> = Vec::with_capacity(classes.len());
    for class in classes {
        let code = normalize_class_code(&class.code);
        if !out.iter().any(|c: &ClassInfo| normalize_class_code(&c.code) == code) {
            out.push(class);
        }
    }
    out
}

/// Reconcile a parsed batch against existing state. Pure copy-in/copy-out:
/// inputs are never mutated, the outcome is the whole next state.
pub fn merge_import(
    existing_items: &[AcademicItem],
    existing_semesters: &[Semester],
    current_semester_id: &str,
    batch_items: Vec<AcademicItem>,
    batch_classes: Vec<ClassInfo>,
    mode: ImportMode,
    today: NaiveDate,
) -> Result<MergeOutcome, MergeError> {
    match mode {
        ImportMode::Replace => {
            let semester_id = new_id();
            let classes = dedup_by_code(batch_classes);

            let mut grade_weights = serde_json::Map::new();
            for class in &classes {
                grade_weights.insert(class.code.clone(), default_grade_weights());
            }

            let semester = Semester {
                id: semester_id.clone(),
                name: season_name(today),
                start_date: today.format("%Y-%m-%d").to_string(),
                end_date: (today + Duration::days(120)).format("%Y-%m-%d").to_string(),
                classes,
                grade_weights,
            };

            let items = batch_items
                .into_iter()
                .map(|mut item| {
                    item.semester_id = semester_id.clone();
                    item
                })
                .collect();

            Ok(MergeOutcome {
                items,
                semesters: vec![semester],
                current_semester_id: semester_id,
            })
        }
        ImportMode::Add => {
            let target_idx = existing_semesters
                .iter()
                .position(|s| s.id == current_semester_id)
                .or(if existing_semesters.is_empty() { None } else { Some(0) })
                .ok_or(MergeError::NoTargetSemester)?;

            let mut semesters = existing_semesters.to_vec();
            let target = &mut semesters[target_idx];

            for class in dedup_by_code(batch_classes) {
                let code = normalize_class_code(&class.code);
                let exists = target
                    .classes
                    .iter()
                    .any(|c| normalize_class_code(&c.code) == code);
                if exists {
                    // Existing entry wins; the parsed duplicate is dropped.
                    continue;
                }
                if !target.grade_weights.contains_key(&class.code) {
                    target
                        .grade_weights
                        .insert(class.code.clone(), default_grade_weights());
                }
                target.classes.push(class);
            }

            let target_id = target.id.clone();
            let mut items = existing_items.to_vec();
            items.extend(batch_items.into_iter().map(|mut item| {
                item.semester_id = target_id.clone();
                item
            }));

            Ok(MergeOutcome {
                items,
                semesters,
                current_semester_id: target_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemStatus, ItemType};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 10).expect("fixed today")
    }

    fn class(code: &str) -> ClassInfo {
        ClassInfo {
            code: code.to_string(),
            name: code.to_string(),
            color: "blue".to_string(),
            has_late_penalty: false,
            kill_switch: None,
        }
    }

    fn item(title: &str, code: &str) -> AcademicItem {
        AcademicItem {
            id: new_id(),
            title: title.to_string(),
            class_code: code.to_string(),
            class_name: code.to_string(),
            item_type: ItemType::Homework,
            status: ItemStatus::default(),
            due_date: "2026-10-01".to_string(),
            time: None,
            grade: None,
            is_late: None,
            days_late: None,
            grade_category: None,
            semester_id: String::new(),
        }
    }

    fn seeded_state() -> (Vec<AcademicItem>, Vec<Semester>, String) {
        let out = merge_import(
            &[],
            &[],
            "",
            vec![item("HW 1", "MATH101")],
            vec![class("MATH101")],
            ImportMode::Replace,
            today(),
        )
        .expect("seed replace");
        (out.items, out.semesters, out.current_semester_id)
    }

    #[test]
    fn replace_installs_fresh_semester_with_defaults() {
        let (items, semesters, current) = seeded_state();
        assert_eq!(semesters.len(), 1);
        let sem = &semesters[0];
        assert_eq!(sem.id, current);
        assert_eq!(sem.name, "Fall 2026");
        assert_eq!(sem.start_date, "2026-09-10");
        assert_eq!(sem.end_date, "2027-01-08");
        assert_eq!(sem.classes.len(), 1);
        let weights = sem.grade_weights.get("MATH101").expect("weights");
        assert_eq!(weights["exam"]["weight"], 0.40);
        assert_eq!(weights["final"]["weight"], 0.25);
        assert_eq!(weights["hw"]["weight"], 0.15);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].semester_id, current);
    }

    #[test]
    fn replace_discards_all_prior_state() {
        let (items, semesters, current) = seeded_state();
        let out = merge_import(
            &items,
            &semesters,
            &current,
            vec![item("Lab 1", "CS200")],
            vec![class("CS200")],
            ImportMode::Replace,
            today(),
        )
        .expect("replace");
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].class_code, "CS200");
        assert_eq!(out.semesters.len(), 1);
        assert_ne!(out.current_semester_id, current);
        assert!(out.semesters[0].classes.iter().all(|c| c.code == "CS200"));
    }

    #[test]
    fn add_appends_items_and_never_mutates_existing() {
        let (mut items, semesters, current) = seeded_state();
        items[0].grade = Some(88.0);
        items[0].grade_category = Some("hw".to_string());
        let before = items.clone();

        let out = merge_import(
            &items,
            &semesters,
            &current,
            vec![item("Lab 1", "CS200"), item("Lab 2", "CS200")],
            vec![class("CS200")],
            ImportMode::Add,
            today(),
        )
        .expect("add");

        assert_eq!(out.items.len(), before.len() + 2);
        // Pre-existing items survive byte-for-byte, grading metadata intact.
        assert_eq!(out.items[0].id, before[0].id);
        assert_eq!(out.items[0].grade, Some(88.0));
        assert_eq!(out.items[0].grade_category.as_deref(), Some("hw"));
        // New items are stamped with the target semester.
        assert!(out.items[1..].iter().all(|i| i.semester_id == current));
        assert_eq!(out.current_semester_id, current);
    }

    #[test]
    fn add_merges_classes_by_code_existing_wins() {
        let (items, semesters, current) = seeded_state();
        let mut renamed = class("MATH101");
        renamed.name = "Totally Different".to_string();

        let out = merge_import(
            &items,
            &semesters,
            &current,
            vec![item("HW 9", "MATH101")],
            vec![renamed, class("CS200")],
            ImportMode::Add,
            today(),
        )
        .expect("add");

        let sem = &out.semesters[0];
        let codes: Vec<&str> = sem.classes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["MATH101", "CS200"]);
        assert_eq!(sem.classes[0].name, "MATH101");
        // Default weights appear for the new code only once.
        assert!(sem.grade_weights.contains_key("CS200"));
    }

    #[test]
    fn add_never_duplicates_class_codes() {
        let (items, semesters, current) = seeded_state();
        let out = merge_import(
            &items,
            &semesters,
            &current,
            vec![],
            vec![class("CS200"), class("CS200"), class("MATH101")],
            ImportMode::Add,
            today(),
        )
        .expect("add");
        let sem = &out.semesters[0];
        let mut codes: Vec<String> = sem
            .classes
            .iter()
            .map(|c| normalize_class_code(&c.code))
            .collect();
        let total = codes.len();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn add_with_no_semesters_is_a_hard_error() {
        let err = merge_import(
            &[],
            &[],
            "",
            vec![item("HW 1", "MATH101")],
            vec![class("MATH101")],
            ImportMode::Add,
            today(),
        )
        .unwrap_err();
        assert_eq!(err, MergeError::NoTargetSemester);
        assert_eq!(err.code(), "merge_no_semester");
    }

    #[test]
    fn add_falls_back_to_first_semester_when_id_is_stale() {
        let (items, semesters, _) = seeded_state();
        let out = merge_import(
            &items,
            &semesters,
            "gone",
            vec![item("Lab 1", "CS200")],
            vec![],
            ImportMode::Add,
            today(),
        )
        .expect("add");
        assert_eq!(out.current_semester_id, semesters[0].id);
    }

    #[test]
    fn spring_and_summer_names() {
        let spring = NaiveDate::from_ymd_opt(2026, 2, 1).expect("date");
        let summer = NaiveDate::from_ymd_opt(2026, 7, 1).expect("date");
        assert_eq!(season_name(spring), "Spring 2026");
        assert_eq!(season_name(summer), "Summer 2026");
    }
}
