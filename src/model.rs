use serde::{Deserialize, Serialize};

/// Closed set of trackable work kinds. Declaration order doubles as the
/// urgency rank used to sort Smart Paste candidates (exam first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Exam,
    Quiz,
    Project,
    Assignment,
    Homework,
    Lecture,
}

impl ItemType {
    /// 1 = most urgent (exam) .. 6 = least (lecture).
    pub fn rank(self) -> u8 {
        match self {
            ItemType::Exam => 1,
            ItemType::Quiz => 2,
            ItemType::Project => 3,
            ItemType::Assignment => 4,
            ItemType::Homework => 5,
            ItemType::Lecture => 6,
        }
    }

    /// Capitalized display name; the free-text parser uses this as a title
    /// of last resort.
    pub fn display_name(self) -> &'static str {
        match self {
            ItemType::Exam => "Exam",
            ItemType::Quiz => "Quiz",
            ItemType::Project => "Project",
            ItemType::Assignment => "Assignment",
            ItemType::Homework => "Homework",
            ItemType::Lecture => "Lecture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "not-started")]
    NotStarted,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::NotStarted
    }
}

/// One assignment/quiz/exam/project/lecture record. `due_date` is always a
/// valid ISO date; the import pipeline never emits anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicItem {
    pub id: String,
    pub title: String,
    pub class_code: String,
    pub class_name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub status: ItemStatus,
    pub due_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_late: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_late: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_category: Option<String>,
    /// Empty on freshly parsed candidates; the merger stamps it.
    #[serde(default)]
    pub semester_id: String,
}

impl AcademicItem {
    /// Items stamped with a semester id belong to that semester; legacy
    /// items (no id) are matched by class membership instead.
    pub fn belongs_to(&self, semester: &Semester) -> bool {
        if !self.semester_id.is_empty() {
            return self.semester_id == semester.id;
        }
        semester.classes.iter().any(|c| c.code == self.class_code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub code: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub has_late_penalty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_switch: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub classes: Vec<ClassInfo>,
    /// code -> category -> {weight, label}; stored as JSON objects.
    #[serde(default)]
    pub grade_weights: serde_json::Map<String, serde_json::Value>,
}

/// Fixed cosmetic palette; classes get one round-robin at creation.
pub const CLASS_PALETTE: [&str; 8] = [
    "blue", "green", "purple", "orange", "pink", "teal", "red", "yellow",
];

pub fn palette_color(index: usize) -> String {
    CLASS_PALETTE[index % CLASS_PALETTE.len()].to_string()
}

/// Default weighting attached to every import-created class.
pub fn default_grade_weights() -> serde_json::Value {
    serde_json::json!({
        "exam": { "weight": 0.40, "label": "Exams" },
        "final": { "weight": 0.25, "label": "Final Exam" },
        "hw": { "weight": 0.15, "label": "Homework" },
        "quiz": { "weight": 0.10, "label": "Quizzes" },
        "project": { "weight": 0.10, "label": "Projects" },
    })
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Course codes are compared uppercase with internal whitespace removed.
pub fn normalize_class_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}
