use crate::model::ItemType;

/// Keyword table in priority order; the first group with any hit wins.
/// Matching is case-insensitive substring containment.
const KEYWORD_GROUPS: [(ItemType, &[&str]); 6] = [
    (
        ItemType::Exam,
        &["final exam", "final", "midterm", "exam", "test"],
    ),
    (ItemType::Quiz, &["quiz"]),
    (ItemType::Project, &["project", "presentation"]),
    (
        ItemType::Assignment,
        &["assignment", "essay", "paper", "lab", "worksheet"],
    ),
    (ItemType::Homework, &["homework", "hw"]),
    (ItemType::Lecture, &["lecture"]),
];

/// Map free text to an item type. No keyword hit defaults to assignment.
pub fn classify(text: &str) -> ItemType {
    classify_with_provenance(text).0
}

/// Like [`classify`], reporting whether any keyword matched at all so
/// candidate provenance can distinguish a hit from the default.
pub fn classify_with_provenance(text: &str) -> (ItemType, bool) {
    let lower = text.to_ascii_lowercase();
    for (kind, keywords) in KEYWORD_GROUPS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return (kind, true);
        }
    }
    (ItemType::Assignment, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_keywords_outrank_everything() {
        assert_eq!(classify("Final Exam review quiz"), ItemType::Exam);
        assert_eq!(classify("midterm project check-in"), ItemType::Exam);
        assert_eq!(classify("Unit test"), ItemType::Exam);
    }

    #[test]
    fn priority_order_within_lower_groups() {
        assert_eq!(classify("Quiz 3"), ItemType::Quiz);
        assert_eq!(classify("group project homework"), ItemType::Project);
        assert_eq!(classify("Essay draft"), ItemType::Assignment);
        assert_eq!(classify("HW 7"), ItemType::Homework);
        assert_eq!(classify("Lecture 12 notes"), ItemType::Lecture);
    }

    #[test]
    fn no_match_defaults_to_assignment() {
        let (kind, matched) = classify_with_provenance("Chapter 4 reading");
        assert_eq!(kind, ItemType::Assignment);
        assert!(!matched);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("QUIZ tomorrow"), ItemType::Quiz);
        assert_eq!(classify("pRoJeCt milestone"), ItemType::Project);
    }
}
