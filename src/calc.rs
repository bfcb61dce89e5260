use serde::Serialize;

use crate::model::{AcademicItem, Semester};

/// 1-decimal display rounding used everywhere a percent is reported.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAverage {
    pub category: String,
    pub label: String,
    pub weight: f64,
    pub average: f64,
    pub graded_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGradeSummary {
    pub class_code: String,
    pub per_category: Vec<CategoryAverage>,
    /// Weighted overall percent, or None when nothing is graded yet.
    pub overall: Option<f64>,
    pub graded_count: usize,
    pub ungraded_count: usize,
}

fn weight_entry(semester: &Semester, code: &str, category: &str) -> Option<(f64, String)> {
    let per_class = semester.grade_weights.get(code)?.as_object()?;
    let entry = per_class.get(category)?.as_object()?;
    let weight = entry.get("weight")?.as_f64()?;
    let label = entry
        .get("label")
        .and_then(|v| v.as_str())
        .unwrap_or(category)
        .to_string();
    Some((weight, label))
}

/// Weighted grade summary for one class: per-category mean of graded items,
/// then the weight-blended overall. Categories with no graded items are
/// excluded and the remaining weights renormalized, so an early-semester
/// summary is still meaningful.
pub fn class_grade_summary(
    items: &[AcademicItem],
    semester: &Semester,
    class_code: &str,
) -> ClassGradeSummary {
    let class_items: Vec<&AcademicItem> = items
        .iter()
        .filter(|i| i.class_code == class_code && i.belongs_to(semester))
        .collect();

    let mut graded_count = 0;
    let mut ungraded_count = 0;
    // category -> (sum, count), insertion-ordered by first appearance.
    let mut buckets: Vec<(String, f64, usize)> = Vec::new();
    for item in &class_items {
        let Some(grade) = item.grade else {
            ungraded_count += 1;
            continue;
        };
        graded_count += 1;
        let Some(category) = item.grade_category.as_deref() else {
            continue;
        };
        match buckets.iter_mut().find(|(c, _, _)| c == category) {
            Some((_, sum, count)) => {
                *sum += grade;
                *count += 1;
            }
            None => buckets.push((category.to_string(), grade, 1)),
        }
    }

    let mut per_category: Vec<CategoryAverage> = Vec::new();
    for (category, sum, count) in buckets {
        let Some((weight, label)) = weight_entry(semester, class_code, &category) else {
            continue;
        };
        per_category.push(CategoryAverage {
            average: round_off_1_decimal(sum / count as f64),
            category,
            label,
            weight,
            graded_count: count,
        });
    }

    let weight_total: f64 = per_category.iter().map(|c| c.weight).sum();
    let overall = if weight_total > 0.0 {
        let blended: f64 = per_category
            .iter()
            .map(|c| c.weight * c.average)
            .sum::<f64>()
            / weight_total;
        Some(round_off_1_decimal(blended))
    } else {
        None
    };

    ClassGradeSummary {
        class_code: class_code.to_string(),
        per_category,
        overall,
        graded_count,
        ungraded_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_grade_weights, ClassInfo, ItemStatus, ItemType};

    fn semester() -> Semester {
        let mut grade_weights = serde_json::Map::new();
        grade_weights.insert("MATH101".to_string(), default_grade_weights());
        Semester {
            id: "s1".to_string(),
            name: "Fall 2026".to_string(),
            start_date: "2026-09-01".to_string(),
            end_date: "2026-12-30".to_string(),
            classes: vec![ClassInfo {
                code: "MATH101".to_string(),
                name: "Calculus I".to_string(),
                color: "blue".to_string(),
                has_late_penalty: false,
                kill_switch: None,
            }],
            grade_weights,
        }
    }

    fn graded(category: &str, grade: f64) -> AcademicItem {
        AcademicItem {
            id: crate::model::new_id(),
            title: format!("{} item", category),
            class_code: "MATH101".to_string(),
            class_name: "Calculus I".to_string(),
            item_type: ItemType::Homework,
            status: ItemStatus::Completed,
            due_date: "2026-10-01".to_string(),
            time: None,
            grade: Some(grade),
            is_late: None,
            days_late: None,
            grade_category: Some(category.to_string()),
            semester_id: "s1".to_string(),
        }
    }

    #[test]
    fn rounding_matches_display_convention() {
        assert_eq!(round_off_1_decimal(89.96), 90.0);
        assert_eq!(round_off_1_decimal(72.25), 72.3);
        assert_eq!(round_off_1_decimal(0.0), 0.0);
    }

    #[test]
    fn blends_categories_by_weight() {
        // hw 0.15 @ 90, exam 0.40 @ 80: (0.15*90 + 0.40*80) / 0.55 = 82.727..
        let items = vec![graded("hw", 90.0), graded("exam", 80.0)];
        let summary = class_grade_summary(&items, &semester(), "MATH101");
        assert_eq!(summary.per_category.len(), 2);
        assert_eq!(summary.overall, Some(82.7));
        assert_eq!(summary.graded_count, 2);
    }

    #[test]
    fn category_average_is_mean_of_grades() {
        let items = vec![graded("hw", 100.0), graded("hw", 80.0)];
        let summary = class_grade_summary(&items, &semester(), "MATH101");
        let hw = summary
            .per_category
            .iter()
            .find(|c| c.category == "hw")
            .expect("hw bucket");
        assert_eq!(hw.average, 90.0);
        assert_eq!(hw.graded_count, 2);
        assert_eq!(summary.overall, Some(90.0));
    }

    #[test]
    fn ungraded_items_are_counted_but_excluded() {
        let mut pending = graded("hw", 0.0);
        pending.grade = None;
        pending.grade_category = None;
        let items = vec![graded("hw", 85.0), pending];
        let summary = class_grade_summary(&items, &semester(), "MATH101");
        assert_eq!(summary.graded_count, 1);
        assert_eq!(summary.ungraded_count, 1);
        assert_eq!(summary.overall, Some(85.0));
    }

    #[test]
    fn nothing_graded_yields_no_overall() {
        let mut pending = graded("hw", 0.0);
        pending.grade = None;
        let summary = class_grade_summary(&[pending], &semester(), "MATH101");
        assert_eq!(summary.overall, None);
        assert!(summary.per_category.is_empty());
    }

    #[test]
    fn legacy_items_count_via_class_membership() {
        // No semester id on the item; its class being in the semester's
        // class list is enough.
        let mut legacy = graded("hw", 95.0);
        legacy.semester_id = String::new();
        let mut foreign = graded("hw", 10.0);
        foreign.semester_id = "other".to_string();
        let summary = class_grade_summary(&[legacy, foreign], &semester(), "MATH101");
        assert_eq!(summary.graded_count, 1);
        assert_eq!(summary.overall, Some(95.0));
    }

    #[test]
    fn unknown_category_is_ignored_in_blend() {
        let items = vec![graded("participation", 100.0), graded("hw", 80.0)];
        let summary = class_grade_summary(&items, &semester(), "MATH101");
        assert_eq!(summary.per_category.len(), 1);
        assert_eq!(summary.overall, Some(80.0));
    }
}
