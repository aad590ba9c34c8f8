//! 分数汇总

use crate::models::{Grade, GradedItem, GradingResult};

/// 对最终条目求和并映射等级
pub fn aggregate(items: Vec<GradedItem>) -> GradingResult {
    let total_awarded: f64 = items.iter().map(|item| item.awarded).sum();
    let total_possible: f64 = items.iter().map(|item| item.possible).sum();

    let mut result = GradingResult {
        items,
        total_awarded,
        total_possible,
        grade: Grade::F,
    };
    result.grade = Grade::from_percentage(result.percentage());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_come_from_items() {
        let items = vec![
            GradedItem::new("1(a)", 2.0, 2.0, "Correct."),
            GradedItem::new("1(b)", 1.0, 3.0, "Partial."),
        ];
        let result = aggregate(items);

        assert_eq!(result.total_awarded, 3.0);
        assert_eq!(result.total_possible, 5.0);
        assert_eq!(result.percentage(), 60.0);
        // 60% 正好落在 D 的下界
        assert_eq!(result.grade, Grade::D);
    }

    #[test]
    fn test_grade_boundaries() {
        let just_below = aggregate(vec![GradedItem::new("1", 89.99, 100.0, "")]);
        assert_eq!(just_below.grade, Grade::B);

        let exact = aggregate(vec![GradedItem::new("1", 90.0, 100.0, "")]);
        assert_eq!(exact.grade, Grade::A);
    }

    #[test]
    fn test_zero_possible_is_f() {
        let result = aggregate(vec![GradedItem::new("Overall", 0.0, 0.0, "")]);
        assert_eq!(result.percentage(), 0.0);
        assert_eq!(result.grade, Grade::F);

        let empty = aggregate(Vec::new());
        assert_eq!(empty.total_possible, 0.0);
        assert_eq!(empty.grade, Grade::F);
    }
}
