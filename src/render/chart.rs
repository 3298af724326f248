use crate::models::admin::{ CategoryCount, DateCount };

pub const BAR_WIDTH: usize = 30;

/// Horizontal bar chart; bars are scaled against the largest value.
pub fn bar_chart(rows: &[(String, u64)], width: usize) -> String {
    if rows.is_empty() {
        return "(no data)".to_string();
    }
    let max = rows
        .iter()
        .map(|(_, v)| *v)
        .max()
        .unwrap_or(0);
    let label_width = rows
        .iter()
        .map(|(l, _)| l.chars().count())
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|(label, value)| {
            let len = if max == 0 { 0 } else { ((*value as f64 / max as f64) * width as f64).round() as usize };
            let len = if *value > 0 { len.max(1) } else { 0 };
            format!("{:<label_width$} | {} {}", label, "#".repeat(len), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// FAQ distribution by category; missing category names show as "Uncategorized".
pub fn category_chart(categories: &[CategoryCount]) -> String {
    let rows: Vec<(String, u64)> = categories
        .iter()
        .map(|c| (c.category.clone().unwrap_or_else(|| "Uncategorized".to_string()), c.count))
        .collect();
    bar_chart(&rows, BAR_WIDTH)
}

pub fn trend_chart(points: &[DateCount]) -> String {
    let rows: Vec<(String, u64)> = points
        .iter()
        .map(|p| (p.date.clone(), p.count))
        .collect();
    bar_chart(&rows, BAR_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_to_largest_value() {
        let rows = vec![("Fees".to_string(), 10), ("Hostel".to_string(), 5), ("Sports".to_string(), 0)];
        assert_eq!(bar_chart(&rows, 10), "Fees   | ########## 10\nHostel | ##### 5\nSports |  0");
    }

    #[test]
    fn small_nonzero_values_stay_visible() {
        let rows = vec![("a".to_string(), 1000), ("b".to_string(), 1)];
        assert!(bar_chart(&rows, 10).ends_with("b | # 1"));
    }

    #[test]
    fn missing_category_is_labelled() {
        let chart = category_chart(&[CategoryCount { category: None, count: 2 }]);
        assert!(chart.starts_with("Uncategorized |"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(trend_chart(&[]), "(no data)");
    }
}
