use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Describe the active filter for the screen header.
pub(crate) fn filter_summary(category_label: &str, category: Option<&str>, search: &str) -> String {
    let category = category.unwrap_or("all");
    if search.is_empty() {
        format!("{category_label}: {category}")
    } else {
        format!("{category_label}: {category}   Search: \"{search}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 15);
    }

    #[test]
    fn summary_mentions_search_only_when_set() {
        assert_eq!(filter_summary("Group", None, ""), "Group: all");
        assert_eq!(
            filter_summary("Level", Some("Senior"), "ann"),
            "Level: Senior   Search: \"ann\""
        );
    }
}
