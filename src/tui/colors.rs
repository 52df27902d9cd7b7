//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Category, Priority};

pub const SLATE: Color = Color::Rgb(51, 65, 85);
pub const FOCUS_BLUE: Color = Color::Rgb(59, 130, 246);
pub const WARN_ORANGE: Color = Color::Rgb(234, 88, 12);
pub const CALM_GREEN: Color = Color::Rgb(22, 163, 74);

/// Accent for a category tag on a card.
pub fn category_color(category: Option<Category>) -> Color {
    match category {
        Some(Category::Work) => FOCUS_BLUE,
        Some(Category::Study) => Color::Rgb(147, 51, 234),
        Some(Category::Career) => Color::Rgb(79, 70, 229),
        Some(Category::Personal) => Color::Rgb(219, 39, 119),
        Some(Category::Health) => CALM_GREEN,
        None => Color::Gray,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Rgb(220, 38, 38),
        Priority::Medium => Color::Rgb(202, 138, 4),
        Priority::Low => Color::Gray,
    }
}
