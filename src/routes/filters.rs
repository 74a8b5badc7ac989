// Askama filters shared by the page templates
use chrono::{NaiveDateTime, Utc};
use std::fmt::Display;

/// `{{ created_at|ago }}` renders a stored timestamp as relative time.
pub fn ago<T: Display>(db_time: T) -> askama::Result<String> {
    Ok(parse_and_format_time(&db_time.to_string()))
}

/// `{{ restaurant.image|image_or_placeholder }}`
pub fn image_or_placeholder(image: &Option<String>) -> askama::Result<String> {
    Ok(image
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("/assets/img/placeholder.svg")
        .to_string())
}

fn parse_and_format_time(db_time: &str) -> String {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|_| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}
