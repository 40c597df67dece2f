use std::fmt::Write;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use unicode_width::UnicodeWidthChar;

/// Truncate to `max_width` display columns, ending in "..." when cut
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if max_width < 4 {
        return s.chars().take(max_width).collect();
    }

    let total: usize = s.chars().map(|c| c.width().unwrap_or(1)).sum();
    if total <= max_width {
        return s.to_string();
    }

    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);
        if width + char_width > max_width - 3 {
            break;
        }
        width += char_width;
        result.push(c);
    }
    result.push_str("...");
    result
}

/// Time of a conversation's last message, relative to `today`
pub fn format_list_time(time: NaiveDateTime, today: NaiveDate) -> String {
    let date = time.date();
    if date == today {
        time.format("%H:%M").to_string()
    } else if (today - date).num_days() < 7 && date < today {
        time.format("%a").to_string()
    } else if date.year() == today.year() {
        time.format("%b %d").to_string()
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}

/// Format a message time with a user-supplied format, falling back to `%H:%M`
/// when the format is invalid
pub fn format_time(time: NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.format(format)).is_err() {
        out = time.format("%H:%M").to_string();
    }
    out
}

/// Label of a date separator
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else if day.year() == today.year() {
        day.format("%A, %B %-d").to_string()
    } else {
        day.format("%B %-d, %Y").to_string()
    }
}

/// Sanitize text for display: remove control characters and ANSI escape sequences
pub fn sanitize_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // Sequence ends at the first letter
            for ch in chars.by_ref() {
                if ch.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        // Newlines survive for wrapping
        if c.is_control() && c != '\n' {
            result.push(' ');
        } else {
            result.push(c);
        }
    }

    result
}
