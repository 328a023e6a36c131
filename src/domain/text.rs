use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut `s` to at most `width` columns, marking the cut with an ellipsis
pub fn truncate_to_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::from("");
    }
    if s.width() <= width {
        return s.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Truncate or right-pad `s` to exactly `width` columns
pub fn fit_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let padding = width.saturating_sub(truncated.width());
    format!("{truncated}{}", " ".repeat(padding))
}
