use unicode_width::UnicodeWidthStr;

/// Fit `s` into `width` columns, replacing the cut-off tail with `...`.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::from("");
    }
    if s.width() <= width {
        return s.to_string();
    }
    if width <= 3 {
        return ".".repeat(width);
    }

    let mut out = String::new();
    for c in s.chars() {
        if out.width() + c.to_string().width() > width - 3 {
            break;
        }
        out.push(c);
    }
    format!("{}...", out)
}

/// Height readout as the card displays it: one decimal plus the unit.
pub fn format_height(height: f64, unit: &str) -> String {
    format!("{height:.1} {unit}")
}
