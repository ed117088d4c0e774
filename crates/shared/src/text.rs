/// Maximum length of a cleaned feed summary, in characters.
pub const FEED_SUMMARY_CHARS: usize = 600;

/// Strip markup from a feed summary, collapse whitespace, and cap the length.
pub fn clean_feed_summary(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let text = html2text::from_read(raw.as_bytes(), 100);
    truncate_chars(&collapse_whitespace(&text), FEED_SUMMARY_CHARS)
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters, without an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// Truncate to at most `max` characters, appending `…` exactly when the
/// text was actually shortened.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push('…');
        truncated
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
