use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) are kept, dangerous tags (like
/// <script>, <iframe>) and event-handler attributes are stripped. Applied to
/// author-supplied lesson bodies and announcements before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<p>Intro <b>bold</b></p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Intro <b>bold</b></p>");
    }

    #[test]
    fn strips_event_handlers() {
        let cleaned = clean_html(r#"<a href="https://example.com" onclick="steal()">link</a>"#);
        assert!(!cleaned.contains("onclick"));
        assert!(cleaned.contains("link"));
    }
}
