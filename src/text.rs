/// Strip control characters from text that came off the wire before it is
/// handed to the terminal. Newlines and tabs survive so multi-line chat
/// replies keep their shape.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_text_unchanged() {
        assert_eq!(sanitize("Breaking: markets rally"), "Breaking: markets rally");
    }

    #[test]
    fn test_sanitize_strips_escape_sequences() {
        assert_eq!(sanitize("evil\x1b[2Jtitle"), "evil[2Jtitle");
        assert_eq!(sanitize("a\x07b\x00c"), "abc");
    }

    #[test]
    fn test_sanitize_keeps_newlines_and_tabs() {
        assert_eq!(sanitize("line one\nline two\tend"), "line one\nline two\tend");
    }
}
