//! Small shared helpers with no better home.

/// Glob-style pattern matching: `*` matches any run of characters, `?`
/// matches exactly one, `.` is literal.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let regex_pattern = pattern.replace('.', "\\.").replace('*', ".*").replace('?', ".");

    regex::Regex::new(&format!("^{regex_pattern}$"))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_suffix() {
        assert!(glob_match("*.txt", "file.txt"));
        assert!(!glob_match("*.txt", "file.doc"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(glob_match("file?.txt", "file1.txt"));
        assert!(!glob_match("file?.txt", "file12.txt"));
    }
}
