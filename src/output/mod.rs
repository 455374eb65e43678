// Output formatting — terminal display of run results.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..40]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters like umlauts.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(truncate_chars("Bäcker", 10), "Bäcker");
    }

    #[test]
    fn long_strings_are_cut_at_char_boundaries() {
        assert_eq!(truncate_chars("Bäckereifachverkäuferin", 7), "Bäckere...");
    }
}
