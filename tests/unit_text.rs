// Unit tests for text preprocessing: normalization determinism and the
// compound splitter's public contract.

use berufmatch::text::compound::{CompoundDictionary, CompoundSplitter, SplitOutcome};
use berufmatch::text::normalize::NormalizedKey;

// ============================================================
// NormalizedKey — determinism and the empty sentinel
// ============================================================

#[test]
fn normalization_is_symmetric_for_case_and_whitespace() {
    let variants = ["Kfz-Mechaniker", "kfz-mechaniker ", "  KFZ-MECHANIKER", "Kfz-Mechaniker\t"];
    let keys: Vec<NormalizedKey> = variants
        .iter()
        .map(|v| NormalizedKey::from_raw(Some(v)))
        .collect();
    for key in &keys {
        assert_eq!(
            key, &keys[0],
            "all raw variants must reduce to the same key"
        );
    }
}

#[test]
fn missing_marker_matches_python_str_nan() {
    // Upstream exports stringify missing cells as "nan"
    assert!(NormalizedKey::from_raw(Some("nan")).is_empty());
    assert!(NormalizedKey::from_raw(Some("NaN")).is_empty());
    assert!(!NormalizedKey::from_raw(Some("nanny")).is_empty());
}

#[test]
fn key_text_is_lowercase_and_trimmed() {
    let key = NormalizedKey::from_raw(Some("  Bäckereifachverkäuferin "));
    assert_eq!(key.as_str(), Some("bäckereifachverkäuferin"));
}

// ============================================================
// CompoundSplitter — decomposition policy
// ============================================================

fn dictionary() -> CompoundDictionary {
    CompoundDictionary::from_words([
        "Bäcker",
        "Meister",
        "Kranken",
        "Haus",
        "Verwaltung",
        "Angestellte",
        "Mechaniker",
        "elektro", // lowercase: not a noun
    ])
}

#[test]
fn dictionary_file_loading_skips_comments_and_blanks() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "# occupation nouns\nBäcker\n\nMeister\n").unwrap();
    let dict = CompoundDictionary::load(file.path()).unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.lookup("bäcker"), Some(true));
    assert_eq!(dict.lookup("#"), None);
}

#[test]
fn long_compound_decomposes_into_all_segments() {
    let splitter = CompoundSplitter::new(dictionary(), false, true);
    assert_eq!(
        splitter.split_word("krankenhausverwaltungsangestellte"),
        SplitOutcome::Split("kranken haus verwaltung angestellte".to_string())
    );
}

#[test]
fn fallback_preserves_the_input_verbatim() {
    let splitter = CompoundSplitter::new(dictionary(), false, true);
    for word in ["astronaut", "zzzzzzzzz", "qualitätsprüfung"] {
        let outcome = splitter.split_word(word);
        assert!(outcome.is_fallback(), "{word} should not decompose");
        assert_eq!(outcome.text(), word);
        assert!(!outcome.text().is_empty());
    }
}

#[test]
fn noun_restriction_changes_the_output() {
    let dict = || {
        CompoundDictionary::from_words(["elektro", "Meister"])
    };
    let plain = CompoundSplitter::new(dict(), false, true);
    let nouns = CompoundSplitter::new(dict(), true, true);

    assert_eq!(
        plain.split_word("elektromeister"),
        SplitOutcome::Split("elektro meister".to_string())
    );
    assert_eq!(
        nouns.split_word("elektromeister"),
        SplitOutcome::Split("meister".to_string())
    );
}

#[test]
fn splitter_output_is_stable_across_calls() {
    let splitter = CompoundSplitter::new(dictionary(), false, true);
    let first = splitter.split("bäckermeister krankenhaus");
    let second = splitter.split("bäckermeister krankenhaus");
    assert_eq!(first, second);
    assert_eq!(first, "bäcker meister kranken haus");
}
