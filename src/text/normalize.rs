// Normalization of raw occupation text into a comparison key.
//
// Catalog titles and query occupations must pass through the exact same
// normalization — asymmetric normalization would make similarity scores
// between the two sides incomparable. Everything downstream (embedding
// cache, match cache, deduplication) keys on the output of this module.

/// The literal missing-value marker that upstream exports write into
/// empty cells. Treated the same as a genuinely empty field.
pub const MISSING_MARKER: &str = "nan";

/// The case-folded, whitespace-trimmed key a raw occupation string reduces
/// to. Two raw strings with the same key are guaranteed the same match
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedKey {
    /// Input was missing, empty, whitespace-only, or the literal
    /// missing-value marker. Short-circuits to an absent match downstream.
    Empty,
    /// Trimmed, lowercased text.
    Text(String),
}

impl NormalizedKey {
    /// Normalize a raw field. `None` models a missing cell.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return NormalizedKey::Empty;
        };
        let folded = raw.trim().to_lowercase();
        if folded.is_empty() || folded == MISSING_MARKER {
            NormalizedKey::Empty
        } else {
            NormalizedKey::Text(folded)
        }
    }

    /// The key text, or `None` for the empty sentinel.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NormalizedKey::Empty => None,
            NormalizedKey::Text(s) => Some(s),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedKey::Empty)
    }
}
