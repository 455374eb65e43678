// Dictionary-driven decomposition of German compound words.
//
// "Krankenhausverwaltungsangestellte" embeds poorly as one opaque token;
// "kranken haus verwaltung angestellte" lands much closer to the catalog
// titles it should match. Decomposition is best-effort by design: any word
// the dictionary cannot account for comes back unchanged. A single
// undecomposable word must never abort a batch, so there is no error path
// out of `split_word` — only the visible `Fallback` branch.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Minimum length (in chars) of a dictionary segment considered during
/// decomposition. Shorter entries produce spurious splits.
const MIN_SEGMENT_CHARS: usize = 4;

/// Words longer than this are not worth the quadratic segmentation scan
/// and fall back unchanged.
const MAX_WORD_CHARS: usize = 64;

/// German linking elements (Fugenelemente) tolerated between segments:
/// "arbeitsvermittler" = arbeit + s + vermittler. Ordered longest-first.
const LINKING_ELEMENTS: [&str; 6] = ["es", "en", "er", "e", "n", "s"];

/// Word list backing the splitter. One word per line; entries written
/// capitalized are treated as nouns (standard German orthography), which
/// is what the noun-only restriction keys on. Lookup is lowercase.
pub struct CompoundDictionary {
    words: HashMap<String, bool>,
}

impl CompoundDictionary {
    /// Load a dictionary from a word-list file. Blank lines and lines
    /// starting with '#' are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read compound dictionary: {}", path.display()))?;
        let dict = Self::from_words(raw.lines());
        debug!(
            entries = dict.len(),
            path = %path.display(),
            "Loaded compound dictionary"
        );
        Ok(dict)
    }

    /// Build a dictionary from an iterator of words. Capitalized words
    /// are recorded as nouns.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for word in words {
            let word = word.as_ref().trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            let is_noun = word.chars().next().is_some_and(|c| c.is_uppercase());
            // A capitalized entry wins over a lowercase duplicate
            let entry = map.entry(word.to_lowercase()).or_insert(is_noun);
            *entry = *entry || is_noun;
        }
        Self { words: map }
    }

    /// Look up a lowercase segment. Returns whether it is a noun, or
    /// `None` when the segment is unknown.
    pub fn lookup(&self, segment: &str) -> Option<bool> {
        self.words.get(segment).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// The outcome of decomposing a single word — fallback is a first-class,
/// testable branch rather than a swallowed failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Space-joined lowercase constituent segments.
    Split(String),
    /// No usable decomposition; the original word, unmodified.
    Fallback(String),
}

impl SplitOutcome {
    /// The text to use downstream, whichever branch was taken.
    pub fn text(&self) -> &str {
        match self {
            SplitOutcome::Split(s) | SplitOutcome::Fallback(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SplitOutcome::Fallback(_))
    }
}

/// One segment of a candidate decomposition.
#[derive(Debug, Clone)]
enum Segment {
    /// Dictionary word; the flag marks nouns.
    Known(String, bool),
    /// Linking element between segments — never part of the output.
    Link,
    /// Characters no dictionary word accounts for.
    Unknown(String),
}

/// Decomposes compound words against a dictionary.
pub struct CompoundSplitter {
    dict: CompoundDictionary,
    /// Keep only noun segments in the output
    nouns_only: bool,
    /// Drop dictionary-unknown segments from the output
    mask_unknown: bool,
}

impl CompoundSplitter {
    pub fn new(dict: CompoundDictionary, nouns_only: bool, mask_unknown: bool) -> Self {
        Self {
            dict,
            nouns_only,
            mask_unknown,
        }
    }

    /// Decompose every word of an already-normalized (lowercase, trimmed)
    /// string. Words are delimited by whitespace; hyphenated tokens are
    /// treated as pre-split compounds ("kfz-mechaniker" -> "kfz mechaniker").
    pub fn split(&self, text: &str) -> String {
        let mut pieces: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            for part in token.split('-').filter(|p| !p.is_empty()) {
                pieces.push(self.split_word(part).text().to_string());
            }
        }
        if pieces.is_empty() {
            // Nothing survived tokenization (e.g. a bare "-"): never
            // return an empty key for non-empty input.
            text.to_string()
        } else {
            pieces.join(" ")
        }
    }

    /// Decompose a single lowercase word into space-joined segments, or
    /// return it unchanged when no usable decomposition exists.
    pub fn split_word(&self, word: &str) -> SplitOutcome {
        let char_count = word.chars().count();
        if char_count < 2 * MIN_SEGMENT_CHARS || char_count > MAX_WORD_CHARS {
            return SplitOutcome::Fallback(word.to_string());
        }

        let Some(segments) = self.best_segmentation(word) else {
            return SplitOutcome::Fallback(word.to_string());
        };

        // A decomposition must contain at least two real (non-link)
        // segments; anything less means the word did not actually split.
        let real = segments
            .iter()
            .filter(|s| !matches!(s, Segment::Link))
            .count();
        if real < 2 {
            return SplitOutcome::Fallback(word.to_string());
        }

        let mut kept: Vec<&str> = Vec::with_capacity(real);
        for segment in &segments {
            match segment {
                Segment::Known(text, is_noun) => {
                    if !self.nouns_only || *is_noun {
                        kept.push(text);
                    }
                }
                Segment::Unknown(text) => {
                    if !self.mask_unknown {
                        kept.push(text);
                    }
                }
                Segment::Link => {}
            }
        }

        if kept.is_empty() {
            // Masking removed every segment; an empty key would collide
            // with the missing-value sentinel downstream.
            debug!(word, "Masking dropped all segments, falling back");
            return SplitOutcome::Fallback(word.to_string());
        }

        SplitOutcome::Split(kept.join(" "))
    }

    /// Find the segmentation covering `word` with the fewest unknown
    /// characters (fewest segments as the tie-break). Dynamic program over
    /// char boundaries; words are short so the quadratic scan is cheap.
    fn best_segmentation(&self, word: &str) -> Option<Vec<Segment>> {
        let mut bounds: Vec<usize> = word.char_indices().map(|(i, _)| i).collect();
        bounds.push(word.len());
        let n = bounds.len();

        // best[i]: cheapest (unknown_chars, segment_count, segments) for
        // the suffix starting at char position i.
        let mut best: Vec<Option<(usize, usize, Vec<Segment>)>> = vec![None; n];
        best[n - 1] = Some((0, 0, Vec::new()));

        for i in (0..n - 1).rev() {
            for j in (i + 1)..n {
                let Some((tail_unknown, tail_count, tail_segments)) = best[j].as_ref() else {
                    continue;
                };
                let piece = &word[bounds[i]..bounds[j]];
                let piece_chars = j - i;

                let (segment, cost) = if piece_chars >= MIN_SEGMENT_CHARS
                    && self.dict.lookup(piece).is_some()
                {
                    let is_noun = self.dict.lookup(piece).unwrap_or(false);
                    (Segment::Known(piece.to_string(), is_noun), 0)
                } else if i > 0 && LINKING_ELEMENTS.contains(&piece) {
                    // Linking elements only occur between segments
                    (Segment::Link, 0)
                } else {
                    (Segment::Unknown(piece.to_string()), piece_chars)
                };

                let unknown = tail_unknown + cost;
                let count = tail_count + 1;
                let better = match best[i].as_ref() {
                    None => true,
                    Some((u, c, _)) => unknown < *u || (unknown == *u && count < *c),
                };
                if better {
                    let mut segments = Vec::with_capacity(count);
                    segments.push(segment);
                    segments.extend(tail_segments.iter().cloned());
                    best[i] = Some((unknown, count, segments));
                }
            }
        }

        best[0].take().map(|(_, _, segments)| segments)
    }
}
