// CSV cleanup and encoding diagnostics.
//
// The upstream exports pass through latin1 at least once, which leaves
// two recurring problems: stray whitespace in headers and cells, and
// UTF-8 text mis-decoded as Latin-1 ("BÃ¤cker" instead of "Bäcker").
// `clean_table` fixes the first; `diagnose` reports on the second so the
// operator can fix the export instead of matching against garbage.

use crate::data::table::Table;

/// German characters whose absence from a German occupation dataset is
/// suspicious in itself.
const UMLAUTS: [char; 7] = ['ä', 'ö', 'ü', 'Ä', 'Ö', 'Ü', 'ß'];

/// Byte-pair prefixes that UTF-8 umlauts turn into when mis-decoded as
/// Latin-1: "Ã¤" (ä), "Ã¶" (ö), "Ã¼" (ü), "ÃŸ" (ß) all start with 'Ã'.
const MOJIBAKE_MARKER: char = 'Ã';

/// Trim whitespace from every header and every cell, in place.
pub fn clean_table(table: &mut Table) {
    for header in &mut table.headers {
        let trimmed = header.trim().to_string();
        *header = trimmed;
    }
    for row in &mut table.rows {
        for cell in row {
            let trimmed = cell.trim().to_string();
            *cell = trimmed;
        }
    }
}

/// What an encoding scan of a table found.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EncodingReport {
    pub total_cells: usize,
    /// Cells containing at least one German umlaut or ß
    pub umlaut_cells: usize,
    /// Cells showing the UTF-8-as-Latin-1 mojibake pattern
    pub mojibake_cells: usize,
}

impl EncodingReport {
    /// No umlauts anywhere is a red flag for German occupation data —
    /// it usually means they were destroyed upstream.
    pub fn umlauts_missing(&self) -> bool {
        self.total_cells > 0 && self.umlaut_cells == 0
    }

    pub fn has_mojibake(&self) -> bool {
        self.mojibake_cells > 0
    }
}

/// Scan every cell for umlaut presence and mojibake patterns.
pub fn diagnose(table: &Table) -> EncodingReport {
    let mut report = EncodingReport::default();
    for row in &table.rows {
        for cell in row {
            report.total_cells += 1;
            if cell.chars().any(|c| UMLAUTS.contains(&c)) {
                report.umlaut_cells += 1;
            }
            if contains_mojibake(cell) {
                report.mojibake_cells += 1;
            }
        }
    }
    report
}

/// Detect the 'Ã' + continuation pattern of UTF-8 read as Latin-1.
/// A bare 'Ã' at the end of a word is legitimate in some languages, so
/// require a following character to call it mojibake.
pub fn contains_mojibake(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == MOJIBAKE_MARKER && chars.peek().is_some() {
            return true;
        }
    }
    false
}
