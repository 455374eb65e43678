// A plain string table over CSV files.
//
// The pipeline treats the input as opaque rows with named columns: it
// reads occupation text out of a few of them and appends match columns,
// while every other column passes through byte-for-byte. A typed record
// struct would fight that passthrough requirement, so rows stay
// Vec<String>.

use std::path::Path;

use anyhow::{Context, Result};

pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a CSV file. Short rows are padded with empty cells so every
    /// row has one cell per header; longer rows are an error.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV {}", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header of {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Bad CSV record in {}", path.display()))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() > headers.len() {
                anyhow::bail!(
                    "Row {} of {} has {} cells but the header has {} columns",
                    line + 2,
                    path.display(),
                    row.len(),
                    headers.len()
                );
            }
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Write the table as CSV.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV {}", path.display()))?;
        writer
            .write_record(&self.headers)
            .context("Failed to write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV")?;
        Ok(())
    }

    /// Index of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append a column. The value list must match the row count.
    pub fn add_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            anyhow::bail!(
                "Column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// A cell by row index and column name.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn reads_headers_and_rows() {
        let file = write_csv("id,occupation\n1,Bäcker\n2,Elektriker\n");
        let table = Table::read(file.path()).unwrap();
        assert_eq!(table.headers, vec!["id", "occupation"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), Some("Bäcker"));
    }

    #[test]
    fn short_rows_are_padded() {
        let file = write_csv("a,b,c\n1,2\n");
        let table = Table::read(file.path()).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn round_trip_preserves_passthrough_columns() {
        let file = write_csv("id,note,occupation\n7,\"hello, world\",Bäcker\n");
        let table = Table::read(file.path()).unwrap();

        let out = tempfile::NamedTempFile::new().unwrap();
        table.write(out.path()).unwrap();
        let again = Table::read(out.path()).unwrap();

        assert_eq!(again.headers, table.headers);
        assert_eq!(again.rows, table.rows);
        assert_eq!(again.cell(0, 1), Some("hello, world"));
    }

    #[test]
    fn add_column_requires_matching_length() {
        let file = write_csv("a\n1\n2\n");
        let mut table = Table::read(file.path()).unwrap();
        assert!(table.add_column("b", vec!["x".to_string()]).is_err());
        assert!(table
            .add_column("b", vec!["x".to_string(), "y".to_string()])
            .is_ok());
        assert_eq!(table.cell(1, 1), Some("y"));
    }
}
