//! Reading location queries from a file or standard input.

use std::{
    collections::HashSet,
    fs,
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Where the queries come from. `-` on the command line means stdin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuerySource {
    Stdin,
    File(PathBuf),
}

impl From<PathBuf> for QuerySource {
    fn from(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            QuerySource::Stdin
        } else {
            QuerySource::File(path)
        }
    }
}

impl QuerySource {
    pub fn is_stdin(&self) -> bool {
        matches!(self, QuerySource::Stdin)
    }

    /// Read all queries, blank lines and duplicates removed.
    ///
    /// If the extension is "csv", the file is interpreted as CSV with a
    /// header row and the query in the first column. Anything else is one
    /// query per line.
    pub fn read(&self) -> Result<Vec<String>> {
        let queries = match self {
            QuerySource::Stdin => read_lines(io::stdin().lock())?,
            QuerySource::File(path) => match path.extension().and_then(|e| e.to_str()) {
                Some("csv") => read_csv(path)?,
                _ => {
                    let file = fs::File::open(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    read_lines(io::BufReader::new(file))?
                }
            },
        };
        Ok(dedup(queries))
    }
}

/// One query per line, trailing whitespace stripped.
fn read_lines(reader: impl BufRead) -> Result<Vec<String>> {
    let mut queries = vec![];
    for line in reader.lines() {
        let line = line.context("Failed to read queries")?;
        queries.push(line.trim_end().to_string());
    }
    Ok(queries)
}

fn read_csv(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;

    let mut queries = vec![];
    for result in rdr.records() {
        match result {
            Ok(record) => {
                if let Some(query) = record.get(0) {
                    queries.push(query.trim_end().to_string());
                }
            }
            Err(e) => {
                warn!("Failed to parse CSV record with error {e}. Continuing.");
            }
        }
    }
    Ok(queries)
}

/// Drop blank and repeated queries, keeping first occurrences in order.
fn dedup(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|query| {
            if query.trim().is_empty() {
                return false;
            }
            let first = seen.insert(query.clone());
            if !first {
                debug!("Skipping repeated query {query:?}");
            }
            first
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn dash_means_stdin() {
        assert!(QuerySource::from(PathBuf::from("-")).is_stdin());
        assert_eq!(
            QuerySource::from(PathBuf::from("places.txt")),
            QuerySource::File(PathBuf::from("places.txt"))
        );
    }

    #[test]
    fn lines_are_trimmed_deduplicated_and_blanks_skipped() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
        write!(file, "Delft  \n\nParis, France\n   \nDelft\nTokyo\t\n")?;

        let queries = QuerySource::File(file.path().to_path_buf()).read()?;

        assert_eq!(queries, vec!["Delft", "Paris, France", "Tokyo"]);
        Ok(())
    }

    #[test]
    fn leading_whitespace_is_kept() -> Result<()> {
        let queries = dedup(read_lines(io::Cursor::new("  Delft\nDelft\n"))?);
        assert_eq!(queries, vec!["  Delft", "Delft"]);
        Ok(())
    }

    #[test]
    fn csv_input_uses_the_first_column() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        write!(
            file,
            "Query,Note\n\"Delft, Netherlands\",home\nOslo,\n\"Delft, Netherlands\",again\n"
        )?;

        let queries = QuerySource::File(file.path().to_path_buf()).read()?;

        assert_eq!(queries, vec!["Delft, Netherlands", "Oslo"]);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = QuerySource::File(PathBuf::from("/nonexistent/queries.txt"));
        let error = source.read().unwrap_err();
        assert!(error.to_string().contains("Failed to open"));
    }
}
