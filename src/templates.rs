//! Query template loading.
//!
//! Templates live in a plain UTF-8 file, one query per line. Lines are
//! trimmed and blank lines are skipped; there is no comment syntax and no
//! escaping.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use promstorm_types::QueryTemplate;
use thiserror::Error;

/// Errors produced while loading templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The file could not be opened or read.
    #[error("failed to read query templates from {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Load templates from `path`, in file order.
///
/// Any read error discards everything read so far.
pub fn load_templates<P: AsRef<Path>>(path: P) -> Result<Vec<QueryTemplate>, TemplateError> {
    let path = path.as_ref();
    let io_error = |source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_error)?);

    let mut templates = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(io_error)?;
        if let Some(template) = parse_line(&line) {
            templates.push(template);
        }
    }
    Ok(templates)
}

/// Apply the same line rules to text already in memory.
pub fn parse_templates(text: &str) -> Vec<QueryTemplate> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<QueryTemplate> {
    let line = line.trim();
    (!line.is_empty()).then(|| QueryTemplate::new(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn as_strs(templates: &[QueryTemplate]) -> Vec<&str> {
        templates.iter().map(QueryTemplate::as_str).collect()
    }

    #[test]
    fn test_blank_lines_skipped_and_order_kept() {
        let file = write_lines(&["  ", r#"up{instance="host-0"}"#, "", "rate(foo[5m])"]);

        let templates = load_templates(file.path()).unwrap();
        assert_eq!(
            as_strs(&templates),
            vec![r#"up{instance="host-0"}"#, "rate(foo[5m])"]
        );
    }

    #[test]
    fn test_lines_are_trimmed_but_interior_whitespace_kept() {
        let file = write_lines(&["\t sum by (job) (up)  ", "   a   +   b"]);

        let templates = load_templates(file.path()).unwrap();
        assert_eq!(as_strs(&templates), vec!["sum by (job) (up)", "a   +   b"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"up\r\n\r\nrate(x[1m])\r\n").unwrap();
        file.flush().unwrap();

        let templates = load_templates(file.path()).unwrap();
        assert_eq!(as_strs(&templates), vec!["up", "rate(x[1m])"]);
    }

    #[test]
    fn test_empty_file() {
        let file = write_lines(&[]);
        assert!(load_templates(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let file = write_lines(&["up", "up"]);
        assert_eq!(load_templates(file.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_templates("/nonexistent/path/queries.txt").unwrap_err();
        let TemplateError::Io { path, source } = &err;
        assert_eq!(path, Path::new("/nonexistent/path/queries.txt"));
        assert_eq!(source.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("/nonexistent/path/queries.txt"));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"up\n\xff\xfe\n").unwrap();
        file.flush().unwrap();

        assert!(load_templates(file.path()).is_err());
    }

    #[test]
    fn test_parse_templates_in_memory() {
        let templates = parse_templates("\n  up \n\n  rate(foo[5m])\n");
        assert_eq!(as_strs(&templates), vec!["up", "rate(foo[5m])"]);
    }
}
