//! Issue key input from arguments, a file, or piped stdin.

use std::io::{BufRead, IsTerminal};
use std::path::Path;

use docket_refs::collect_issue_keys;

use crate::error::CliError;

/// Issue keys from `file` lines, then `values`.
///
/// Stdin is read only when both are empty and it is not a terminal. Each
/// entry may be a key or a browse URL; duplicates keep their first position.
pub(crate) fn read_issue_keys(values: &[String], file: Option<&Path>) -> Result<Vec<String>, CliError> {
    let mut refs = match file {
        Some(path) => read_lines(path)?,
        None => Vec::new(),
    };
    refs.extend(values.iter().cloned());

    if refs.is_empty() && !std::io::stdin().is_terminal() {
        refs = std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
    }
    keys_from(&refs)
}

fn read_lines(path: &Path) -> Result<Vec<String>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Validation(format!(
            "Failed to read issue list from {}: {e}",
            path.display()
        ))
    })?;
    Ok(content.lines().map(str::to_owned).collect())
}

fn keys_from(refs: &[String]) -> Result<Vec<String>, CliError> {
    let keys = collect_issue_keys(refs.iter().map(String::as_str).filter(|r| !r.trim().is_empty()));
    if keys.is_empty() {
        return Err(CliError::Validation(
            "No valid issue keys found. Provide URLs or keys.".to_owned(),
        ));
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_file_lines_come_before_arguments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://jira.example.com/browse/ops-2\n\nnot a key").unwrap();

        let keys = read_issue_keys(&["OPS-1".to_owned(), "ops-2".to_owned()], Some(file.path())).unwrap();

        assert_eq!(keys, vec!["OPS-2", "OPS-1"]);
    }

    #[test]
    fn test_no_valid_keys() {
        let err = keys_from(&["bogus".to_owned(), " ".to_owned()]).unwrap_err();
        assert_eq!(err.to_string(), "No valid issue keys found. Provide URLs or keys.");
    }

    #[test]
    fn test_missing_file() {
        let err = read_issue_keys(&[], Some(Path::new("/nonexistent/issues.txt"))).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read issue list from /nonexistent/issues.txt"));
    }
}
