//! Value resolution helpers: command line, then environment, then file.

use std::str::FromStr;

/// Read a process environment variable, treating empty values as unset.
#[must_use]
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Environment value if set and non-empty, otherwise the file value.
pub fn resolve_string<E>(env: &E, name: &str, file: Option<&str>) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    env(name)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| file.map(str::to_owned))
        .filter(|value| !value.trim().is_empty())
}

/// Parsed environment value, falling back to the file value when unset or unparseable.
pub fn resolve_parsed<E, T>(env: &E, name: &str, file: Option<T>) -> Option<T>
where
    E: Fn(&str) -> Option<String>,
    T: FromStr,
{
    env(name)
        .and_then(|raw| raw.trim().parse().ok())
        .or(file)
}

/// Boolean from the environment (`1`, `true`, `yes`, `y`, `on`), then file, then `default`.
pub fn resolve_bool<E>(env: &E, name: &str, file: Option<bool>, default: bool) -> bool
where
    E: Fn(&str) -> Option<String>,
{
    env(name)
        .map(|raw| parse_bool(&raw))
        .or(file)
        .unwrap_or(default)
}

/// Parse a permissive boolean flag value.
#[must_use]
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Split a comma-separated list, dropping blank tokens.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Concatenate file, environment and command-line list values in that order.
///
/// Environment and command-line values may be comma-separated.
pub fn merge_lists<E>(env: &E, name: &str, file: &[String], cli: &[String]) -> Vec<String>
where
    E: Fn(&str) -> Option<String>,
{
    let mut merged: Vec<String> = file
        .iter()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect();
    if let Some(raw) = env(name) {
        merged.extend(split_list(&raw));
    }
    merged.extend(cli.iter().flat_map(|value| split_list(value)));
    merged
}

/// Parse `NAME=VALUE` assignments; entries without `=` or with a blank name are skipped.
#[must_use]
pub fn parse_assignments<S: AsRef<str>>(values: &[S]) -> Vec<(String, String)> {
    values
        .iter()
        .filter_map(|raw| {
            let (name, value) = raw.as_ref().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}
