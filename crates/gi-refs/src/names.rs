//! Branch name validation following git-style conventions.
//!
//! Valid branch names:
//! - Must be non-empty and must not be `HEAD`
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..`, `@{`, or `//`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - No `/`-separated component may start with `.`

use crate::error::{RefError, RefResult};

/// Substrings that may not appear anywhere in a branch name.
const FORBIDDEN: &[(&str, &str)] = &[
    ("..", "must not contain '..'"),
    ("@{", "must not contain '@{'"),
    ("//", "must not contain consecutive slashes"),
];

/// Validate a branch name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use gi_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("master").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    let invalid = |reason: String| {
        Err(RefError::InvalidBranchName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("must not be empty".into());
    }
    if name == "HEAD" {
        return invalid("HEAD is reserved".into());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(*c))
    {
        return invalid(format!("contains forbidden character {ch:?}"));
    }
    if let Some((_, reason)) = FORBIDDEN.iter().find(|(needle, _)| name.contains(needle)) {
        return invalid((*reason).into());
    }
    if name.starts_with(['.', '/']) || name.ends_with(['.', '/']) {
        return invalid("must not start or end with '.' or '/'".into());
    }
    if name.ends_with(".lock") {
        return invalid("must not end with '.lock'".into());
    }
    if let Some(component) = name.split('/').find(|c| c.starts_with('.')) {
        return invalid(format!("component {component:?} starts with '.'"));
    }
    Ok(())
}
