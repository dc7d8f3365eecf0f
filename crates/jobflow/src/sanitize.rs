//! Helpers for sanitizing data before it enters file keys or tracing fields.
//!
//! Logs are safe to share for debugging; these functions keep personal data
//! (email addresses) and path tricks out of them.

/// Returns only the last path component of `name`, treating both `/` and
/// `\` as separators.
///
/// `..` and `.` components are dropped; an empty result becomes `unnamed`.
pub fn file_name_only(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .find(|part| !part.is_empty() && *part != "." && *part != "..")
        .unwrap_or("unnamed")
        .to_string()
}

/// Masks the local part of an email address.
///
/// - `jane.doe@example.com` → `j***@example.com`
/// - `not-an-email` → `***`
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}
