//! Users resolved from the external identity provider.

use chrono::{DateTime, Utc};
use keyring_storage::UserRow;

use crate::error::UserError;

/// A local user. Identity is the email address; there is no password and
/// no role beyond the implicit default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

/// Longest email the `users.email` column holds.
pub const MAX_EMAIL_LEN: usize = 180;

/// Normalize an email for lookup and storage (trimmed, lowercase).
///
/// # Errors
///
/// Returns [`UserError::InvalidEmail`] if the value is blank, has no `@`,
/// or is longer than [`MAX_EMAIL_LEN`] characters.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(UserError::InvalidEmail {
            reason: "email is empty".to_owned(),
        });
    }
    if !email.contains('@') {
        return Err(UserError::InvalidEmail {
            reason: format!("'{email}' is not an email address"),
        });
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(UserError::InvalidEmail {
            reason: format!("email exceeds {MAX_EMAIL_LEN} characters"),
        });
    }
    Ok(email)
}
