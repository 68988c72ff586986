//! Key records and the rules on their fields.

use chrono::{DateTime, Utc};
use keyring_storage::KeyRow;
use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Longest identifier the `keys.key_identifier` column accepts.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Lifecycle status of a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    #[default]
    Active,
    Inactive,
}

impl KeyStatus {
    /// The other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    /// The stored/wire spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KeyStatus {
    type Err = KeyError;

    /// Parse a status. Matching is exact: `"Active"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(KeyError::validation(
                "A valid status (active/inactive) is required",
            )),
        }
    }
}

/// A managed API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub id: i64,
    pub identifier: String,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Key {
    pub(crate) fn into_row(self) -> KeyRow {
        KeyRow {
            id: self.id,
            key_identifier: self.identifier,
            status: self.status.as_str().to_owned(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<KeyRow> for Key {
    type Error = KeyError;

    fn try_from(row: KeyRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| KeyError::Corrupt {
            id: row.id,
            reason: format!("unknown status '{}'", row.status),
        })?;

        Ok(Self {
            id: row.id,
            identifier: row.key_identifier,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Validate and normalize a key identifier.
///
/// Surrounding whitespace is dropped; the result must be non-empty and fit
/// the identifier column.
///
/// # Errors
///
/// Returns [`KeyError::Validation`] if the identifier is blank or too long.
pub fn validate_identifier(raw: &str) -> Result<String, KeyError> {
    let identifier = raw.trim();
    if identifier.is_empty() {
        return Err(KeyError::validation("keyIdentifier is required"));
    }
    if identifier.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(KeyError::validation(format!(
            "keyIdentifier must be at most {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    Ok(identifier.to_owned())
}
