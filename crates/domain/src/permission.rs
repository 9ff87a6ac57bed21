use std::fmt::{Display, Formatter};

use clinic_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Surrogate identifier assigned by the store when a permission is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionId(i64);

impl PermissionId {
    /// Wraps a stored identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Capability token such as `preclinic.upsert`.
///
/// Keys are trimmed and never empty. Dot-namespacing is a convention only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionKey(NonEmptyString);

impl PermissionKey {
    /// Validates and normalizes a permission key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value)
            .map(Self)
            .map_err(|_| AppError::Validation("permission key is required".to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Registered permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    key: PermissionKey,
    name: Option<String>,
}

impl Permission {
    /// Creates a permission projection from stored values.
    ///
    /// Blank display names are normalized to `None`.
    #[must_use]
    pub fn new(id: PermissionId, key: PermissionKey, name: Option<String>) -> Self {
        Self {
            id,
            key,
            name: normalize_display_name(name),
        }
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the unique key.
    #[must_use]
    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    /// Returns the optional display label.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Trims a display label and drops it when blank.
#[must_use]
pub fn normalize_display_name(name: Option<String>) -> Option<String> {
    name.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Permission keys the clinic routes rely on, with display labels.
pub const DEFAULT_PERMISSION_CATALOG: &[(&str, &str)] = &[
    ("consulta.create", "Registrar consulta"),
    ("consulta.view", "Ver consultas"),
    ("preclinic.upsert", "Registrar preclínica"),
    ("preclinic.view", "Ver preclínica"),
];
