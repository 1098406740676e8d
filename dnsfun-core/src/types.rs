//! Domain types shared across the workspace.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::PathBuf;

use hickory_proto::rr::Name;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed service name (`dice`, `fx`, ...).
///
/// Doubles as the configuration section name and as the single DNS label the
/// service owns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceName(pub String);

impl ServiceName {
    /// The zone label this service owns: `name + "."`.
    ///
    /// Fails unless the name is exactly one valid DNS label.
    pub fn zone(&self) -> Result<Name, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidName {
            name: self.0.clone(),
            reason: reason.to_string(),
        };

        if self.0.is_empty() || self.0.len() > 63 {
            return Err(invalid("must be 1-63 characters"));
        }
        if !self
            .0
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(invalid("only letters, digits and '-' are allowed"));
        }
        if self.0.starts_with('-') || self.0.ends_with('-') {
            return Err(invalid("must not start or end with '-'"));
        }

        let zone = Name::from_ascii(format!("{}.", self.0)).map_err(|e| invalid(&e.to_string()))?;
        Ok(zone.to_lowercase())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Snapshot settings
// ---------------------------------------------------------------------------

/// Per-service snapshot configuration (`snapshot_enabled`, `snapshot_file`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapshotSettings {
    pub enabled: bool,
    pub file: Option<PathBuf>,
}

impl SnapshotSettings {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn at(file: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            file: Some(file.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ServiceName::from("dice").to_string(), "dice");
    }

    #[test]
    fn zone_appends_root_dot() {
        let zone = ServiceName::from("dice").zone().expect("zone");
        assert_eq!(zone.to_string(), "dice.");
        assert_eq!(zone.num_labels(), 1);
    }

    #[test]
    fn zone_is_lowercased() {
        let zone = ServiceName::from("FX").zone().expect("zone");
        assert_eq!(zone.to_string(), "fx.");
    }

    #[test]
    fn dotted_or_empty_names_are_rejected() {
        for bad in ["", "a.b", "-dash", "dash-", "sp ace"] {
            let err = ServiceName::from(bad).zone().unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn snapshot_settings_at_enables() {
        let s = SnapshotSettings::at("/tmp/fx.snapshot");
        assert!(s.enabled);
        assert_eq!(s.file, Some(PathBuf::from("/tmp/fx.snapshot")));
        assert!(!SnapshotSettings::disabled().enabled);
    }
}
