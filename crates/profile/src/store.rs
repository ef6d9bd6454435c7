//! File-backed rule profiles.
//!
//! A profile is a single YAML (`.yaml`, `.yml`) or JSON (`.json`) document:
//! ```text
//! schema_version: 1
//! actions:        - registered input actions (id, description, axis_constraint)
//! rules:
//!   digital:      - ordered rule records per base axis type
//!   single_axis:
//!   dual_axis:
//!   vector_axis:
//!   quaternion_axis:
//!   pose_axis:
//! ```

use actionrule_common::AxisType;
use actionrule_input::RuleError;
use std::path::{Path, PathBuf};

use crate::document::{ProfileDocument, partition_name};

/// Errors from loading, saving and compiling profiles.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported profile format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("invalid action table: {0}")]
    Actions(#[source] RuleError),
    #[error("invalid {} rule at index {index}: {source}", partition_name(.axis))]
    InvalidRule {
        axis: AxisType,
        index: usize,
        #[source]
        source: RuleError,
    },
}

/// On-disk encoding of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Yaml,
    Json,
}

impl ProfileFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(ProfileFormat::Yaml)
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ProfileFormat::Json),
            _ => Err(ProfileError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl ProfileDocument {
    pub fn from_yaml_str(data: &str) -> Result<Self, ProfileError> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ProfileError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a profile, failing closed on a schema version mismatch.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let _span = tracing::info_span!("load_profile", path = %path.display()).entered();
        let format = ProfileFormat::from_path(path)?;
        let data = std::fs::read_to_string(path)?;
        let doc = match format {
            ProfileFormat::Yaml => Self::from_yaml_str(&data)?,
            ProfileFormat::Json => Self::from_json_str(&data)?,
        };
        doc.check_schema()?;
        tracing::debug!(
            actions = doc.actions.len(),
            rules = doc.rules.len(),
            "profile loaded"
        );
        Ok(doc)
    }

    /// Write the profile, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        let path = path.as_ref();
        let data = match ProfileFormat::from_path(path)? {
            ProfileFormat::Yaml => self.to_yaml_string()?,
            ProfileFormat::Json => self.to_json_string()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        tracing::debug!(path = %path.display(), "profile saved");
        Ok(())
    }
}
