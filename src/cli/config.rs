//! Store selection
//!
//! Resolved from an optional JSON config file, then overridden field by
//! field by explicit command-line flags:
//!
//! ```json
//! { "store": "document", "document": "./mycelium.json", "mode": "log-first" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::capability::MutableCapability;
use crate::document::DocumentCapability;
use crate::folder::FolderCapability;
use crate::tracked::{CausalityMode, TrackedCapability};

use super::args::StoreArgs;
use super::errors::{CliError, CliResult};

/// Which binding backs the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// A directory tree
    #[default]
    Folder,
    /// A single JSON document
    Document,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreKind,

    /// Root directory for the folder store
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Backing file for the document store
    #[serde(default = "default_document")]
    pub document: PathBuf,

    #[serde(default)]
    pub mode: CausalityMode,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_document() -> PathBuf {
    PathBuf::from("mycelium.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            root: default_root(),
            document: default_document(),
            mode: CausalityMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Config file (if any) with flag overrides applied
    pub fn resolve(args: &StoreArgs) -> CliResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(store) = args.store {
            config.store = store;
        }
        if let Some(root) = &args.root {
            config.root = root.clone();
        }
        if let Some(file) = &args.file {
            config.document = file.clone();
        }
        if let Some(mode) = args.mode {
            config.mode = mode;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(CliError::config_error("root must not be empty"));
        }
        if self.document.as_os_str().is_empty() {
            return Err(CliError::config_error("document must not be empty"));
        }
        if self.store == StoreKind::Document && self.document.is_dir() {
            return Err(CliError::config_error(format!(
                "document '{}' is a directory",
                self.document.display()
            )));
        }
        Ok(())
    }

    /// Bare binding for the configured store
    pub fn open_inner(&self) -> Box<dyn MutableCapability> {
        match self.store {
            StoreKind::Folder => Box::new(FolderCapability::new(&self.root)),
            StoreKind::Document => Box::new(DocumentCapability::new(&self.document)),
        }
    }

    /// The configured store behind the tracked decorator
    pub fn open(&self) -> TrackedCapability<Box<dyn MutableCapability>> {
        TrackedCapability::new(self.open_inner(), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(&StoreArgs::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mode, CausalityMode::ResourceFirst);
        assert_eq!(config.store, StoreKind::Folder);
    }

    #[test]
    fn test_file_then_flag_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mycelium.config.json");
        fs::write(
            &path,
            r#"{"store": "document", "document": "data.json", "mode": "log-first"}"#,
        )
        .unwrap();

        let args = StoreArgs {
            config: Some(path),
            mode: Some(CausalityMode::ResourceFirst),
            ..StoreArgs::default()
        };
        let config = Config::resolve(&args).unwrap();
        assert_eq!(config.store, StoreKind::Document);
        assert_eq!(config.document, PathBuf::from("data.json"));
        assert_eq!(config.mode, CausalityMode::ResourceFirst);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{"stroe": "document"}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code_str(), "MYC_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_bad_mode_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{"mode": "journal-first"}"#).unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_document_dir_only_checked_for_document_store() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("mycelium.json");
        fs::create_dir(&dir).unwrap();

        let args = StoreArgs {
            file: Some(dir),
            ..StoreArgs::default()
        };
        assert_eq!(Config::resolve(&args).unwrap().store, StoreKind::Folder);

        let args = StoreArgs {
            store: Some(StoreKind::Document),
            ..args
        };
        let err = Config::resolve(&args).unwrap_err();
        assert_eq!(err.code_str(), "MYC_CLI_CONFIG_ERROR");
    }
}
