use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Contents of the local key-value file.
///
/// `session_token` holds the cookie header issued by the API at login; the password is
/// never written anywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Remembered {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remembered_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write store file: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store file: {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode store contents: {source}")]
    Encode {
        #[source]
        source: serde_yaml::Error,
    },
}

/// File-backed store. Every call reads or rewrites the file, so several handles to the
/// same path never disagree.
#[derive(Clone, Debug)]
pub struct RememberStore {
    path: PathBuf,
}

pub fn default_store_path() -> Option<PathBuf> {
    Some(config::home_dir()?.join(".stockboard").join("state.yml"))
}

impl RememberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Remembered, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Remembered::default()),
            Ok(contents) => serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse {
                path: self.path.display().to_string(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Remembered::default()),
            Err(e) => Err(StoreError::Read {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }

    pub fn save(&self, state: &Remembered) -> Result<(), StoreError> {
        if *state == Remembered::default() {
            return self.remove_file();
        }
        let contents = serde_yaml::to_string(state).map_err(|e| StoreError::Encode { source: e })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, contents).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    /// Drops both keys. A corrupt file is removed rather than reported.
    pub fn forget(&self) -> Result<(), StoreError> {
        self.remove_file()
    }

    fn remove_file(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Write {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }
}
