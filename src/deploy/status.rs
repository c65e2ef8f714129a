use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::{LabStatus, LabStatusSource, ServiceError};

/// Reads lab status from a JSON file written by a backend client
#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LabStatusSource for FileStatusSource {
    fn lab_status(&self) -> Result<LabStatus, ServiceError> {
        debug!("Reading lab status from {:?}", self.path);
        let text = fs::read_to_string(&self.path)
            .map_err(|e| ServiceError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        Ok(serde_json::from_str(&text)?)
    }
}
