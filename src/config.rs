use rusqlite::OpenFlags;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Connection parameters for one scoped session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Database file path, or an engine-recognized identifier such as `:memory:`
    pub database: PathBuf,

    /// Enforce referential integrity for the duration of the session
    #[serde(default)]
    pub foreign_keys: bool,

    /// Open flags forwarded unmodified to the underlying open call
    #[serde(skip)]
    pub flags: OpenFlags,
}

impl SessionConfig {
    pub fn new<P: AsRef<Path>>(database: P) -> Self {
        SessionConfig {
            database: database.as_ref().to_path_buf(),
            foreign_keys: false,
            flags: OpenFlags::default(),
        }
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }
}
