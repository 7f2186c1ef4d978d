//! Saved-state storage trait and file implementation

use crate::error::Result;
use crate::paths::default_state_dir;
use crate::structs::AppState;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_FILE_NAME: &str = "state.dat";

/// Saved-state storage trait
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the saved state. A missing store yields an empty state;
    /// unreadable content is reported in logs and also yields an empty
    /// state, never a crash.
    async fn load_state(&self) -> Result<AppState>;

    /// Persist the whole state.
    async fn save_state(&self, state: &AppState) -> Result<()>;
}

/// File-based saved-state storage (`state.dat` under a base directory).
#[derive(Clone)]
pub struct FileStateStorage {
    base_path: PathBuf,
}

impl FileStateStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Storage rooted at the platform state directory.
    pub fn default_location() -> Self {
        Self::new(default_state_dir())
    }

    fn state_path(&self) -> PathBuf {
        self.base_path.join(STATE_FILE_NAME)
    }
}

#[async_trait]
impl StateStorage for FileStateStorage {
    async fn load_state(&self) -> Result<AppState> {
        let path = self.state_path();

        if !path.exists() {
            return Ok(AppState::default());
        }

        let contents = fs::read_to_string(&path).await?;
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "saved state unreadable, starting empty");
                Ok(AppState::default())
            }
        }
    }

    async fn save_state(&self, state: &AppState) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;

        let contents = serde_json::to_string_pretty(state)?;
        fs::write(self.state_path(), contents).await?;

        Ok(())
    }
}
