//! Application state directory resolution

use std::path::PathBuf;

const APP_DIR_NAME: &str = "chat-tree-client";

/// Platform state directory for this application, falling back through
/// the data directory to a temp location when neither is resolvable.
pub fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}
