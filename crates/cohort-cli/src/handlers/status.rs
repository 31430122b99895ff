//! Dump of persisted study keys.

use anyhow::Result;
use cohort_core::PersistedState;
use cohort_effects::FilesystemStorageHandler;
use std::path::Path;

pub async fn handle_status(state_dir: &Path) -> Result<()> {
    let storage = FilesystemStorageHandler::new(state_dir);
    let snapshot = PersistedState::new(&storage).snapshot().await?;
    if snapshot.is_empty() {
        println!("no study state in {}", state_dir.display());
        return Ok(());
    }
    for (key, value) in snapshot {
        println!("{key:<28} {value}");
    }
    Ok(())
}
