// ABOUTME: Startup cleanup of temp files left behind by a crash between temp write and rename.
// ABOUTME: Only removes *.tmp siblings; destination documents and shards are never touched.

use std::io;
use std::path::Path;

use tokio::fs;

use crate::atomic::TEMP_SUFFIX;
use crate::run_log::RUN_LOG_DIR;

/// Remove stale temp files from the data root and the run-log directory.
/// Missing directories are skipped. Returns the number of files removed.
///
/// Must only run while no store in this process is writing, i.e. before
/// the stores are handed out.
pub async fn sweep_stale_temps(root: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for dir in [root.to_path_buf(), root.join(RUN_LOG_DIR)] {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(TEMP_SUFFIX) || !entry.file_type().await?.is_file() {
                continue;
            }

            tracing::warn!("removing stale temp file {}", entry.path().display());
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
    }

    if removed > 0 {
        tracing::info!("swept {} stale temp files from {}", removed, root.display());
    }
    Ok(removed)
}
