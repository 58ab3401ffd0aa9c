// ABOUTME: Crash-safe whole-file replacement: write a temp sibling, fsync it, then rename over the target.
// ABOUTME: Readers only ever observe the previous complete file or the next complete file.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use ulid::Ulid;

/// Suffix carried by every temp file this module creates.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Contents fully written and synced to a temp sibling of `dest`, not yet
/// visible at `dest`. Dropping it without calling [`StagedFile::commit`]
/// leaves the destination untouched and the temp file behind, which is
/// exactly the on-disk state after a crash between the two steps.
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    dest: PathBuf,
}

impl StagedFile {
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Atomically rename the temp file over the destination.
    pub async fn commit(self) -> io::Result<()> {
        if let Err(e) = fs::rename(&self.tmp_path, &self.dest).await {
            let _ = fs::remove_file(&self.tmp_path).await;
            return Err(e);
        }

        // Fsync the parent directory so the rename itself survives a crash.
        // Best-effort: the rename already succeeded and the data is consistent.
        if let Some(parent) = self.dest.parent()
            && let Ok(dir) = File::open(parent).await
        {
            let _ = dir.sync_all().await;
        }

        Ok(())
    }
}

/// Temp sibling for `dest`, unique per call so two writers targeting the
/// same file never share a temp path.
fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!("{}.{}{}", name, Ulid::new(), TEMP_SUFFIX))
}

/// Write `contents` to a fresh temp sibling of `dest` and fsync it.
/// Creates the parent directory if needed.
pub async fn stage(dest: &Path, contents: &[u8]) -> io::Result<StagedFile> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = temp_sibling(dest);
    let written = async {
        let mut file = File::create(&tmp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    Ok(StagedFile {
        tmp_path,
        dest: dest.to_path_buf(),
    })
}

/// Replace `dest` with `contents` atomically.
pub async fn write_atomic(dest: &Path, contents: &[u8]) -> io::Result<()> {
    stage(dest, contents).await?.commit().await
}
