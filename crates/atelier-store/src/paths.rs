// ABOUTME: Resolves the single data root directory that every store file lives under.
// ABOUTME: Pure function of run mode, optional override, home directory, and working directory.

use std::path::{Path, PathBuf};

use crate::config::RunMode;

/// Directory under the home directory that holds per-mode data roots.
const APP_DIR: &str = ".atelier";

/// Compute the absolute data root.
///
/// An explicit override wins (relative overrides are taken against `cwd`).
/// Otherwise development mode uses `<cwd>/data`, desktop mode
/// `<home>/.atelier/data` and server mode `<home>/.atelier/server`.
/// An unknown home falls back to `/tmp`.
pub fn resolve_data_root(
    mode: RunMode,
    override_dir: Option<&Path>,
    home: Option<&Path>,
    cwd: &Path,
) -> PathBuf {
    if let Some(dir) = override_dir {
        return if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            cwd.join(dir)
        };
    }

    let home = home.unwrap_or_else(|| Path::new("/tmp"));
    let home = if home.is_absolute() {
        home.to_path_buf()
    } else {
        cwd.join(home)
    };

    match mode {
        RunMode::Development => cwd.join("data"),
        RunMode::Desktop => home.join(APP_DIR).join("data"),
        RunMode::Server => home.join(APP_DIR).join("server"),
    }
}
