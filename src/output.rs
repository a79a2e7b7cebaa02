use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use eyre::Result;
use log::debug;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// File name for a summary written at `at`, e.g. `summary_20240131_154502.txt`
pub fn summary_file_name(at: &DateTime<Local>) -> String {
    format!("summary_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Write a summary to a timestamp-named text file under `dir`, creating it if needed.
pub fn save_summary(dir: &Path, summary: &str) -> Result<PathBuf> {
    save_summary_at(dir, summary, &Local::now())
}

/// Never overwrites: a name already taken within the same second gets a `_1`, `_2`, ... suffix.
pub fn save_summary_at(dir: &Path, summary: &str, at: &DateTime<Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let base = summary_file_name(at);
    let stem = base.trim_end_matches(".txt");

    for n in 0u32.. {
        let name = if n == 0 { base.clone() } else { format!("{stem}_{n}.txt") };
        let path = dir.join(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        };
        file.write_all(summary.as_bytes())?;
        debug!("Saved summary: {}", path.display());
        return Ok(path);
    }

    eyre::bail!("no free summary file name in {}", dir.display())
}
