use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as AnyhowContext, Result};

pub const LOG_FILE_NAME: &str = "ast_server.log";
pub const MAX_LOG_BYTES: u64 = 100_000_000;
pub const LOG_BACKUPS: usize = 9;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub quiet: bool,
    /// Write to `<dir>/ast_server.log` instead of stderr.
    pub logs_dir: Option<PathBuf>,
}

pub fn init(options: &LogOptions) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if options.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if options.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<8} [{}:{}] {}",
            buf.timestamp_millis(),
            record.level(),
            record.module_path().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.args()
        )
    });

    match &options.logs_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create logs dir {}", dir.display()))?;
            let path = dir.join(LOG_FILE_NAME);
            rotate(&path, MAX_LOG_BYTES, LOG_BACKUPS)
                .with_context(|| format!("Failed to rotate {}", path.display()))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.try_init().context("logger already initialized")?;
    Ok(())
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Shift `path` to `path.1` (and older backups up by one) once it reaches
/// `max_bytes`. The oldest backup beyond `backups` is removed.
pub fn rotate(path: &Path, max_bytes: u64, backups: usize) -> io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if len < max_bytes {
        return Ok(false);
    }

    if backups == 0 {
        fs::remove_file(path)?;
        return Ok(true);
    }

    let oldest = backup_path(path, backups);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for index in (1..backups).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_or_missing_files_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        assert!(!rotate(&path, 10, 3).unwrap());

        fs::write(&path, "short").unwrap();
        assert!(!rotate(&path, 10, 3).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn rotation_shifts_backups_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "current log").unwrap();
        fs::write(backup_path(&path, 1), "one").unwrap();
        fs::write(backup_path(&path, 2), "two").unwrap();

        assert!(rotate(&path, 4, 2).unwrap());

        assert!(!path.exists());
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "current log");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "one");
        assert!(!backup_path(&path, 3).exists());
    }
}
