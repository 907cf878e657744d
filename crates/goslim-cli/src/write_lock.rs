//! Single-run lock in the published directory.
//!
//! Two concurrent runs would race on the same published and backup files,
//! so every run holds `<published_dir>/.goslim.lock` (containing its PID)
//! from start until reporting. A lock whose PID no longer runs is stale and
//! is removed.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const LOCK_FILE: &str = ".goslim.lock";
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct WriteLockGuard {
    path: PathBuf,
}

impl WriteLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriteLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Wait up to `wait` for the lock on `published_dir`.
pub async fn acquire_for_dir(published_dir: &Path, wait: Duration) -> anyhow::Result<WriteLockGuard> {
    let lock_path = published_dir.join(LOCK_FILE);
    let started = Instant::now();

    loop {
        match try_acquire(&lock_path) {
            Ok(guard) => return Ok(guard),
            Err(LockState::HeldBy(pid)) => {
                if started.elapsed() >= wait {
                    anyhow::bail!(
                        "another refresh run holds {} (pid {pid}); gave up after {}s",
                        lock_path.display(),
                        wait.as_secs()
                    );
                }
                tracing::debug!(pid, "waiting for running refresh to finish");
                tokio::time::sleep(LOCK_RETRY_DELAY).await;
            }
            Err(LockState::Stale(pid)) => {
                tracing::warn!(pid, path = %lock_path.display(), "removing stale lock");
                let _ = std::fs::remove_file(&lock_path);
            }
            Err(LockState::Unknown(reason)) => {
                if started.elapsed() >= wait {
                    anyhow::bail!(
                        "could not acquire lock at {}: {reason}; remove it if no goslim-refresh process is running",
                        lock_path.display()
                    );
                }
                tokio::time::sleep(LOCK_RETRY_DELAY).await;
            }
        }
    }
}

#[derive(Debug)]
enum LockState {
    HeldBy(i32),
    Stale(i32),
    Unknown(String),
}

fn try_acquire(lock_path: &Path) -> Result<WriteLockGuard, LockState> {
    if let Some(parent) = lock_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let pid = std::process::id();
            let _ = writeln!(file, "{pid}");
            Ok(WriteLockGuard {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut pid_buf = String::new();
            if let Err(err) = OpenOptions::new()
                .read(true)
                .open(lock_path)
                .and_then(|mut file| file.read_to_string(&mut pid_buf))
            {
                return Err(LockState::Unknown(err.to_string()));
            }

            match pid_buf.trim().parse::<i32>().ok() {
                Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Some(pid) => Err(LockState::Stale(pid)),
                None => Err(LockState::Unknown("lock file holds no pid".to_string())),
            }
        }
        Err(err) => Err(LockState::Unknown(err.to_string())),
    }
}

fn is_process_running(pid: i32) -> bool {
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
