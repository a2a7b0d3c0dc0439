use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_UNPACK_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Extracts a zip archive into `dst`. A failed call may leave partial output
/// behind; callers judge the result by what ends up on disk.
pub trait Unpacker: Send + Sync {
    fn unpack(&self, archive_path: &Path, dst: &Path) -> Result<()>;
}

/// Extracts with the host's archive tools: `Expand-Archive` on Windows,
/// otherwise `unzip` with `tar` as fallback. Every attempt is bounded by
/// `timeout`.
#[derive(Debug, Clone, Copy)]
pub struct CommandUnpacker {
    timeout: Duration,
}

impl CommandUnpacker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for CommandUnpacker {
    fn default() -> Self {
        Self::new(DEFAULT_UNPACK_TIMEOUT)
    }
}

impl Unpacker for CommandUnpacker {
    fn unpack(&self, archive_path: &Path, dst: &Path) -> Result<()> {
        fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;

        if cfg!(windows) {
            let mut command = Command::new("powershell");
            command.arg("-NoProfile").arg("-Command").arg(format!(
                "Expand-Archive -LiteralPath '{}' -DestinationPath '{}' -Force",
                escape_ps_single_quote(archive_path),
                escape_ps_single_quote(dst)
            ));
            if run_command_with_timeout(
                &mut command,
                self.timeout,
                "failed to extract zip archive with powershell",
            )
            .is_ok()
            {
                return Ok(());
            }
        }

        let mut unzip_command = Command::new("unzip");
        unzip_command
            .arg("-q")
            .arg("-o")
            .arg(archive_path)
            .arg("-d")
            .arg(dst);
        if run_command_with_timeout(
            &mut unzip_command,
            self.timeout,
            "failed to extract zip archive with unzip",
        )
        .is_ok()
        {
            return Ok(());
        }

        run_command_with_timeout(
            Command::new("tar")
                .arg("-xf")
                .arg(archive_path)
                .arg("-C")
                .arg(dst),
            self.timeout,
            "failed to extract zip archive with tar fallback",
        )
    }
}

pub(crate) fn run_command_with_timeout(
    command: &mut Command,
    timeout: Duration,
    context_message: &str,
) -> Result<()> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("{context_message}: command failed to start"))?;

    let deadline = Instant::now() + timeout;
    loop {
        let status = child
            .try_wait()
            .with_context(|| format!("{context_message}: failed to poll command"))?;
        if let Some(status) = status {
            if status.success() {
                return Ok(());
            }
            return Err(anyhow!("{context_message}: status={status}"));
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!(
                "{context_message}: timed out after {}ms",
                timeout.as_millis()
            ));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn escape_ps_single_quote(path: &Path) -> String {
    let mut os = OsString::new();
    os.push(path.as_os_str());
    os.to_string_lossy().replace('\'', "''")
}
