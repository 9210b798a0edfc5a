//! Coin daemon process launch
//!
//! Starts a coin's daemon binary as a child process. Its stdout and stderr
//! are piped and drained by a background task so the child never blocks on
//! a full pipe; the task's outcome stays observable through its join handle.
//!
//! The child is not killed when the handle is dropped. A daemon that came up
//! healthy keeps running after the tool exits.

use sdk::MnError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A daemon launched by this process
pub struct DaemonProcess {
    binary: PathBuf,
    child: Child,
    drain: JoinHandle<io::Result<()>>,
}

impl DaemonProcess {
    /// Spawn `binary` with `args`
    pub fn spawn(binary: &Path, args: &[String]) -> Result<Self, MnError> {
        let mut child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| MnError::DaemonStartFailed {
                path: binary.to_path_buf(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let drain = tokio::spawn(async move {
            let (out, err) = tokio::join!(drain_pipe(stdout), drain_pipe(stderr));
            if let Err(e) = &out {
                warn!("Unable to read daemon stdout: {}", e);
            }
            if let Err(e) = &err {
                warn!("Unable to read daemon stderr: {}", e);
            }
            out.and(err)
        });

        info!(
            "Started {} (pid {})",
            binary.display(),
            child.id().map_or_else(|| "?".to_string(), |p| p.to_string())
        );

        Ok(Self {
            binary: binary.to_path_buf(),
            child,
            drain,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// OS process id, `None` once the child has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the child and wait for it to exit
    pub async fn kill(&mut self) -> Result<(), MnError> {
        info!("Stopping {}", self.binary.display());
        match self.child.kill().await {
            Ok(()) => Ok(()),
            // Already exited
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Wait for the output drain to finish and return its outcome
    ///
    /// The drain ends once both pipes close, which happens when the child and
    /// anything it forked with the same pipes have exited.
    pub async fn join_drain(self) -> io::Result<()> {
        match self.drain.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        }
    }
}

async fn drain_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    let mut buf = [0u8; 4096];
    let mut total = 0usize;
    loop {
        let n = pipe.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n;
    }
    debug!("Daemon pipe closed after {} bytes", total);
    Ok(())
}
