use crate::error::IoError;
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// A connection to a child process: reads come from its stdout, writes go to its stdin.
///
/// Its stderr is drained line by line into the log and a reaper thread waits for the
/// process, so an abandoned child never lingers as a zombie.
#[derive(Debug)]
pub struct StdioConn {
    pid: u32,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    reaper: Option<JoinHandle<io::Result<ExitStatus>>>,
}

impl StdioConn {
    /// Starts `path` with `args` and piped stdio.
    ///
    /// # Errors
    /// Returns [`IoError::Process`] if the program cannot be started.
    pub fn spawn<I, S>(path: impl AsRef<OsStr>, args: I) -> Result<Self, IoError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let path = path.as_ref();
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| IoError::Process {
                source: e,
                context: Some(format!("starting {}", path.display()).into()),
            })?;

        let pid = child.id();
        let (stdin, stdout, stderr) = match take_pipes(&mut child) {
            Ok(pipes) => pipes,
            Err(e) => {
                abandon(&mut child);
                return Err(e);
            },
        };

        let drain = thread::Builder::new().name(format!("stdio-{pid}-stderr"));
        if let Err(e) = drain.spawn(move || drain_stderr(pid, stderr)) {
            abandon(&mut child);
            return Err(e.into());
        }

        // The child is handed over only once the reaper thread exists.
        let (hand_over, receive) = mpsc::channel::<Child>();
        let spawned = thread::Builder::new().name(format!("stdio-{pid}-wait")).spawn(move || {
            let mut child = receive.recv().map_err(|_| closed("reaper"))?;
            let status = child.wait();
            match &status {
                Ok(s) => tracing::debug!(pid, status = %s, "stdio process exited"),
                Err(e) => tracing::warn!(pid, error = %e, "waiting for stdio process failed"),
            }
            status
        });
        let reaper = match spawned {
            Ok(reaper) => reaper,
            Err(e) => {
                abandon(&mut child);
                return Err(e.into());
            },
        };
        if let Err(mpsc::SendError(mut child)) = hand_over.send(child) {
            abandon(&mut child);
            return Err("stdio reaper thread ended early".into());
        }

        tracing::debug!(pid, program = %path.display(), "stdio process started");
        Ok(Self { pid, stdin: Some(stdin), stdout: Some(stdout), reaper: Some(reaper) })
    }

    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Closes stdin, then stdout.
    ///
    /// Closing stdin signals end-of-input to the child. Calling it twice is harmless.
    pub fn close(&mut self) {
        drop(self.stdin.take());
        drop(self.stdout.take());
    }

    /// Closes the connection and waits for the child to exit.
    ///
    /// # Errors
    /// Returns [`IoError::Process`] if waiting failed and [`IoError::Internal`] if the
    /// reaper thread panicked.
    pub fn wait(mut self) -> Result<ExitStatus, IoError> {
        self.close();
        let Some(reaper) = self.reaper.take() else {
            return Err("stdio process was already reaped".into());
        };
        let status = reaper.join().map_err(|_| IoError::from("stdio reaper thread panicked"))?;
        Ok(status?)
    }
}

/// Kills a child that will not be handed to a reaper and waits for it.
fn abandon(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!(pid = child.id(), error = %e, "killing stdio process failed");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid = child.id(), error = %e, "reaping stdio process failed");
    }
}

fn take_pipes(child: &mut Child) -> Result<(ChildStdin, ChildStdout, ChildStderr), IoError> {
    let missing = |name: &'static str| IoError::MissingPipe { message: name.into(), context: None };
    let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;
    Ok((stdin, stdout, stderr))
}

fn drain_stderr(pid: u32, stderr: ChildStderr) {
    for line in BufReader::new(stderr).lines() {
        match line {
            Ok(line) => tracing::warn!(pid, "stdioproc err: {line}"),
            Err(e) => {
                tracing::warn!(pid, error = %e, "stdioproc failed");
                return;
            },
        }
    }
}

fn closed(which: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, format!("stdio connection: {which} closed"))
}

impl Read for StdioConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.as_mut().ok_or_else(|| closed("stdout"))?.read(buf)
    }
}

impl Write for StdioConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdin.as_mut().ok_or_else(|| closed("stdin"))?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdin.as_mut().ok_or_else(|| closed("stdin"))?.flush()
    }
}
