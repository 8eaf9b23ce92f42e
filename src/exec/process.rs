/// Single-shot child process execution with redirection and an optional time limit.
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// How often a time-limited child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Where the child's stdin comes from.
#[derive(Debug, Default)]
pub enum StdinSource {
    /// Share the caller's stdin (the terminal).
    #[default]
    Inherit,
    /// Read from an open file.
    File(File),
}

/// Where the child's stdout goes.
#[derive(Debug, Default)]
pub enum StdoutSink {
    /// Collect stdout and return it.
    #[default]
    Capture,
    /// Share the caller's stdout (the terminal).
    Inherit,
    /// Write into an open file.
    File(File),
}

/// Specification of one child process.
#[derive(Debug)]
pub struct ProcessSpec {
    /// Program followed by its arguments. Never interpreted by a shell.
    pub argv: Vec<String>,
    /// Working directory; the caller's when `None`.
    pub cwd: Option<PathBuf>,
    pub stdin: StdinSource,
    pub stdout: StdoutSink,
    /// Wall-clock limit; unlimited when `None`.
    pub timeout: Option<Duration>,
}

impl ProcessSpec {
    /// A spec with inherited stdin, captured stdout and no limit.
    #[must_use]
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            cwd: None,
            stdin: StdinSource::Inherit,
            stdout: StdoutSink::Capture,
            timeout: None,
        }
    }
}

/// What happened to the child.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The child exited on its own.
    Finished {
        status: ExitStatus,
        /// Captured stdout, present only for [`StdoutSink::Capture`].
        stdout: Option<Vec<u8>>,
        elapsed: Duration,
    },
    /// The child exceeded its limit and was killed.
    TimedOut { elapsed: Duration },
}

/// Spawn the child described by `spec` and block until it exits or times out.
///
/// # Errors
///
/// Returns the underlying I/O error if the program cannot be spawned or waited on.
pub fn run_process(spec: ProcessSpec) -> std::io::Result<ProcessOutcome> {
    let Some((program, args)) = spec.argv.split_first() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty command line",
        ));
    };

    let mut command = Command::new(program);
    command.args(args);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    // A child reading the terminal must stay in the foreground process group.
    let isolate = !matches!(spec.stdin, StdinSource::Inherit);
    #[cfg(unix)]
    if isolate {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(match spec.stdin {
        StdinSource::Inherit => Stdio::inherit(),
        StdinSource::File(f) => Stdio::from(f),
    });
    let capture = matches!(spec.stdout, StdoutSink::Capture);
    command.stdout(match spec.stdout {
        StdoutSink::Capture => Stdio::piped(),
        StdoutSink::Inherit => Stdio::inherit(),
        StdoutSink::File(f) => Stdio::from(f),
    });

    debug!(argv = ?spec.argv, cwd = ?spec.cwd, timeout = ?spec.timeout, "spawning");
    let started = Instant::now();
    let mut child = command.spawn()?;

    // Drain stdout on a helper thread so the child never blocks on a full pipe
    // while we poll for its exit.
    let reader = if capture {
        child.stdout.take().map(spawn_reader)
    } else {
        None
    };

    let status = match spec.timeout {
        Some(limit) => match child.wait_timeout(limit) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let elapsed = started.elapsed();
                warn!(program = %program, ?limit, "time limit exceeded, killing child");
                kill_tree(&mut child, isolate);
                let _ = child.wait();
                // The reader is left detached: a grandchild may still hold the pipe open.
                drop(reader);
                return Ok(ProcessOutcome::TimedOut { elapsed });
            }
            Err(e) => {
                kill_tree(&mut child, isolate);
                let _ = child.wait();
                return Err(e);
            }
        },
        None => child.wait()?,
    };
    let elapsed = started.elapsed();
    debug!(program = %program, %status, ?elapsed, "child exited");

    let stdout = match reader {
        Some(handle) => Some(
            handle
                .join()
                .map_err(|_| std::io::Error::other("stdout reader panicked"))??,
        ),
        None => None,
    };

    Ok(ProcessOutcome::Finished {
        status,
        stdout,
        elapsed,
    })
}

/// Kill the child, and its whole process group when it was spawned in its own.
fn kill_tree(child: &mut Child, isolated: bool) {
    #[cfg(unix)]
    if isolated {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Ok(pid) = i32::try_from(child.id()) {
            match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                Ok(()) => return,
                Err(e) => debug!(pid, error = %e, "killpg failed, killing child only"),
            }
        }
    }
    #[cfg(not(unix))]
    let _ = isolated;
    let _ = child.kill();
}

fn spawn_reader(mut pipe: std::process::ChildStdout) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Human-readable description of how a process ended.
#[must_use]
pub fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {signal}");
        }
    }
    "terminated abnormally".to_owned()
}

/// Extension trait to add `wait_timeout` to `Child`.
trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
        }
    }
}
