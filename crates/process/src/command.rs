use crate::error::ProcessError;
use crate::output::CommandOutput;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Description of a single external command invocation.
#[derive(Clone, Debug)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl CommandSpec {
    /// Starts a description for `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bounds how long the child may run. `None` waits indefinitely.
    ///
    /// Only the direct child is killed when the limit expires. A grandchild
    /// that inherited the output pipes keeps them open, and [`run`] returns
    /// once it exits too.
    ///
    /// [`run`]: Self::run
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Renders the command line for diagnostics.
    pub fn display(&self) -> String {
        let mut rendered = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }

    /// Runs the command to completion, or until its timeout expires.
    ///
    /// Stdin is closed. On timeout the child is killed and the output it
    /// produced before the deadline is returned with
    /// [`CommandOutput::timed_out`] set.
    pub fn run(&self) -> Result<CommandOutput, ProcessError> {
        let rendered = self.display();
        debug!(command = %rendered, "running external command");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let program = self.program.to_string_lossy();
        let mut child = command
            .spawn()
            .map_err(|error| ProcessError::from_io(&program, error))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let (status, timed_out) = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit),
            None => child.wait().map(|status| (status, false)),
        }
        .map_err(|error| ProcessError::from_io(&program, error))?;

        let output = CommandOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
            timed_out,
        };

        if timed_out {
            warn!(command = %rendered, "command timed out and was killed");
        }
        if !output.stderr.is_empty() {
            trace!(command = %rendered, stderr = %output.stderr.trim_end(), "command stderr");
        }

        Ok(output)
    }
}

/// Resolves `program` to an executable path, searching `PATH` when the name
/// has no directory component.
pub fn locate(program: &OsStr, hint: &str) -> Result<PathBuf, ProcessError> {
    which::which(program).map_err(|_| ProcessError::NotFound {
        program: program.to_string_lossy().into_owned(),
        hint: hint.to_string(),
    })
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            // A read error still leaves whatever arrived before it in the buffer.
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = reader
        .map(|handle| handle.join().unwrap_or_default())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> io::Result<(ExitStatus, bool)> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }

        let now = Instant::now();
        if now >= deadline {
            if let Err(error) = child.kill() {
                // The child exited between the poll and the kill.
                if error.kind() != io::ErrorKind::InvalidInput {
                    return Err(error);
                }
            }
            let status = child.wait()?;
            return Ok((status, true));
        }

        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
