//! Core traits that decouple monswitch from the programs it drives.
//!
//! Every concrete backend (child processes, `notify-send`, the XDG config
//! directories, a test harness, …) implements one of these traits.  The
//! planner, the reset sequence and the menu only depend on these
//! abstractions.

use std::path::PathBuf;

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Text written to the program's standard input, if any.
    pub stdin: Option<String>,
    /// Whether stdout/stderr are collected.  Uncaptured programs inherit the
    /// caller's streams, which is required for programs that daemonise.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            capture: false,
        }
    }

    /// Build an invocation from a configured argument vector
    /// (`["program", "arg", …]`).
    pub fn from_argv(argv: &[String]) -> Result<Self, ToolError> {
        let (program, args) = argv.split_first().ok_or(ToolError::EmptyCommand)?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self.capture = true;
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// The full command line, for log and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished program left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Exit code, `None` if the program was killed by a signal.
    pub status: Option<i32>,
    /// Captured standard output (empty unless captured).
    pub stdout: String,
    /// Captured standard error (empty unless captured).
    pub stderr: String,
}

impl Completion {
    /// A successful completion with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A completion with a non-zero exit code.
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Errors from driving an external program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// The program could not be started (missing executable, permissions).
    #[error("cannot run {program}: {message}")]
    Unavailable { program: String, message: String },
    /// The program ran but reported failure.
    #[error("`{command}` failed with status {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    /// The program's output did not have the expected shape.
    #[error("unexpected output from {program}: {message}")]
    BadOutput { program: String, message: String },
    /// A configured command vector was empty.
    #[error("empty command in configuration")]
    EmptyCommand,
}

/// Abstraction over starting external programs.
///
/// An implementation might spawn real child processes, or it might be a
/// recorder used in tests.
pub trait CommandRunner {
    /// The error type produced when a program cannot be run at all.
    type Error: std::error::Error + Send + 'static;

    /// Run `invocation` to completion.
    ///
    /// A non-zero exit status is **not** an error at this level; it is
    /// reported through [`Completion::status`].
    fn execute(&self, invocation: &Invocation) -> Result<Completion, Self::Error>;

    /// Locate `program` on the search path.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Run `invocation` and require a zero exit status.
    ///
    /// Returns the captured standard output.
    fn run(&self, invocation: &Invocation) -> Result<String, ToolError> {
        self.run_allowing(invocation, &[0]).map(|c| c.stdout)
    }

    /// Run `invocation` and accept any of the exit codes in `allowed`.
    fn run_allowing(&self, invocation: &Invocation, allowed: &[i32]) -> Result<Completion, ToolError> {
        let completion = self
            .execute(invocation)
            .map_err(|e| ToolError::Unavailable {
                program: invocation.program.clone(),
                message: e.to_string(),
            })?;
        match completion.status {
            Some(code) if allowed.contains(&code) => Ok(completion),
            status => Err(ToolError::Failed {
                command: invocation.command_line(),
                status: status.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: completion.stderr.trim().to_string(),
            }),
        }
    }
}

/// Urgency level of a desktop notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// Content of a progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub summary: String,
    pub body: String,
    /// Completion percentage, `0..=100`.
    pub progress: Option<u8>,
    pub urgency: Urgency,
    pub icon: String,
}

impl Notification {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            body: String::new(),
            progress: None,
            urgency: Urgency::Normal,
            icon: "video-display-symbolic".to_string(),
        }
    }
}

/// A place to show progress notifications.
///
/// # Contract
///
/// The first call to [`show`](NotificationSink::show) creates a
/// notification; every later call on the same sink replaces it in place.
pub trait NotificationSink {
    /// The error type produced by this sink.
    type Error: std::error::Error + Send + 'static;

    fn show(&mut self, notification: &Notification) -> Result<(), Self::Error>;
}

/// Lookup of saved display profiles by name.
///
/// Returns the profile's configuration text, or `None` if no profile of
/// that name is saved.  Any `Fn(&str) -> Option<String>` is a source.
pub trait ProfileSource {
    fn read_config(&self, name: &str) -> Option<String>;
}

impl<F> ProfileSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn read_config(&self, name: &str) -> Option<String> {
        self(name)
    }
}
