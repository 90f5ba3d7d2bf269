//! Test doubles shared by the unit tests.

use crate::traits::{CommandRunner, Completion, Invocation, Notification, NotificationSink};
use std::cell::RefCell;
use std::path::PathBuf;

/// A command runner that records every call and answers through a closure.
pub struct RecordingRunner {
    respond: Box<dyn Fn(&Invocation) -> Completion>,
    calls: RefCell<Vec<Invocation>>,
    available: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("recording runner error")]
pub struct RecordingError;

impl RecordingRunner {
    pub fn new(respond: impl Fn(&Invocation) -> Completion + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: RefCell::new(Vec::new()),
            available: Vec::new(),
        }
    }

    /// Programs [`which`](CommandRunner::which) should report as installed.
    pub fn with_available(mut self, programs: &[&str]) -> Self {
        self.available = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Every call rendered as a command line.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::command_line).collect()
    }
}

impl CommandRunner for RecordingRunner {
    type Error = RecordingError;

    fn execute(&self, invocation: &Invocation) -> Result<Completion, RecordingError> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok((self.respond)(invocation))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.available
            .iter()
            .any(|p| p == program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}

/// A notification sink that keeps every notification it was shown.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub shown: Vec<Notification>,
}

#[derive(Debug, thiserror::Error)]
#[error("recording sink error")]
pub struct RecordingSinkError;

impl NotificationSink for RecordingSink {
    type Error = RecordingSinkError;

    fn show(&mut self, notification: &Notification) -> Result<(), RecordingSinkError> {
        self.shown.push(notification.clone());
        Ok(())
    }
}
