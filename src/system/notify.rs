//! [`NotificationSink`] implementation backed by `notify-send`.
//!
//! The first notification is sent with `--print-id`; the printed id is then
//! passed as `--replace-id` so later updates rewrite the same bubble instead
//! of stacking new ones.

use crate::traits::{CommandRunner, Invocation, Notification, NotificationSink, ToolError};
use log::debug;

/// Sends notifications through `notify-send` via a [`CommandRunner`].
pub struct NotifySend<'a, R: CommandRunner> {
    runner: &'a R,
    program: String,
    id: Option<String>,
}

impl<'a, R: CommandRunner> NotifySend<'a, R> {
    pub fn new(runner: &'a R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            id: None,
        }
    }

    /// The notification id obtained from the first call, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn invocation(&self, n: &Notification) -> Invocation {
        let mut inv = Invocation::new(self.program.clone()).args([
            "--urgency",
            n.urgency.as_str(),
            "--icon",
            n.icon.as_str(),
            "--category",
            "device",
            "--transient",
        ]);
        if let Some(progress) = n.progress {
            inv = inv.arg(format!("--hint=int:value:{}", progress));
        }
        inv = match &self.id {
            None => inv.arg("--print-id").capture(),
            Some(id) => inv.arg(format!("--replace-id={}", id)),
        };
        inv.args([n.summary.as_str(), n.body.as_str()])
    }
}

impl<R: CommandRunner> NotificationSink for NotifySend<'_, R> {
    type Error = ToolError;

    fn show(&mut self, notification: &Notification) -> Result<(), ToolError> {
        let stdout = self.runner.run(&self.invocation(notification))?;
        if self.id.is_none() {
            let id = stdout.trim();
            if id.is_empty() {
                return Err(ToolError::BadOutput {
                    program: self.program.clone(),
                    message: "no notification id printed".into(),
                });
            }
            debug!("notification id {}", id);
            self.id = Some(id.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use crate::traits::{Completion, Urgency};

    #[test]
    fn first_call_prints_id_then_replaces() {
        let runner = RecordingRunner::new(|_| Completion::ok("42\n"));
        let mut sink = NotifySend::new(&runner, "notify-send");

        let mut n = Notification::new("Resetting display configuration");
        n.body = "This will take a few seconds.".into();
        n.progress = Some(0);
        sink.show(&n).unwrap();
        assert_eq!(sink.id(), Some("42"));

        n.body = "Looking for external monitors".into();
        n.progress = Some(10);
        n.urgency = Urgency::Critical;
        sink.show(&n).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].args,
            vec![
                "--urgency",
                "normal",
                "--icon",
                "video-display-symbolic",
                "--category",
                "device",
                "--transient",
                "--hint=int:value:0",
                "--print-id",
                "Resetting display configuration",
                "This will take a few seconds.",
            ]
        );
        assert!(calls[0].capture);
        assert!(calls[1].args.contains(&"--replace-id=42".to_string()));
        assert!(calls[1].args.contains(&"critical".to_string()));
        assert!(!calls[1].args.contains(&"--print-id".to_string()));
    }

    #[test]
    fn progress_hint_is_optional() {
        let runner = RecordingRunner::new(|_| Completion::ok("7"));
        let mut sink = NotifySend::new(&runner, "notify-send");
        sink.show(&Notification::new("hello")).unwrap();
        assert!(!runner.calls()[0].args.iter().any(|a| a.starts_with("--hint")));
    }

    #[test]
    fn missing_id_is_an_error() {
        let runner = RecordingRunner::new(|_| Completion::ok(""));
        let mut sink = NotifySend::new(&runner, "notify-send");
        let err = sink.show(&Notification::new("hello")).unwrap_err();
        assert!(matches!(err, ToolError::BadOutput { .. }));
    }

    #[test]
    fn failures_propagate() {
        let runner = RecordingRunner::new(|_| Completion::failed(1, "no daemon"));
        let mut sink = NotifySend::new(&runner, "notify-send");
        assert!(sink.show(&Notification::new("hello")).is_err());
    }
}
