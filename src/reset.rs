//! Display reset sequence.
//!
//! When a docking station or monitor gets stuck, the reliable fix is to
//! switch the external outputs off, wait, switch them back on with a fresh
//! layout and restart everything that caches the screen geometry.  The
//! sequence is an explicit stage machine driven by [`ResetController::run`]:
//!
//! ```text
//! Idle → [RescanHardware] → QueryOutputs ─┬─ OutputsFound → DisableAll → SuggestLayout
//!                                         │     → ActivateLayout → ReloadSession ─┐
//!                                         └─ NoExternalFound ─────────────────────┤
//!                                                                                 ↓
//!                             Done ← RestartWindowManager ← RestartCompositor ────┘
//! ```
//!
//! Each stage updates a single progress notification.  Any unexpected tool
//! failure aborts the sequence without retrying.

use crate::activator;
use crate::config::{ResetConfig, ToolsConfig};
use crate::model::Output;
use crate::planner::{suggest, LayoutOption, PlanError};
use crate::traits::{CommandRunner, Invocation, Notification, NotificationSink, ToolError, Urgency};
use log::{info, warn};
use std::time::Duration;

/// Stages of the reset sequence, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetStage {
    Idle,
    RescanHardware,
    QueryOutputs,
    NoExternalFound,
    OutputsFound,
    DisableAll,
    SuggestLayout,
    ActivateLayout,
    ReloadSession,
    RestartCompositor,
    RestartWindowManager,
    Done,
}

impl ResetStage {
    /// Progress percentage reported when the stage starts.
    pub fn progress(self) -> u8 {
        match self {
            ResetStage::Idle => 0,
            ResetStage::RescanHardware => 5,
            ResetStage::QueryOutputs => 10,
            ResetStage::OutputsFound => 15,
            ResetStage::DisableAll => 20,
            ResetStage::SuggestLayout => 30,
            ResetStage::ActivateLayout => 40,
            ResetStage::NoExternalFound => 50,
            ResetStage::ReloadSession => 60,
            ResetStage::RestartCompositor => 70,
            ResetStage::RestartWindowManager => 90,
            ResetStage::Done => 100,
        }
    }
}

/// How a reset run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The outputs were re-initialised with a new layout.
    Completed { layout: String },
    /// Nothing but built-in panels is connected; only the session was
    /// restarted.  Carries the message shown to the user.
    NoExternalOutputs { report: String },
}

/// Errors that abort the reset sequence.
#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("cannot plan a new layout: {0}")]
    Plan(#[from] PlanError),
    #[error("no layout to activate")]
    NoLayout,
    #[error("notification error: {0}")]
    Notification(String),
}

/// Drives the reset stages against a [`CommandRunner`] and reports progress
/// to a [`NotificationSink`].
pub struct ResetController<'a, R: CommandRunner, N: NotificationSink> {
    runner: &'a R,
    notifier: N,
    tools: &'a ToolsConfig,
    config: &'a ResetConfig,
    preference: (u32, u32),
    notification: Notification,
    history: Vec<ResetStage>,
    external: Vec<Output>,
    layout: Option<LayoutOption>,
    failure: Option<String>,
}

impl<'a, R: CommandRunner, N: NotificationSink> ResetController<'a, R, N> {
    pub fn new(
        runner: &'a R,
        notifier: N,
        tools: &'a ToolsConfig,
        config: &'a ResetConfig,
        preference: (u32, u32),
    ) -> Self {
        Self {
            runner,
            notifier,
            tools,
            config,
            preference,
            notification: Notification::new("Resetting display configuration"),
            history: Vec::new(),
            external: Vec::new(),
            layout: None,
            failure: None,
        }
    }

    /// Stages entered so far, in order.
    pub fn history(&self) -> &[ResetStage] {
        &self.history
    }

    /// The notification sink, e.g. to inspect what was shown.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run the whole sequence from [`ResetStage::Idle`] to
    /// [`ResetStage::Done`].
    pub fn run(&mut self) -> Result<ResetOutcome, ResetError> {
        let mut stage = ResetStage::Idle;
        loop {
            self.history.push(stage);
            let next = self.enter(stage)?;
            if stage == ResetStage::Done {
                break;
            }
            stage = next;
        }

        Ok(match self.failure.take() {
            Some(report) => ResetOutcome::NoExternalOutputs { report },
            None => ResetOutcome::Completed {
                layout: self
                    .layout
                    .as_ref()
                    .map(LayoutOption::title)
                    .unwrap_or_default(),
            },
        })
    }

    /// Perform `stage` and return the stage that follows it.
    fn enter(&mut self, stage: ResetStage) -> Result<ResetStage, ResetError> {
        info!("reset stage {:?}", stage);
        match stage {
            ResetStage::Idle => {
                self.notify(stage, "This will take a few seconds.")?;
                let rescan = !self.config.rescan.is_empty()
                    && self.runner.which(&self.config.rescan).is_some();
                Ok(if rescan {
                    ResetStage::RescanHardware
                } else {
                    ResetStage::QueryOutputs
                })
            }

            ResetStage::RescanHardware => {
                self.notify(stage, "Rescanning PCI devices")?;
                self.runner.run(&Invocation::new(self.config.rescan.clone()))?;
                settle(self.config.rescan_settle());
                Ok(ResetStage::QueryOutputs)
            }

            ResetStage::QueryOutputs => {
                self.notify(stage, "Looking for external monitors")?;
                let prefix = self.config.builtin_prefix.as_str();
                self.external = activator::query_outputs(self.runner, &self.tools.xrandr)?
                    .into_iter()
                    .filter(|o| o.connected() && !o.name().starts_with(prefix))
                    .collect();
                Ok(if self.external.is_empty() {
                    ResetStage::NoExternalFound
                } else {
                    ResetStage::OutputsFound
                })
            }

            ResetStage::NoExternalFound => {
                let outputs = activator::query_outputs(self.runner, &self.tools.xrandr)?;
                let listing: Vec<String> = outputs.iter().map(ToString::to_string).collect();
                let report = format!(
                    "No external monitors found, cannot reset.\n\n{}",
                    listing.join("\n")
                );
                warn!("{}", report);
                self.notification.urgency = Urgency::Critical;
                self.notify(stage, &report)?;
                self.failure = Some(report);
                Ok(ResetStage::RestartCompositor)
            }

            ResetStage::OutputsFound => {
                let names: Vec<&str> = self.external.iter().map(Output::name).collect();
                let body = format!(
                    "{} external monitors found: {}",
                    names.len(),
                    names.join(", ")
                );
                self.notify(stage, &body)?;
                self.stop_compositor()?;
                Ok(ResetStage::DisableAll)
            }

            ResetStage::DisableAll => {
                let listing: Vec<String> = self.external.iter().map(ToString::to_string).collect();
                self.notify(stage, &format!("Turning off outputs {}", listing.join(", ")))?;
                activator::disable(self.runner, &self.tools.xrandr, &self.external)?;
                settle(self.config.outputs_settle());
                Ok(ResetStage::SuggestLayout)
            }

            ResetStage::SuggestLayout => {
                self.notify(stage, "Planning a new configuration")?;
                let outputs = activator::query_outputs(self.runner, &self.tools.xrandr)?;
                self.layout = suggest(&outputs, self.preference)?.into_iter().next();
                Ok(ResetStage::ActivateLayout)
            }

            ResetStage::ActivateLayout => {
                let layout = self.layout.take().ok_or(ResetError::NoLayout)?;
                self.notify(stage, &format!("Applying new configuration {}", layout.title()))?;
                activator::activate(self.runner, &self.tools.xrandr, &layout)?;
                self.layout = Some(layout);
                settle(self.config.layout_settle());
                Ok(ResetStage::ReloadSession)
            }

            ResetStage::ReloadSession => {
                self.notify(stage, "Reloading window manager configuration")?;
                self.runner.run(&Invocation::from_argv(&self.config.session_reload)?)?;
                Ok(ResetStage::RestartCompositor)
            }

            ResetStage::RestartCompositor => {
                self.notify(stage, "Restarting compositor")?;
                self.stop_compositor()?;
                self.runner.run(&Invocation::from_argv(&self.config.compositor_start)?)?;
                Ok(ResetStage::RestartWindowManager)
            }

            ResetStage::RestartWindowManager => {
                self.notify(stage, "Restarting window manager")?;
                self.runner.run(&Invocation::from_argv(&self.config.wm_restart)?)?;
                settle(self.config.restart_settle());
                Ok(ResetStage::Done)
            }

            ResetStage::Done => {
                let body = match &self.failure {
                    Some(report) => report.clone(),
                    None => "The screens should be fine now.".to_string(),
                };
                self.notify(stage, &body)?;
                Ok(ResetStage::Done)
            }
        }
    }

    /// Stop the compositor; exit status 1 means it was not running.
    fn stop_compositor(&self) -> Result<(), ResetError> {
        let inv = Invocation::from_argv(&self.config.compositor_stop)?;
        self.runner.run_allowing(&inv, &[0, 1])?;
        Ok(())
    }

    fn notify(&mut self, stage: ResetStage, body: &str) -> Result<(), ResetError> {
        self.notification.body = body.to_string();
        self.notification.progress = Some(stage.progress());
        self.notifier
            .show(&self.notification)
            .map_err(|e| ResetError::Notification(e.to_string()))
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingRunner, RecordingSink};
    use crate::traits::Completion;

    const LAPTOP_ONLY: &str = "\
eDP-1 connected primary 1920x1200+0+0 (normal left inverted right x axis y axis) 301mm x 188mm
   1920x1200     60.00*+
HDMI-1 disconnected (normal left inverted right x axis y axis)
";

    const DOCKED: &str = "\
eDP-1 connected primary 1920x1200+0+0 (normal left inverted right x axis y axis) 301mm x 188mm
   1920x1200     60.00*+
DP-3-1 connected 1920x1200+1920+0 (normal left inverted right x axis y axis) 518mm x 324mm
   1920x1200     59.95*+
HDMI-1 disconnected (normal left inverted right x axis y axis)
";

    fn quick_config() -> ResetConfig {
        ResetConfig {
            rescan_settle_ms: 0,
            outputs_settle_ms: 0,
            layout_settle_ms: 0,
            restart_settle_ms: 0,
            ..ResetConfig::default()
        }
    }

    fn xrandr_answering(query: &'static str) -> RecordingRunner {
        RecordingRunner::new(move |inv| {
            if inv.program == "xrandr" && inv.args == ["--query"] {
                Completion::ok(query)
            } else if inv.program == "pkill" {
                // picom not running
                Completion::failed(1, "")
            } else {
                Completion::ok("")
            }
        })
    }

    #[test]
    fn full_reset_sequence() {
        let runner = xrandr_answering(DOCKED).with_available(&["pci-rescan"]);
        let tools = ToolsConfig::default();
        let config = quick_config();
        let mut reset =
            ResetController::new(&runner, RecordingSink::default(), &tools, &config, (1920, 1200));

        let outcome = reset.run().unwrap();
        assert_eq!(
            outcome,
            ResetOutcome::Completed {
                layout: "eDP-1 | DP-3-1".into()
            }
        );
        assert_eq!(
            reset.history(),
            &[
                ResetStage::Idle,
                ResetStage::RescanHardware,
                ResetStage::QueryOutputs,
                ResetStage::OutputsFound,
                ResetStage::DisableAll,
                ResetStage::SuggestLayout,
                ResetStage::ActivateLayout,
                ResetStage::ReloadSession,
                ResetStage::RestartCompositor,
                ResetStage::RestartWindowManager,
                ResetStage::Done,
            ]
        );
        assert_eq!(
            runner.command_lines(),
            vec![
                "pci-rescan",
                "xrandr --query",
                "pkill -f picom",
                "xrandr --output DP-3-1 --off",
                "xrandr --query",
                "xrandr --output eDP-1 --mode 1920x1200 --output DP-3-1 --mode 1920x1200 --right-of eDP-1",
                "qtile cmd-obj -o root -f reload_config",
                "pkill -f picom",
                "picom -b",
                "qtile cmd-obj -o root -f restart",
            ]
        );
        let last = reset.notifier().shown.last().unwrap();
        assert_eq!(last.body, "The screens should be fine now.");
        assert_eq!(last.urgency, Urgency::Normal);
    }

    #[test]
    fn rescan_is_skipped_when_not_installed() {
        let runner = xrandr_answering(DOCKED);
        let tools = ToolsConfig::default();
        let config = quick_config();
        let mut reset =
            ResetController::new(&runner, RecordingSink::default(), &tools, &config, (1920, 1200));
        reset.run().unwrap();
        assert_eq!(reset.history()[1], ResetStage::QueryOutputs);
        assert!(!runner.command_lines().iter().any(|c| c == "pci-rescan"));
    }

    #[test]
    fn no_external_outputs_still_restarts_session() {
        let runner = xrandr_answering(LAPTOP_ONLY);
        let tools = ToolsConfig::default();
        let config = quick_config();
        let mut reset =
            ResetController::new(&runner, RecordingSink::default(), &tools, &config, (1920, 1200));

        let outcome = reset.run().unwrap();
        let report = match outcome {
            ResetOutcome::NoExternalOutputs { report } => report,
            other => panic!("expected NoExternalOutputs, got {:?}", other),
        };
        assert!(report.starts_with("No external monitors found, cannot reset."));
        assert!(report.contains("eDP-1 (1920x1200)"));
        assert!(report.contains("HDMI-1"));

        assert_eq!(
            reset.history(),
            &[
                ResetStage::Idle,
                ResetStage::QueryOutputs,
                ResetStage::NoExternalFound,
                ResetStage::RestartCompositor,
                ResetStage::RestartWindowManager,
                ResetStage::Done,
            ]
        );
        let commands = runner.command_lines();
        assert!(!commands.iter().any(|c| c.contains("--off")));
        assert!(commands.contains(&"picom -b".to_string()));
        assert_eq!(commands.last().unwrap(), "qtile cmd-obj -o root -f restart");

        let last = reset.notifier().shown.last().unwrap();
        assert_eq!(last.urgency, Urgency::Critical);
        assert_eq!(last.body, report);
        assert_eq!(last.progress, Some(100));
    }

    #[test]
    fn progress_never_goes_backwards() {
        for query in [DOCKED, LAPTOP_ONLY] {
            let runner = xrandr_answering(query).with_available(&["pci-rescan"]);
            let tools = ToolsConfig::default();
            let config = quick_config();
            let mut reset =
                ResetController::new(&runner, RecordingSink::default(), &tools, &config, (1920, 1200));
            reset.run().unwrap();

            let progress: Vec<u8> = reset
                .notifier()
                .shown
                .iter()
                .map(|n| n.progress.unwrap())
                .collect();
            assert_eq!(progress.len(), reset.history().len());
            assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
            assert_eq!(progress.first(), Some(&0));
            assert_eq!(progress.last(), Some(&100));
        }
    }

    #[test]
    fn tool_failure_aborts_without_retry() {
        let runner = RecordingRunner::new(|inv| {
            if inv.args == ["--query"] {
                Completion::ok(DOCKED)
            } else if inv.args.contains(&"--off".to_string()) {
                Completion::failed(1, "xrandr: Configure crtc 1 failed")
            } else {
                Completion::ok("")
            }
        });
        let tools = ToolsConfig::default();
        let config = quick_config();
        let mut reset =
            ResetController::new(&runner, RecordingSink::default(), &tools, &config, (1920, 1200));

        let err = reset.run().unwrap_err();
        assert!(matches!(err, ResetError::Tool(ToolError::Failed { .. })));
        assert_eq!(reset.history().last(), Some(&ResetStage::DisableAll));
        let offs = runner
            .command_lines()
            .iter()
            .filter(|c| c.contains("--off"))
            .count();
        assert_eq!(offs, 1);
        assert!(!runner.command_lines().iter().any(|c| c.starts_with("qtile")));
    }

    #[test]
    fn builtin_prefix_is_configurable() {
        let runner = xrandr_answering(DOCKED);
        let tools = ToolsConfig::default();
        let config = ResetConfig {
            builtin_prefix: "DP-3".into(),
            ..quick_config()
        };
        let mut reset =
            ResetController::new(&runner, RecordingSink::default(), &tools, &config, (1920, 1200));
        reset.run().unwrap();
        // eDP-1 is now the only "external" output.
        assert!(runner
            .command_lines()
            .contains(&"xrandr --output eDP-1 --off".to_string()));
    }
}
