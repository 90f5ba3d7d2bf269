//! The orchestrator that ties queries, planning, the chooser and activation
//! together.
//!
//! [`App`] owns nothing but borrowed configuration and a [`CommandRunner`];
//! every call re-reads the display state, so the menu always reflects the
//! hardware as it is at that moment.

use crate::activator;
use crate::config::Config;
use crate::menu::MenuOption;
use crate::model::Output;
use crate::planner::{suggest, PlanError};
use crate::profile::{Profile, VIRTUAL_PROFILES};
use crate::reset::{ResetController, ResetError, ResetOutcome};
use crate::system::notify::NotifySend;
use crate::traits::{CommandRunner, Invocation, ProfileSource, ToolError};
use log::{debug, info, warn};
use std::fmt::Write as _;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("cannot plan layouts: {0}")]
    Plan(#[from] PlanError),
    #[error("display reset failed: {0}")]
    Reset(#[from] ResetError),
}

/// Builds the menu, asks the user and applies the choice.
///
/// Generic over the [`CommandRunner`] and the [`ProfileSource`] so tests can
/// run the whole flow against recorded programs.
pub struct App<'a, R: CommandRunner, P: ProfileSource> {
    runner: &'a R,
    profiles: P,
    config: &'a Config,
}

impl<'a, R: CommandRunner, P: ProfileSource> App<'a, R, P> {
    pub fn new(runner: &'a R, profiles: P, config: &'a Config) -> Self {
        Self {
            runner,
            profiles,
            config,
        }
    }

    pub fn runner(&self) -> &'a R {
        self.runner
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn query_outputs(&self) -> Result<Vec<Output>, AppError> {
        Ok(activator::query_outputs(self.runner, &self.config.tools.xrandr)?)
    }

    /// Saved profiles matching the connected hardware, as reported by
    /// `autorandr --detected`.
    pub fn detected_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let inv = Invocation::new(self.config.tools.autorandr.clone())
            .arg("--detected")
            .capture();
        let stdout = self.runner.run(&inv)?;
        let profiles: Vec<Profile> = stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(|name| Profile::load(name, &self.profiles))
            .collect();
        debug!("detected {} profile(s)", profiles.len());
        Ok(profiles)
    }

    /// All menu options: detected profiles, planned layouts, virtual
    /// profiles, then the manual and reset entries.
    pub fn build_options(&self) -> Result<Vec<MenuOption>, AppError> {
        let outputs = self.query_outputs()?;
        let layouts = suggest(&outputs, self.config.preference.dimensions())?;

        let mut options: Vec<MenuOption> = self
            .detected_profiles()?
            .into_iter()
            .map(MenuOption::DetectedProfile)
            .collect();
        options.extend(layouts.into_iter().map(MenuOption::PlannedLayout));
        options.extend(
            VIRTUAL_PROFILES
                .iter()
                .map(|(name, _)| MenuOption::DetectedProfile(Profile::virtual_profile(name))),
        );
        options.push(MenuOption::Manual(self.config.tools.manual.clone()));
        options.push(MenuOption::Reset);
        Ok(options)
    }

    /// Show `options` in the chooser and return the selected index.
    ///
    /// `None` means the user cancelled, or the chooser printed something
    /// that is not an index.
    pub fn choose(&self, options: &[MenuOption]) -> Result<Option<usize>, AppError> {
        let rows: Vec<String> = options.iter().map(MenuOption::describe).collect();
        let inv = Invocation::from_argv(&self.config.tools.chooser)?.stdin(rows.join("\n"));
        let completion = self
            .runner
            .execute(&inv)
            .map_err(|e| ToolError::Unavailable {
                program: inv.program.clone(),
                message: e.to_string(),
            })?;
        if !completion.success() {
            info!("selection cancelled");
            return Ok(None);
        }
        let answer = completion.stdout.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(index) => Ok(Some(index)),
            Err(_) => {
                warn!("ignoring unexpected chooser output {:?}", answer);
                Ok(None)
            }
        }
    }

    /// Activate the option at `choice`; a missing or out-of-range choice
    /// does nothing.
    pub fn dispatch(&self, options: &[MenuOption], choice: Option<usize>) -> Result<(), AppError> {
        match choice.and_then(|i| options.get(i)) {
            Some(option) => option.activate(self),
            None => {
                debug!("nothing to activate for choice {:?}", choice);
                Ok(())
            }
        }
    }

    /// Build the menu, let the user choose and apply the choice.
    pub fn run_menu(&self) -> Result<(), AppError> {
        let options = self.build_options()?;
        let choice = self.choose(&options)?;
        self.dispatch(&options, choice)
    }

    /// Run the reset sequence with progress shown through `notify-send`.
    pub fn reset(&self) -> Result<ResetOutcome, AppError> {
        let notifier = NotifySend::new(self.runner, self.config.tools.notify_send.clone());
        let mut controller = ResetController::new(
            self.runner,
            notifier,
            &self.config.tools,
            &self.config.reset,
            self.config.preference.dimensions(),
        );
        Ok(controller.run()?)
    }

    /// The outputs and their modes, one line each.
    pub fn list(&self) -> Result<String, AppError> {
        let mut text = String::new();
        for output in self.query_outputs()? {
            let _ = writeln!(text, "{}", output);
            for mode in output.modes() {
                let _ = writeln!(text, "    {}", mode);
            }
        }
        Ok(text)
    }

    /// Show `message` in the error dialog.  Failures are only logged.
    pub fn report_error(&self, message: &str) {
        let inv = match Invocation::from_argv(&self.config.tools.error_dialog) {
            Ok(inv) => inv.arg(message),
            Err(e) => {
                warn!("cannot show error dialog: {}", e);
                return;
            }
        };
        if let Err(e) = self.runner.run(&inv) {
            warn!("cannot show error dialog: {}", e);
        }
    }
}
