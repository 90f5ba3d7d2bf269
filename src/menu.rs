//! Entries of the selection menu.

use crate::activator;
use crate::app::{App, AppError};
use crate::config::ManualConfig;
use crate::planner::LayoutOption;
use crate::profile::{Profile, OFF_PROFILE};
use crate::reset::ResetOutcome;
use crate::traits::{CommandRunner, Invocation, ProfileSource};
use log::{info, warn};

/// One selectable row of the menu.
#[derive(Debug, Clone)]
pub enum MenuOption {
    /// A saved or virtual autorandr profile.
    DetectedProfile(Profile),
    /// A layout suggested for the connected outputs.
    PlannedLayout(LayoutOption),
    /// Hand the configuration over to an interactive tool.
    Manual(ManualConfig),
    /// Run the display reset sequence.
    Reset,
}

impl MenuOption {
    /// The row shown in the chooser, in Pango markup.
    pub fn describe(&self) -> String {
        match self {
            MenuOption::DetectedProfile(profile) => profile.describe(),
            MenuOption::PlannedLayout(layout) => layout.describe(),
            MenuOption::Manual(manual) => format!(
                "🔧 \t<b>{}</b>\t<span fgcolor=\"gray\">Manual configuration</span>",
                manual.label
            ),
            MenuOption::Reset => "💊 \t<b><span fgcolor=\"red\">reset display setup</span></b>\t\
                                  <span fgcolor=\"gray\">Try to re-initialize the configuration</span>"
                .to_string(),
        }
    }

    /// Apply this option.
    pub fn activate<R: CommandRunner, P: ProfileSource>(&self, app: &App<'_, R, P>) -> Result<(), AppError> {
        let tools = &app.config().tools;
        match self {
            MenuOption::DetectedProfile(profile) if profile.name == OFF_PROFILE => {
                info!("switching all displays off");
                app.runner().run(&Invocation::from_argv(&tools.dpms_off)?)?;
            }
            MenuOption::DetectedProfile(profile) => {
                info!("loading profile {}", profile.name);
                app.runner()
                    .run(&Invocation::new(tools.autorandr.clone()).arg(profile.name.clone()))?;
            }
            MenuOption::PlannedLayout(layout) => {
                activator::activate(app.runner(), &tools.xrandr, layout)?;
            }
            MenuOption::Manual(manual) => {
                info!("starting {}", manual.label);
                app.runner().run(&Invocation::from_argv(&manual.command)?)?;
            }
            MenuOption::Reset => match app.reset()? {
                ResetOutcome::Completed { layout } => info!("reset complete, activated {}", layout),
                ResetOutcome::NoExternalOutputs { .. } => warn!("reset found no external outputs"),
            },
        }
        Ok(())
    }
}
