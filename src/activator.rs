//! Reading and applying the live display configuration.
//!
//! A layout goes out as one `xrandr` call so the display server switches
//! all outputs together.  The change is not undone by this module; the menu
//! always offers other layouts and the reset sequence instead.

use crate::model::{parse, Output};
use crate::planner::LayoutOption;
use crate::traits::{CommandRunner, Invocation, ToolError};
use log::{debug, info};

/// Query the current outputs with `xrandr --query`.
///
/// Nothing is cached: every call reflects the hardware as it is now.
pub fn query_outputs<R: CommandRunner>(runner: &R, xrandr: &str) -> Result<Vec<Output>, ToolError> {
    let text = runner.run(&Invocation::new(xrandr).arg("--query").capture())?;
    let outputs = parse(&text);
    debug!("queried {} output(s)", outputs.len());
    Ok(outputs)
}

/// Switch `outputs` off in one `xrandr` call.
pub fn disable<R: CommandRunner>(runner: &R, xrandr: &str, outputs: &[Output]) -> Result<(), ToolError> {
    let mut inv = Invocation::new(xrandr);
    for output in outputs {
        inv = inv.args(["--output", output.name(), "--off"]);
    }
    info!("disabling {} output(s)", outputs.len());
    runner.run(&inv)?;
    Ok(())
}

/// The `xrandr` invocation that activates `layout`.
pub fn layout_invocation(xrandr: &str, layout: &LayoutOption) -> Invocation {
    Invocation::new(xrandr).args(layout.xrandr_args())
}

/// Activate `layout` through `xrandr`.
pub fn activate<R: CommandRunner>(runner: &R, xrandr: &str, layout: &LayoutOption) -> Result<(), ToolError> {
    info!("activating layout {}", layout.title());
    runner.run(&layout_invocation(xrandr, layout))?;
    Ok(())
}
