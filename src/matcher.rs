//! Nearest-mode lookup.
//!
//! Distances are rectilinear (`|Δw| + |Δh|`).  Among equally close modes the
//! one listed first by the query wins, which in practice favours the active
//! and preferred modes `xrandr` lists at the top.

use crate::model::{Dimensions, Mode, ModelError, Output};

/// Errors from [`closest_mode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The output has no candidate modes (after filtering).
    #[error("no modes available on output {0}")]
    NoModesAvailable(String),
    /// Square-pixel filtering was requested for an output of unknown size.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Return a copy of the mode on `output` closest to `target`.
///
/// With `square_only`, modes whose horizontal and vertical DPI differ by a
/// pixel per inch or more are skipped.  That needs the output's physical
/// size; without it the call fails with [`ModelError::MissingPhysicalSize`].
pub fn closest_mode(
    output: &Output,
    target: &impl Dimensions,
    square_only: bool,
) -> Result<Mode, MatchError> {
    if square_only && output.physical_size().is_none() {
        return Err(ModelError::MissingPhysicalSize(output.name().to_string()).into());
    }

    let mut candidates = Vec::with_capacity(output.modes().len());
    for mode in output.modes() {
        if square_only && !mode.is_square()? {
            continue;
        }
        candidates.push(mode);
    }

    candidates
        .into_iter()
        .min_by_key(|mode| mode.distance(target))
        .cloned()
        .ok_or_else(|| MatchError::NoModesAvailable(output.name().to_string()))
}
