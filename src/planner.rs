//! Layout suggestions for one to three connected outputs.
//!
//! The suggestions are a curated short list for a laptop that is sometimes
//! docked, not a general placement solver: the user picks one from the menu.
//!
//! * one output: its mode closest to the preferred resolution;
//! * two outputs: extend right, extend left, mirror;
//! * three outputs: the docking arrangement (the two external screens side
//!   by side above the laptop panel) and "extend right with the third output
//!   mirroring the second".
//!
//! Each output after the first is matched against the mode chosen for the
//! previous one so the screens end up with similar resolutions.

use crate::matcher::{closest_mode, MatchError};
use crate::model::{Mode, Output, RelationKind};
use std::rc::Rc;

/// Resolution the planner aims for when nothing else is configured.
pub const DEFAULT_PREFERENCE: (u32, u32) = (1920, 1200);

/// Errors from [`suggest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("only 1-3 connected outputs are supported, found {0}")]
    UnsupportedTopology(usize),
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// One selectable arrangement: a mode per output, each non-first mode placed
/// relative to another output.
#[derive(Debug, Clone)]
pub struct LayoutOption {
    modes: Vec<Mode>,
    label: Option<String>,
}

impl LayoutOption {
    /// Build a layout from `modes`.
    ///
    /// Every mode after the first that carries no relation is placed right of
    /// the previous mode's output.
    pub fn new(modes: Vec<Mode>, label: Option<&str>) -> Self {
        let mut placed: Vec<Mode> = Vec::with_capacity(modes.len());
        for mode in modes {
            let mode = match placed.last() {
                Some(prev) if mode.relation().is_none() => {
                    mode.with_relation(RelationKind::RightOf, prev.output())
                }
                _ => mode,
            };
            placed.push(mode);
        }
        Self {
            modes: placed,
            label: label.map(str::to_string),
        }
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The configured label, or the output names joined by `" | "` in
    /// on-screen order.
    pub fn title(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self
                .spatial_order()
                .iter()
                .map(|m| m.output().name.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// `xrandr` arguments that activate the whole layout.
    pub fn xrandr_args(&self) -> Vec<String> {
        self.modes.iter().flat_map(Mode::xrandr_args).collect()
    }

    /// Modes ordered left-to-right / top-to-bottom as far as the relations
    /// tell.
    ///
    /// A mode right of or below its reference goes after it, any other
    /// relation puts it before.  A mode whose reference is not placed yet
    /// goes last.
    pub fn spatial_order(&self) -> Vec<&Mode> {
        let Some((first, rest)) = self.modes.split_first() else {
            return Vec::new();
        };
        let mut ordered = vec![first];
        for mode in rest {
            let Some(rel) = mode.relation() else {
                continue;
            };
            match ordered.iter().position(|m| m.output().name == rel.output.name) {
                Some(idx) => {
                    let idx = match rel.kind {
                        RelationKind::RightOf | RelationKind::Below => idx + 1,
                        _ => idx,
                    };
                    ordered.insert(idx, mode);
                }
                None => ordered.push(mode),
            }
        }
        ordered
    }

    /// One menu row in Pango markup.
    pub fn describe(&self) -> String {
        let details: Vec<String> = self
            .spatial_order()
            .into_iter()
            .map(|mode| {
                let mut detail = format!(
                    r#"<span fgcolor="cyan">{}</span>: {}x{}"#,
                    mode.output().name,
                    mode.width,
                    mode.height
                );
                if let Some(rel) = mode.relation() {
                    detail.push_str(&format!(
                        r#" <span fgcolor="gray">({} {})</span>"#,
                        rel.kind, rel.output.name
                    ));
                }
                detail
            })
            .collect();
        format!("🪄 \t<b>{}</b>\t{}", self.title(), details.join(", "))
    }
}

/// Suggest layouts for the connected outputs in `outputs`.
///
/// Fails with [`PlanError::UnsupportedTopology`] unless one, two or three
/// outputs are connected.
pub fn suggest(outputs: &[Output], preference: (u32, u32)) -> Result<Vec<LayoutOption>, PlanError> {
    let connected: Vec<&Output> = outputs.iter().filter(|o| o.connected()).collect();

    match connected.as_slice() {
        [single] => {
            let mode = closest_mode(single, &preference, false)?;
            Ok(vec![LayoutOption::new(vec![mode], None)])
        }
        [first, second] => {
            let primary = closest_mode(first, &preference, false)?;
            let secondary = closest_mode(second, &primary, false)?;
            let anchor = Rc::clone(primary.output());
            Ok(vec![
                LayoutOption::new(
                    vec![
                        primary.clone(),
                        secondary.with_relation(RelationKind::RightOf, &anchor),
                    ],
                    None,
                ),
                LayoutOption::new(
                    vec![
                        primary.clone(),
                        secondary.with_relation(RelationKind::LeftOf, &anchor),
                    ],
                    None,
                ),
                LayoutOption::new(
                    vec![primary, secondary.with_relation(RelationKind::SameAs, &anchor)],
                    Some("Mirror"),
                ),
            ])
        }
        [first, second, third] => {
            let primary = closest_mode(first, &preference, false)?;
            let secondary = closest_mode(second, &primary, false)?;
            let tertiary = closest_mode(third, &secondary, false)?;
            Ok(vec![
                LayoutOption::new(
                    vec![
                        primary.clone(),
                        secondary.with_relation(RelationKind::RightOf, tertiary.output()),
                        tertiary.with_relation(RelationKind::Above, primary.output()),
                    ],
                    Some("Docking"),
                ),
                LayoutOption::new(
                    vec![
                        primary.clone(),
                        secondary.with_relation(RelationKind::RightOf, primary.output()),
                        tertiary.with_relation(RelationKind::SameAs, secondary.output()),
                    ],
                    None,
                ),
            ])
        }
        other => Err(PlanError::UnsupportedTopology(other.len())),
    }
}
