//! **monswitch**: a rofi-driven multi-monitor layout switcher for X11.
//!
//! The connected outputs are read from `xrandr --query`, a short list of
//! sensible layouts is planned for them, and the user picks one from a menu
//! next to the saved autorandr profiles, a manual-configuration entry and a
//! reset sequence for wedged docking stations.
//!
//! # Architecture
//!
//! The crate is organised around three core traits:
//!
//! * [`traits::CommandRunner`]: abstracts starting external programs so
//!   planning and activation are not coupled to real child processes.
//! * [`traits::NotificationSink`]: abstracts the progress notification
//!   updated by the reset sequence.
//! * [`traits::ProfileSource`]: abstracts where saved profile configs are
//!   read from.
//!
//! The pure parts ([`model`], [`matcher`], [`planner`], [`profile`]) never
//! touch the system.  Concrete backends live in [`system`].

pub mod activator;
pub mod app;
pub mod config;
pub mod matcher;
pub mod menu;
pub mod model;
pub mod planner;
pub mod profile;
pub mod reset;
pub mod system;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
