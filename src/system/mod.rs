//! Concrete backends for the X11 desktop.
//!
//! This module provides the implementations of the
//! [`CommandRunner`](crate::traits::CommandRunner),
//! [`NotificationSink`](crate::traits::NotificationSink) and
//! [`ProfileSource`](crate::traits::ProfileSource) traits that talk to the
//! real system: child processes, `notify-send` and the XDG config
//! directories.
//!
//! Nothing outside this module should spawn processes or read profile files
//! directly.

pub mod notify;
pub mod process;
pub mod profiles;
