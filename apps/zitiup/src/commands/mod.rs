//! Command modules for the zitiup CLI.
//!
//! - [`install`] - Install or upgrade an application
//! - [`latest`] - Show the newest released version of an application

pub mod install;
pub mod latest;
