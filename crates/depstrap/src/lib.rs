//! depstrap library: CLI definition and the provisioning driver.
//!
//! The binary is a thin shell; everything testable lives here. See
//! [`provision::Provisioner`] for the run loop and [`cli`] for argument
//! parsing and exit-code mapping.

#![warn(missing_docs)]

pub mod cli;
pub mod provision;

pub use depstrap_core::{Error, Result};
