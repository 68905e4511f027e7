//! Core types for the depstrap dependency provisioner.
//!
//! This crate carries everything the source resolvers and the provisioning
//! orchestrator share:
//!
//! - [`Error`]/[`Result`] - the error taxonomy for the whole workspace
//! - [`platform::PlatformTag`] - host OS/architecture identification
//! - [`pattern::WildcardPattern`] - asset name matching
//! - [`process`] - declared process specs, platform overrides, and the
//!   resolved projection published back into the orchestrator config
//! - [`resolve`] - the `SourceResolver` contract and registry
//! - [`state`] - the persisted dependency state (`deps.json`)

#![warn(missing_docs)]

mod error;

pub mod pattern;
pub mod platform;
pub mod process;
pub mod resolve;
pub mod state;

pub use error::{Error, Result};
