//! VFD Link Common Library
//!
//! This crate provides the shared types, constants and configuration loading
//! utilities for the VFD spindle link workspace.
//!
//! # Module Structure
//!
//! - [`state`] - Spindle state model
//! - [`config`] - Configuration loading traits and spindle/link config types
//! - [`consts`] - System-wide tuning constants
//! - [`fault`] - Machine-level fault channel and host collaborator traits
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod fault;
pub mod prelude;
pub mod state;
