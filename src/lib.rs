//! Vigil — credential vault and detection-job dispatcher for a surveillance console.
//!
//! Holds one symmetric key, seals the operator's notification credentials
//! under it, tracks which detection models are selected, and launches the
//! external detection worker with a fully resolved job.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod files;
pub mod logging;

pub mod credentials;
pub mod keys;
pub mod vault;

pub mod catalog;
pub mod input;
pub mod selection;

pub mod console;
pub mod dispatch;
