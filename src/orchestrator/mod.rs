//! Application-level orchestration.
//!
//! This module owns the workflow controller (the three client-visible state slices and the
//! backend calls that update them) and the command loop that lets a UI drive it without
//! blocking on network I/O. UI/CLI layers call into this module to keep responsibilities
//! separated.

mod controller;
mod dispatch;

pub(crate) use controller::{IngestOutcome, WorkflowController, INGEST_FAILED};
pub(crate) use dispatch::{run_controller, UiCommand};
