// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands of a
//! pipeline with `tokio::process::Command`, and for stopping them when their
//! run is preempted.
//!
//! - [`process`] owns one live OS process (start / wait / terminate).
//! - [`supervisor`] races a process against preemption.
//! - [`backend`] is the seam the runner uses, with the real process executor.

pub mod backend;
pub mod process;
pub mod supervisor;

pub use backend::{CommandExecutor, ExecuteFuture, ProcessExecutor};
pub use process::ProcessHandle;
pub use supervisor::supervise;
