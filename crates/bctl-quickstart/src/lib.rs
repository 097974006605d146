// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core of the bctl quickstart job.
//!
//! After the agent chart is installed the job:
//! 1. waits for the agent to report `Online` to the control plane
//! 2. merges the requested subjects, target users and target groups into the
//!    cluster's policy
//! 3. optionally copies the generated manifest's env vars onto the agent
//!    deployment and waits for the pod to run
//! 4. optionally deletes its own Job

pub mod cleanup;
pub mod config;
pub mod env_sync;
pub mod error;
pub mod manifest;
pub mod readiness;
pub mod reconciler;
pub mod runner;
pub mod schema;

#[cfg(test)]
mod testing;

pub use cleanup::delete_self;
pub use config::{
	EnvSyncConfig, PolicyAdditions, QuickstartConfig, WaitConfig, DEFAULT_POLL_INTERVAL,
	DEFAULT_TIMEOUT,
};
pub use env_sync::{fetch_agent_env_vars, sync_env_vars, with_first_container_env, EnvSyncTarget};
pub use error::{QuickstartError, Result};
pub use manifest::{agent_env_vars, ManifestError};
pub use readiness::{wait_for_agent_online, wait_for_pod_running};
pub use reconciler::{MergeSummary, PolicyReconciler, ReconcileReport, SkipReason, Skipped, StepOutcome};
pub use runner::{QuickstartRunner, RunSummary};
pub use schema::{
	AgentRecord, AgentRegistry, ManifestSource, PolicyDocument, PolicySchema, V1Schema, V2Schema,
};
