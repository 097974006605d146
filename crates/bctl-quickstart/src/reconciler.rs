// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Merges requested identities into the cluster's access policy.
//!
//! Each list is an independent read-modify-write: fetch the policy by name,
//! append what is missing, write the whole document back. Existing entries
//! are never touched or reordered and new ones are appended in input order,
//! so running the same merge twice changes nothing the second time.

use tracing::{info, warn};

use crate::config::PolicyAdditions;
use crate::error::Result;
use crate::schema::{PolicyDocument, PolicySchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// Already present on the policy (or earlier in the same input).
	AlreadyPresent,
	/// The email could not be resolved to a subject.
	Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
	pub item: String,
	pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
	pub added: Vec<String>,
	pub skipped: Vec<Skipped>,
}

impl MergeSummary {
	fn skip(&mut self, item: &str, reason: SkipReason) {
		self.skipped.push(Skipped {
			item: item.to_string(),
			reason,
		});
	}
}

/// Result of one merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
	/// No policy with the expected name exists; nothing was written.
	PolicyNotFound { policy: String },
	/// The policy was written back.
	Updated(MergeSummary),
}

impl StepOutcome {
	pub fn summary(&self) -> Option<&MergeSummary> {
		match self {
			StepOutcome::Updated(summary) => Some(summary),
			StepOutcome::PolicyNotFound { .. } => None,
		}
	}
}

/// Outcome per list; `None` when the list was empty and the step skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	pub subjects: Option<StepOutcome>,
	pub target_users: Option<StepOutcome>,
	pub target_groups: Option<StepOutcome>,
}

pub struct PolicyReconciler<S> {
	schema: S,
	cluster_name: String,
}

impl<S: PolicySchema> PolicyReconciler<S> {
	pub fn new(schema: S, cluster_name: impl Into<String>) -> Self {
		Self {
			schema,
			cluster_name: cluster_name.into(),
		}
	}

	pub fn schema(&self) -> &S {
		&self.schema
	}

	pub fn cluster_name(&self) -> &str {
		&self.cluster_name
	}

	/// Policy the chart created for this cluster.
	pub fn policy_name(&self) -> String {
		format!("{}-policy", self.cluster_name)
	}

	/// Run the three merges in order. A failure aborts the remaining steps
	/// but earlier writes stay in place.
	pub async fn reconcile(&self, additions: &PolicyAdditions) -> Result<ReconcileReport> {
		let mut report = ReconcileReport::default();
		if !additions.subjects.is_empty() {
			report.subjects = Some(self.add_subjects(&additions.subjects).await?);
		}
		if !additions.target_users.is_empty() {
			report.target_users = Some(self.add_target_users(&additions.target_users).await?);
		}
		if !additions.target_groups.is_empty() {
			report.target_groups = Some(self.add_target_groups(&additions.target_groups).await?);
		}
		Ok(report)
	}

	async fn fetch_policy(&self) -> Result<std::result::Result<S::Policy, StepOutcome>> {
		let policy_name = self.policy_name();
		match self.schema.fetch_by_name(&policy_name).await? {
			Some(policy) => Ok(Ok(policy)),
			None => {
				warn!(
					policy = %policy_name,
					api = self.schema.label(),
					"Policy not found, skipping"
				);
				Ok(Err(StepOutcome::PolicyNotFound {
					policy: policy_name,
				}))
			}
		}
	}

	/// Resolve each email and add the subject if its id is not on the policy.
	pub async fn add_subjects(&self, emails: &[String]) -> Result<StepOutcome> {
		let mut policy = match self.fetch_policy().await? {
			Ok(policy) => policy,
			Err(outcome) => return Ok(outcome),
		};

		let mut summary = MergeSummary::default();
		for email in emails {
			let subject = match self.schema.resolve_subject(email).await {
				Ok(subject) => subject,
				Err(e) => {
					warn!(email = %email, error = %e, "Unable to resolve subject, skipping");
					summary.skip(email, SkipReason::Unresolved);
					continue;
				}
			};
			if policy.has_subject(&subject.id) {
				warn!(email = %email, policy = %policy.name(), "Subject already on policy, skipping");
				summary.skip(email, SkipReason::AlreadyPresent);
				continue;
			}
			policy.push_subject(subject);
			summary.added.push(email.clone());
		}

		self.schema.write_policy(&policy).await?;
		info!(policy = %policy.name(), added = summary.added.len(), "Updated policy subjects");
		Ok(StepOutcome::Updated(summary))
	}

	pub async fn add_target_users(&self, names: &[String]) -> Result<StepOutcome> {
		self.add_names(
			"target user",
			names,
			<S::Policy as PolicyDocument>::has_cluster_user,
			<S::Policy as PolicyDocument>::push_cluster_user,
		)
		.await
	}

	pub async fn add_target_groups(&self, names: &[String]) -> Result<StepOutcome> {
		self.add_names(
			"target group",
			names,
			<S::Policy as PolicyDocument>::has_cluster_group,
			<S::Policy as PolicyDocument>::push_cluster_group,
		)
		.await
	}

	async fn add_names(
		&self,
		kind: &'static str,
		names: &[String],
		contains: fn(&S::Policy, &str) -> bool,
		push: fn(&mut S::Policy, &str),
	) -> Result<StepOutcome> {
		let mut policy = match self.fetch_policy().await? {
			Ok(policy) => policy,
			Err(outcome) => return Ok(outcome),
		};

		let mut summary = MergeSummary::default();
		for name in names {
			if contains(&policy, name) {
				warn!(kind, name = %name, policy = %policy.name(), "Already on policy, skipping");
				summary.skip(name, SkipReason::AlreadyPresent);
				continue;
			}
			push(&mut policy, name);
			summary.added.push(name.clone());
		}

		self.schema.write_policy(&policy).await?;
		info!(kind, policy = %policy.name(), added = summary.added.len(), "Updated policy");
		Ok(StepOutcome::Updated(summary))
	}
}
