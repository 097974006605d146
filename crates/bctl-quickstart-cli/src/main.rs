// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! bctl quickstart job
//!
//! Runs once inside the cluster after the agent chart is installed. Waits for
//! the agent to register with BastionZero, grants the requested identities
//! access through the cluster's policy and optionally finishes the agent
//! rollout and removes its own Job.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bctl_bastion_api::{ApiVersion, V1Client, V2Client};
use bctl_common_config::{require_secret_env, SecretString};
use bctl_k8s::{K8sClient, KubeClient};
use bctl_quickstart::{
	AgentRegistry, EnvSyncConfig, ManifestSource, PolicyAdditions, PolicySchema, QuickstartConfig,
	QuickstartRunner, RunSummary, V1Schema, V2Schema, WaitConfig,
};

const API_KEY_VAR: &str = "API_KEY";

/// BastionZero agent quickstart
#[derive(Parser, Debug)]
#[command(name = "bctl-quickstart", version, about, long_about = None)]
struct Args {
	/// Control plane API key (falls back to API_KEY_FILE, then API_KEY)
	#[arg(long = "apiKey")]
	api_key: Option<SecretString>,

	/// Name the agent registers under
	#[arg(long = "clusterName", env = "CLUSTER_NAME")]
	cluster_name: String,

	/// Subject emails to add to the cluster policy
	#[arg(long = "users", value_name = "EMAIL", num_args = 1..)]
	users: Vec<String>,

	/// Cluster users the subjects may act as
	#[arg(long = "targetUsers", value_name = "USER", num_args = 1..)]
	target_users: Vec<String>,

	/// Cluster groups the subjects may act as
	#[arg(long = "targetGroups", value_name = "GROUP", num_args = 1..)]
	target_groups: Vec<String>,

	/// Control plane API generation (v1 or v2)
	#[arg(long = "apiVersion", env = "BASTION_API_VERSION", default_value_t = ApiVersion::V2)]
	api_version: ApiVersion,

	/// Control plane URL
	#[arg(long = "serviceUrl", env = "SERVICE_URL")]
	service_url: Option<String>,

	/// Seconds to wait for the agent, and for its pod after an env sync
	#[arg(long, env = "QUICKSTART_TIMEOUT", default_value_t = 300)]
	timeout: u64,

	/// Seconds between agent status polls
	#[arg(long = "pollInterval", default_value_t = 2)]
	poll_interval: u64,

	/// Copy the generated manifest's env vars onto the agent deployment
	#[arg(long = "syncEnvVars")]
	sync_env_vars: bool,

	/// Agent deployment to patch when syncing env vars
	#[arg(long = "deploymentName", env = "DEPLOYMENT_NAME")]
	deployment_name: Option<String>,

	/// Namespace of the agent and this job (defaults to the in-cluster namespace)
	#[arg(long, env = "NAMESPACE")]
	namespace: Option<String>,

	/// Control plane environment the agent joins (v2 only)
	#[arg(long, env = "ENVIRONMENT_NAME")]
	environment: Option<String>,

	/// `app` label of the agent pod (defaults to bctl-<clusterName>-agent)
	#[arg(long = "appLabel")]
	app_label: Option<String>,

	/// Delete this Job once everything succeeded
	#[arg(long = "jobName", env = "JOB_NAME")]
	job_name: Option<String>,

	/// Log level, overridden by RUST_LOG
	#[arg(long = "logLevel", default_value = "info")]
	log_level: String,

	/// Output logs as JSON
	#[arg(long = "jsonLogs")]
	json_logs: bool,
}

impl Args {
	fn quickstart_config(&self) -> Result<QuickstartConfig> {
		let timeout = Duration::from_secs(self.timeout);
		let mut config = QuickstartConfig::new(&self.cluster_name);
		config.additions = PolicyAdditions {
			subjects: self.users.clone(),
			target_users: self.target_users.clone(),
			target_groups: self.target_groups.clone(),
		};
		config.agent_wait = WaitConfig {
			timeout,
			poll_interval: Duration::from_secs(self.poll_interval),
		};
		config.namespace = self.namespace.clone();
		config.job_name = self.job_name.clone();

		if self.sync_env_vars {
			let Some(deployment_name) = &self.deployment_name else {
				bail!("--syncEnvVars requires --deploymentName");
			};
			let mut env_sync = EnvSyncConfig::new(deployment_name);
			env_sync.environment = self.environment.clone();
			env_sync.app_label = self.app_label.clone();
			env_sync.pod_timeout = timeout;
			config.env_sync = Some(env_sync);
		}

		config.validate()?;
		Ok(config)
	}

	fn api_key(&self) -> Result<SecretString> {
		match &self.api_key {
			Some(key) => Ok(key.clone()),
			None => require_secret_env(API_KEY_VAR).context("no API key given"),
		}
	}

	fn service_url(&self) -> String {
		match &self.service_url {
			Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
			_ => bctl_common_config::service_url(),
		}
	}
}

fn init_tracing(level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("bctl={level},kube=warn")));

	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer())
			.init();
	}
}

async fn run<S>(schema: S, config: QuickstartConfig, k8s: Option<Arc<dyn K8sClient>>) -> Result<RunSummary>
where
	S: PolicySchema + AgentRegistry + ManifestSource,
{
	let mut runner = QuickstartRunner::new(schema, config);
	if let Some(k8s) = k8s {
		runner = runner.with_k8s(k8s);
	}
	Ok(runner.run().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(&args.log_level, args.json_logs);

	let config = args.quickstart_config()?;
	let api_key = args.api_key()?;
	let service_url = args.service_url();
	debug!(service_url = %service_url, api = %args.api_version, "Resolved control plane");

	let k8s: Option<Arc<dyn K8sClient>> = if config.needs_k8s() {
		let client = KubeClient::new()
			.await
			.context("failed to create Kubernetes client")?;
		Some(Arc::new(client))
	} else {
		None
	};

	let result = match args.api_version {
		ApiVersion::V1 => {
			let client = V1Client::new(&service_url, api_key)?;
			run(V1Schema::new(client), config, k8s).await
		}
		ApiVersion::V2 => {
			let client = V2Client::new(&service_url, api_key)?;
			run(V2Schema::new(client), config, k8s).await
		}
	};

	match result {
		Ok(summary) => {
			debug!(?summary, "Quickstart summary");
			Ok(())
		}
		Err(e) => {
			error!(error = %e, "Quickstart failed");
			Err(e)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(extra: &[&str]) -> Args {
		let mut argv = vec!["bctl-quickstart", "--clusterName", "prod", "--apiKey", "key"];
		argv.extend_from_slice(extra);
		Args::try_parse_from(argv).unwrap()
	}

	#[test]
	fn camel_case_flags_and_defaults() {
		let args = parse(&[]);
		assert_eq!(args.cluster_name, "prod");
		assert_eq!(args.api_key.as_ref().unwrap().expose(), "key");
		assert_eq!(args.api_version, ApiVersion::V2);
		assert_eq!(args.timeout, 300);
		assert_eq!(args.poll_interval, 2);
		assert!(!args.sync_env_vars);

		let config = args.quickstart_config().unwrap();
		assert!(config.additions.is_empty());
		assert!(!config.needs_k8s());
	}

	#[test]
	fn lists_accept_repeats_and_multiple_values() {
		let args = parse(&[
			"--users",
			"alice@example.com",
			"bob@example.com",
			"--users",
			"carol@example.com",
			"--targetUsers",
			"root",
			"--targetGroups",
			"dev",
			"ops",
		]);
		assert_eq!(
			args.users,
			vec!["alice@example.com", "bob@example.com", "carol@example.com"]
		);
		assert_eq!(args.target_users, vec!["root"]);
		assert_eq!(args.target_groups, vec!["dev", "ops"]);
	}

	#[test]
	fn api_version_accepts_v1() {
		let args = parse(&["--apiVersion", "v1"]);
		assert_eq!(args.api_version, ApiVersion::V1);
		assert!(Args::try_parse_from(["bctl-quickstart", "--clusterName", "p", "--apiVersion", "v3"]).is_err());
	}

	#[test]
	fn env_sync_needs_a_deployment_name() {
		assert!(parse(&["--syncEnvVars"]).quickstart_config().is_err());

		let config = parse(&[
			"--syncEnvVars",
			"--deploymentName",
			"bctl-agent",
			"--environment",
			"Production",
			"--timeout",
			"60",
			"--jobName",
			"bctl-quickstart",
		])
		.quickstart_config()
		.unwrap();
		let env_sync = config.env_sync.as_ref().unwrap();
		assert_eq!(env_sync.deployment_name, "bctl-agent");
		assert_eq!(env_sync.environment.as_deref(), Some("Production"));
		assert_eq!(env_sync.pod_timeout, Duration::from_secs(60));
		assert_eq!(config.agent_wait.timeout, Duration::from_secs(60));
		assert_eq!(config.job_name.as_deref(), Some("bctl-quickstart"));
		assert!(config.needs_k8s());
	}

	#[test]
	fn explicit_service_url_is_normalized() {
		let args = parse(&["--serviceUrl", "https://bz.example.com/"]);
		assert_eq!(args.service_url(), "https://bz.example.com");
	}

	#[test]
	fn api_key_is_redacted_in_debug_output() {
		let args = parse(&[]);
		assert!(!format!("{args:?}").contains("\"key\""));
	}
}
