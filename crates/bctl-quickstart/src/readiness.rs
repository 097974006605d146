// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded waits for the agent to come up.

use std::collections::BTreeSet;
use std::time::Duration;

use bctl_k8s::{K8sClient, Pod};
use futures::StreamExt;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::config::WaitConfig;
use crate::error::{QuickstartError, Result};
use crate::schema::AgentRegistry;

const RUNNING: &str = "Running";

/// Poll the control plane until `cluster_name` is listed as online.
///
/// Listing errors abort the wait immediately.
pub async fn wait_for_agent_online<R: AgentRegistry + ?Sized>(
	registry: &R,
	cluster_name: &str,
	config: &WaitConfig,
) -> Result<()> {
	let start = Instant::now();

	loop {
		let agents = registry.list_agents().await?;
		if agents
			.iter()
			.any(|a| a.name == cluster_name && a.is_online())
		{
			info!(cluster = %cluster_name, elapsed = ?start.elapsed(), "Agent is online");
			return Ok(());
		}

		if start.elapsed() >= config.timeout {
			error!(cluster = %cluster_name, "Agent: {cluster_name} never came online!");
			return Err(QuickstartError::AgentNeverOnline {
				cluster: cluster_name.to_string(),
				timeout: config.timeout,
			});
		}

		info!(cluster = %cluster_name, "Still waiting...");
		sleep(config.poll_interval).await;
	}
}

fn is_running(pod: &Pod, stale_uids: &BTreeSet<String>) -> bool {
	let stale = pod
		.metadata
		.uid
		.as_ref()
		.is_some_and(|uid| stale_uids.contains(uid));
	!stale
		&& pod.metadata.deletion_timestamp.is_none()
		&& pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some(RUNNING)
}

/// Watch pods labelled `app=<app_label>` until one reports phase `Running`.
///
/// Pods whose uid is in `stale_uids` never count, so a rollout can be
/// confirmed by passing the uids of the pods that existed before it.
///
/// The deadline bounds the whole wait. Watch errors are logged and the watch
/// keeps going; a watch that ends first is reported the same way as a
/// timeout.
pub async fn wait_for_pod_running<K: K8sClient + ?Sized>(
	k8s: &K,
	namespace: &str,
	app_label: &str,
	timeout: Duration,
	stale_uids: &BTreeSet<String>,
) -> Result<()> {
	let deadline = Instant::now() + timeout;
	let selector = format!("app={app_label}");
	let mut pods = k8s.watch_pods(namespace, &selector).await?;

	let found = timeout_at(deadline, async {
		while let Some(pod) = pods.next().await {
			let pod = match pod {
				Ok(pod) => pod,
				Err(e) => {
					warn!(
						namespace = %namespace,
						app = %app_label,
						error = %e,
						"Pod watch error, retrying"
					);
					continue;
				}
			};
			debug!(
				pod = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
				phase = pod.status.as_ref().and_then(|s| s.phase.as_deref()).unwrap_or("Unknown"),
				"Pod update"
			);
			if is_running(&pod, stale_uids) {
				return true;
			}
		}
		false
	})
	.await;

	match found {
		Ok(true) => {
			info!(namespace = %namespace, app = %app_label, "Agent pod is running");
			Ok(())
		}
		Ok(false) | Err(_) => {
			error!(namespace = %namespace, app = %app_label, "Agent pod never reached Running");
			Err(QuickstartError::PodNeverRunning {
				app_label: app_label.to_string(),
				timeout,
			})
		}
	}
}
