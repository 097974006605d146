// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use kube::{
	api::{Api, DeleteParams, ListParams, Patch, PatchParams, PropagationPolicy},
	runtime::{watcher, WatchStreamExt},
	Client,
};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{Container, Deployment, Job, Pod, PodStream};

/// Production K8s client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	pub async fn new() -> Result<Self, K8sError> {
		let client = Client::try_default().await?;
		debug!(namespace = %client.default_namespace(), "K8s client initialized");
		Ok(Self { client })
	}

	pub fn from_client(client: Client) -> Self {
		Self { client }
	}
}

/// Merge patch body that swaps a deployment's whole container list.
pub fn containers_merge_patch(containers: &[Container]) -> Value {
	json!({
		"spec": {
			"template": {
				"spec": {
					"containers": containers
				}
			}
		}
	})
}

/// Delete parameters that hand dependent pods to the garbage collector.
pub fn background_delete_params() -> DeleteParams {
	DeleteParams {
		propagation_policy: Some(PropagationPolicy::Background),
		..Default::default()
	}
}

#[async_trait]
impl K8sClient for KubeClient {
	fn default_namespace(&self) -> &str {
		self.client.default_namespace()
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError> {
		let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		match deployments.get(name).await {
			Ok(deployment) => Ok(deployment),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::DeploymentNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self, containers), fields(containers = containers.len()))]
	async fn patch_deployment_containers(
		&self,
		name: &str,
		namespace: &str,
		containers: Vec<Container>,
	) -> Result<Deployment, K8sError> {
		let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		let patch = containers_merge_patch(&containers);
		match deployments
			.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
			.await
		{
			Ok(deployment) => Ok(deployment),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::DeploymentNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let list = pods.list(&ListParams::default().labels(label_selector)).await?;
		Ok(list.items)
	}

	async fn watch_pods(&self, namespace: &str, label_selector: &str) -> Result<PodStream, K8sError> {
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let config = watcher::Config::default().labels(label_selector);
		debug!(namespace = %namespace, label_selector = %label_selector, "Starting pod watch");

		let stream = watcher(pods, config)
			.default_backoff()
			.applied_objects()
			.map_err(|e| K8sError::StreamError {
				message: e.to_string(),
			});
		Ok(stream.boxed())
	}

	async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
		match jobs.delete(name, &background_delete_params()).await {
			Ok(_) => Ok(()),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::JobNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}
}
