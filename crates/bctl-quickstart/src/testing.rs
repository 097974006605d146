// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory control plane and cluster used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bctl_bastion_api::{ApiError, KubernetesPolicy, SubjectRef};
use bctl_k8s::{
	Container, Deployment, DeploymentSpec, EnvVar, K8sClient, K8sError, ObjectMeta, Pod, PodSpec,
	PodStatus, PodStream, PodTemplateSpec,
};
use futures::StreamExt;

use crate::error::Result;
use crate::schema::{AgentRecord, AgentRegistry, ManifestSource, PolicyDocument, PolicySchema};

pub fn v2_policy(name: &str) -> KubernetesPolicy {
	KubernetesPolicy {
		id: format!("{name}-id"),
		name: name.to_string(),
		subjects: Vec::new(),
		cluster_users: Vec::new(),
		cluster_groups: Vec::new(),
		extra: Default::default(),
	}
}

pub struct FakeSchema<P> {
	pub policies: Mutex<Vec<P>>,
	pub directory: HashMap<String, SubjectRef>,
	pub writes: AtomicUsize,
	/// Agent listings served one per poll; the last one repeats.
	pub agent_polls: Mutex<VecDeque<Vec<AgentRecord>>>,
	pub list_calls: AtomicUsize,
	pub manifest: String,
}

impl<P> FakeSchema<P> {
	pub fn new(policies: Vec<P>) -> Self {
		Self {
			policies: Mutex::new(policies),
			directory: HashMap::new(),
			writes: AtomicUsize::new(0),
			agent_polls: Mutex::new(VecDeque::new()),
			list_calls: AtomicUsize::new(0),
			manifest: String::new(),
		}
	}

	pub fn with_user(mut self, email: &str, id: &str) -> Self {
		self.directory.insert(email.to_string(), SubjectRef::user(id));
		self
	}

	pub fn with_agent_polls(self, polls: Vec<Vec<AgentRecord>>) -> Self {
		*self.agent_polls.lock().unwrap() = polls.into();
		self
	}

	pub fn with_manifest(mut self, manifest: &str) -> Self {
		self.manifest = manifest.to_string();
		self
	}

	pub fn write_count(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}
}

impl<P: Clone> FakeSchema<P> {
	pub fn policy(&self, index: usize) -> P {
		self.policies.lock().unwrap()[index].clone()
	}
}

pub fn agent(name: &str, status: &str) -> AgentRecord {
	AgentRecord {
		name: name.to_string(),
		status: status.to_string(),
	}
}

#[async_trait]
impl<P> PolicySchema for FakeSchema<P>
where
	P: PolicyDocument + Clone + 'static,
{
	type Policy = P;

	fn label(&self) -> &'static str {
		"fake"
	}

	async fn list_policies(&self) -> Result<Vec<P>> {
		Ok(self.policies.lock().unwrap().clone())
	}

	async fn resolve_subject(&self, email: &str) -> Result<SubjectRef> {
		self.directory.get(email).cloned().ok_or_else(|| {
			ApiError::Status {
				endpoint: format!("subjects/{email}"),
				status: 404,
				body: String::new(),
			}
			.into()
		})
	}

	async fn write_policy(&self, policy: &P) -> Result<()> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		let mut policies = self.policies.lock().unwrap();
		if let Some(slot) = policies.iter_mut().find(|p| p.id() == policy.id()) {
			*slot = policy.clone();
		}
		Ok(())
	}
}

#[async_trait]
impl<P: Send + Sync> AgentRegistry for FakeSchema<P> {
	async fn list_agents(&self) -> Result<Vec<AgentRecord>> {
		self.list_calls.fetch_add(1, Ordering::SeqCst);
		let mut polls = self.agent_polls.lock().unwrap();
		if polls.len() > 1 {
			Ok(polls.pop_front().unwrap_or_default())
		} else {
			Ok(polls.front().cloned().unwrap_or_default())
		}
	}
}

#[async_trait]
impl<P: Send + Sync> ManifestSource for FakeSchema<P> {
	async fn agent_manifest(
		&self,
		_cluster_name: &str,
		_namespace: &str,
		_environment: Option<&str>,
	) -> Result<String> {
		Ok(self.manifest.clone())
	}
}

pub fn env(name: &str, value: &str) -> EnvVar {
	EnvVar {
		name: name.to_string(),
		value: Some(value.to_string()),
		..Default::default()
	}
}

pub fn deployment(name: &str, env: Vec<EnvVar>) -> Deployment {
	Deployment {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			..Default::default()
		},
		spec: Some(DeploymentSpec {
			template: PodTemplateSpec {
				spec: Some(PodSpec {
					containers: vec![
						Container {
							name: "agent".to_string(),
							image: Some("bastionzero/bctl-agent:latest".to_string()),
							env: Some(env),
							..Default::default()
						},
						Container {
							name: "sidecar".to_string(),
							..Default::default()
						},
					],
					..Default::default()
				}),
				..Default::default()
			},
			..Default::default()
		}),
		..Default::default()
	}
}

pub fn pod(name: &str, phase: &str) -> Pod {
	Pod {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			uid: Some(format!("{name}-uid")),
			..Default::default()
		},
		status: Some(PodStatus {
			phase: Some(phase.to_string()),
			..Default::default()
		}),
		..Default::default()
	}
}

#[derive(Default)]
pub struct FakeK8s {
	pub deployments: Mutex<HashMap<String, Deployment>>,
	/// Pods yielded by every watch, after which the stream ends.
	pub pods: Vec<Pod>,
	/// Errors every watch yields before `pods`.
	pub watch_errors: Vec<String>,
	/// When set, the watch never ends after yielding `pods`.
	pub hang_after_pods: bool,
	/// Pods returned by `list_pods`.
	pub existing_pods: Vec<Pod>,
	pub jobs: Mutex<Vec<String>>,
	pub deleted_jobs: Mutex<Vec<(String, String)>>,
	pub patches: Mutex<Vec<Vec<Container>>>,
	pub watches: Mutex<Vec<(String, String)>>,
}

impl FakeK8s {
	pub fn with_deployment(self, deployment: Deployment) -> Self {
		let name = deployment.metadata.name.clone().unwrap_or_default();
		self.deployments.lock().unwrap().insert(name, deployment);
		self
	}

	pub fn with_pods(mut self, pods: Vec<Pod>) -> Self {
		self.pods = pods;
		self
	}

	pub fn with_watch_errors(mut self, messages: &[&str]) -> Self {
		self.watch_errors = messages.iter().map(|m| m.to_string()).collect();
		self
	}

	pub fn with_existing_pods(mut self, pods: Vec<Pod>) -> Self {
		self.existing_pods = pods;
		self
	}

	pub fn with_job(self, name: &str) -> Self {
		self.jobs.lock().unwrap().push(name.to_string());
		self
	}
}

#[async_trait]
impl K8sClient for FakeK8s {
	fn default_namespace(&self) -> &str {
		"default"
	}

	async fn get_deployment(&self, name: &str, _namespace: &str) -> std::result::Result<Deployment, K8sError> {
		self.deployments
			.lock()
			.unwrap()
			.get(name)
			.cloned()
			.ok_or_else(|| K8sError::DeploymentNotFound { name: name.into() })
	}

	async fn patch_deployment_containers(
		&self,
		name: &str,
		_namespace: &str,
		containers: Vec<Container>,
	) -> std::result::Result<Deployment, K8sError> {
		let mut deployments = self.deployments.lock().unwrap();
		let deployment = deployments
			.get_mut(name)
			.ok_or_else(|| K8sError::DeploymentNotFound { name: name.into() })?;
		if let Some(pod_spec) = deployment
			.spec
			.as_mut()
			.and_then(|s| s.template.spec.as_mut())
		{
			pod_spec.containers = containers.clone();
		}
		self.patches.lock().unwrap().push(containers);
		Ok(deployment.clone())
	}

	async fn list_pods(&self, _namespace: &str, _label_selector: &str) -> std::result::Result<Vec<Pod>, K8sError> {
		Ok(self.existing_pods.clone())
	}

	async fn watch_pods(
		&self,
		namespace: &str,
		label_selector: &str,
	) -> std::result::Result<PodStream, K8sError> {
		self.watches
			.lock()
			.unwrap()
			.push((namespace.to_string(), label_selector.to_string()));
		let errors = self
			.watch_errors
			.iter()
			.map(|message| Err(K8sError::StreamError { message: message.clone() }));
		let items: Vec<_> = errors.chain(self.pods.clone().into_iter().map(Ok)).collect();
		let pods = futures::stream::iter(items);
		if self.hang_after_pods {
			Ok(pods.chain(futures::stream::pending()).boxed())
		} else {
			Ok(pods.boxed())
		}
	}

	async fn delete_job(&self, name: &str, namespace: &str) -> std::result::Result<(), K8sError> {
		let mut jobs = self.jobs.lock().unwrap();
		let Some(index) = jobs.iter().position(|j| j == name) else {
			return Err(K8sError::JobNotFound { name: name.into() });
		};
		jobs.remove(index);
		self.deleted_jobs
			.lock()
			.unwrap()
			.push((name.to_string(), namespace.to_string()));
		Ok(())
	}
}
