// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use bctl_bastion_api::ApiError;
use bctl_k8s::K8sError;
use thiserror::Error;

use crate::manifest::ManifestError;

pub type Result<T> = std::result::Result<T, QuickstartError>;

#[derive(Debug, Error)]
pub enum QuickstartError {
	#[error("control plane error: {0}")]
	Api(#[from] ApiError),

	#[error(transparent)]
	K8s(#[from] K8sError),

	#[error("agent {cluster} never came online within {timeout:?}")]
	AgentNeverOnline { cluster: String, timeout: Duration },

	#[error("no pod labelled app={app_label} reached Running within {timeout:?}")]
	PodNeverRunning { app_label: String, timeout: Duration },

	#[error("deployment {name} not found in namespace {namespace}")]
	DeploymentNotFound { name: String, namespace: String },

	#[error("deployment {name} has no containers")]
	NoContainers { name: String },

	#[error("invalid agent manifest: {0}")]
	Manifest(#[from] ManifestError),

	#[error("environment {name} not found")]
	EnvironmentNotFound { name: String },

	#[error("missing configuration: {field}")]
	MissingConfig { field: &'static str },
}
