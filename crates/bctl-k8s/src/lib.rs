// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for the quickstart job.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - The handful of k8s-openapi types the job touches

mod client;
mod error;
mod kube_client;
mod types;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use kube_client::{background_delete_params, containers_merge_patch, KubeClient};
pub use types::{
	Container, Deployment, DeploymentSpec, EnvVar, Job, ObjectMeta, Pod, PodSpec, PodStatus,
	PodStream, PodTemplateSpec,
};
