// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::pin::Pin;

use futures::Stream;

use crate::error::K8sError;

pub use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
pub use k8s_openapi::api::batch::v1::Job;
pub use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, PodSpec, PodStatus, PodTemplateSpec};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Pods matching a watch selector, yielded each time one is added or changes.
///
/// Dropping the stream ends the underlying watch.
pub type PodStream = Pin<Box<dyn Stream<Item = Result<Pod, K8sError>> + Send>>;
