// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use bctl_k8s::{K8sClient, K8sError};
use tracing::{info, warn};

use crate::error::Result;

/// Delete the Job running the quickstart. Its pods are left to the garbage
/// collector and the call does not wait for them. A Job that is already gone
/// counts as deleted.
pub async fn delete_self<K: K8sClient + ?Sized>(k8s: &K, job_name: &str, namespace: &str) -> Result<()> {
	match k8s.delete_job(job_name, namespace).await {
		Ok(()) => {
			info!(job = %job_name, namespace = %namespace, "Deleted quickstart job");
			Ok(())
		}
		Err(K8sError::JobNotFound { .. }) => {
			warn!(job = %job_name, namespace = %namespace, "Quickstart job already gone");
			Ok(())
		}
		Err(e) => Err(e.into()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::FakeK8s;

	#[tokio::test]
	async fn deletes_the_named_job() {
		let k8s = FakeK8s::default().with_job("bctl-quickstart");

		delete_self(&k8s, "bctl-quickstart", "bastionzero").await.unwrap();

		assert_eq!(
			*k8s.deleted_jobs.lock().unwrap(),
			vec![("bctl-quickstart".to_string(), "bastionzero".to_string())]
		);
	}

	#[tokio::test]
	async fn missing_job_is_tolerated() {
		let k8s = FakeK8s::default();
		assert!(delete_self(&k8s, "bctl-quickstart", "bastionzero").await.is_ok());
	}
}
