// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Extraction of the agent's env vars from a generated manifest.

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ManifestError {
	#[error("failed to parse manifest YAML: {0}")]
	Parse(#[from] serde_yaml::Error),

	#[error("manifest contains no Deployment")]
	NoDeployment,

	#[error("manifest Deployment has no containers")]
	NoContainer,
}

/// The first container's env list of the first `Deployment` in a
/// (possibly multi-document) manifest, as ordered `(name, value)` pairs.
///
/// Entries without a literal `value`, such as `valueFrom` references, are
/// skipped.
pub fn agent_env_vars(yaml: &str) -> Result<Vec<(String, String)>, ManifestError> {
	let mut deployment = None;
	for doc in serde_yaml::Deserializer::from_str(yaml) {
		let value = Value::deserialize(doc)?;
		if value.get("kind").and_then(Value::as_str) == Some("Deployment") {
			deployment = Some(value);
			break;
		}
	}
	let deployment = deployment.ok_or(ManifestError::NoDeployment)?;

	let container = deployment
		.get("spec")
		.and_then(|s| s.get("template"))
		.and_then(|t| t.get("spec"))
		.and_then(|s| s.get("containers"))
		.and_then(Value::as_sequence)
		.and_then(|c| c.first())
		.ok_or(ManifestError::NoContainer)?;

	let Some(env) = container.get("env").and_then(Value::as_sequence) else {
		return Ok(Vec::new());
	};

	let mut vars = Vec::with_capacity(env.len());
	for entry in env {
		let Some(name) = entry.get("name").and_then(Value::as_str) else {
			warn!("Manifest env entry without a name, skipping");
			continue;
		};
		match entry.get("value").and_then(scalar_string) {
			Some(value) => vars.push((name.to_string(), value)),
			None => warn!(name = %name, "Manifest env var has no literal value, skipping"),
		}
	}
	Ok(vars)
}

fn scalar_string(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MANIFEST: &str = r#"
apiVersion: v1
kind: ServiceAccount
metadata:
  name: bctl-agent
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bctl-prod-agent
spec:
  template:
    spec:
      containers:
        - name: bctl-agent
          image: bastionzero/bctl-agent:latest
          env:
            - name: SERVICE_URL
              value: https://cloud.bastionzero.com
            - name: ACTIVATION_TOKEN
              value: "tok-123"
            - name: AGENT_PORT
              value: 8080
            - name: NAMESPACE
              valueFrom:
                fieldRef:
                  fieldPath: metadata.namespace
        - name: sidecar
          env:
            - name: IGNORED
              value: "x"
"#;

	#[test]
	fn reads_first_container_of_first_deployment_in_order() {
		let vars = agent_env_vars(MANIFEST).unwrap();
		assert_eq!(
			vars,
			vec![
				("SERVICE_URL".to_string(), "https://cloud.bastionzero.com".to_string()),
				("ACTIVATION_TOKEN".to_string(), "tok-123".to_string()),
				("AGENT_PORT".to_string(), "8080".to_string()),
			]
		);
	}

	#[test]
	fn manifest_without_deployment_is_rejected() {
		let err = agent_env_vars("kind: ServiceAccount\nmetadata:\n  name: a\n").unwrap_err();
		assert!(matches!(err, ManifestError::NoDeployment));
	}

	#[test]
	fn deployment_without_containers_is_rejected() {
		let yaml = "kind: Deployment\nspec:\n  template:\n    spec:\n      containers: []\n";
		assert!(matches!(agent_env_vars(yaml), Err(ManifestError::NoContainer)));
	}

	#[test]
	fn container_without_env_yields_nothing() {
		let yaml = "kind: Deployment\nspec:\n  template:\n    spec:\n      containers:\n        - name: a\n";
		assert!(agent_env_vars(yaml).unwrap().is_empty());
	}

	#[test]
	fn invalid_yaml_is_a_parse_error() {
		assert!(matches!(agent_env_vars("kind: [unclosed"), Err(ManifestError::Parse(_))));
	}
}
