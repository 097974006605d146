// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for both API generations.
//!
//! Policies are read, modified and written back whole, so every policy type
//! keeps the fields it does not model in a flattened map and re-emits them on
//! write.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Agent status reported once the agent has registered.
pub const STATUS_ONLINE: &str = "Online";

/// Subject type assigned to identities resolved through the v1 user lookup.
pub const SUBJECT_TYPE_USER: &str = "User";

/// Labels the control plane stamps on a generated agent:
/// `cluster-name: <cluster>-bzero`.
pub fn agent_labels(cluster_name: &str) -> BTreeMap<String, String> {
	BTreeMap::from([("cluster-name".to_string(), format!("{cluster_name}-bzero"))])
}

/// A policy subject. Identity is the `id`; `type` is carried along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
	pub id: String,
	#[serde(rename = "type")]
	pub subject_type: String,
}

impl SubjectRef {
	pub fn user(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			subject_type: SUBJECT_TYPE_USER.to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterUser {
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGroup {
	pub name: String,
}

// ---------------------------------------------------------------------------
// v1
// ---------------------------------------------------------------------------

/// `POST kube/get-user` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
	pub id: String,
	#[serde(default)]
	pub email: Option<String>,
}

/// `kube/list` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterV1 {
	pub cluster_name: String,
	pub status: String,
}

/// Context map of a v1 policy. Users and groups are keyed by their name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyContextV1 {
	#[serde(default)]
	pub cluster_users: BTreeMap<String, ClusterUser>,
	#[serde(default)]
	pub cluster_groups: BTreeMap<String, ClusterGroup>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Entry of `POST Policy/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyV1 {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub subjects: Vec<SubjectRef>,
	#[serde(default, deserialize_with = "context_object_or_string")]
	pub context: PolicyContextV1,
	#[serde(default)]
	pub metadata: Value,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl PolicyV1 {
	/// Body for `POST Policy/edit`: the context goes over the wire as a JSON
	/// string and `metadata` is sent as `policyMetadata`.
	pub fn to_edit_body(&self) -> Result<Value, serde_json::Error> {
		let mut body = self.extra.clone();
		body.insert("id".into(), Value::String(self.id.clone()));
		body.insert("name".into(), Value::String(self.name.clone()));
		body.insert("subjects".into(), serde_json::to_value(&self.subjects)?);
		body.insert(
			"context".into(),
			Value::String(serde_json::to_string(&self.context)?),
		);
		body.insert("policyMetadata".into(), self.metadata.clone());
		Ok(Value::Object(body))
	}
}

fn context_object_or_string<'de, D>(deserializer: D) -> Result<PolicyContextV1, D::Error>
where
	D: Deserializer<'de>,
{
	match Value::deserialize(deserializer)? {
		Value::Null => Ok(PolicyContextV1::default()),
		Value::String(raw) => serde_json::from_str(&raw).map_err(de::Error::custom),
		other => serde_json::from_value(other).map_err(de::Error::custom),
	}
}

/// `POST kube/get-agent-yaml` request. Field names are PascalCase on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentManifestRequestV1 {
	pub cluster_name: String,
	pub labels: BTreeMap<String, String>,
	pub namespace: String,
}

/// Generated agent manifest as returned by either API generation.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentYaml {
	pub yaml: String,
}

// ---------------------------------------------------------------------------
// v2
// ---------------------------------------------------------------------------

/// `GET subjects/{email}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectSummary {
	pub id: String,
	#[serde(rename = "type")]
	pub subject_type: String,
	#[serde(default)]
	pub email: Option<String>,
}

impl From<SubjectSummary> for SubjectRef {
	fn from(s: SubjectSummary) -> Self {
		SubjectRef {
			id: s.id,
			subject_type: s.subject_type,
		}
	}
}

/// Entry of `GET policies/kubernetes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesPolicy {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub subjects: Vec<SubjectRef>,
	#[serde(default)]
	pub cluster_users: Vec<ClusterUser>,
	#[serde(default)]
	pub cluster_groups: Vec<ClusterGroup>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Entry of `GET targets/kube`.
#[derive(Debug, Clone, Deserialize)]
pub struct KubeTarget {
	#[serde(default)]
	pub id: Option<String>,
	pub name: String,
	pub status: String,
}

/// Entry of `GET environments`.
#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
	pub id: String,
	pub name: String,
}

/// `POST targets/kube` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKubeTargetRequest {
	pub name: String,
	pub namespace: String,
	pub labels: BTreeMap<String, String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment_id: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn agent_labels_suffix_the_cluster_name() {
		let labels = agent_labels("prod");
		assert_eq!(labels.len(), 1);
		assert_eq!(labels["cluster-name"], "prod-bzero");
	}

	#[test]
	fn v1_policy_keeps_unknown_fields_and_edit_body_reshapes_context() {
		let raw = json!({
			"id": "p-1",
			"name": "prod-policy",
			"type": "KubernetesTunnel",
			"subjects": [{"id": "u-1", "type": "User"}],
			"context": {
				"clusterUsers": {"alice": {"name": "alice"}},
				"clusterGroups": {},
				"clusters": {"c-1": {"id": "c-1"}}
			},
			"metadata": {"description": "created by quickstart"}
		});

		let policy: PolicyV1 = serde_json::from_value(raw).unwrap();
		assert_eq!(policy.context.cluster_users.len(), 1);
		assert!(policy.context.extra.contains_key("clusters"));

		let body = policy.to_edit_body().unwrap();
		assert!(body.get("metadata").is_none());
		assert_eq!(
			body["policyMetadata"],
			json!({"description": "created by quickstart"})
		);
		assert_eq!(body["type"], "KubernetesTunnel");

		let context: Value = serde_json::from_str(body["context"].as_str().unwrap()).unwrap();
		assert_eq!(context["clusterUsers"]["alice"]["name"], "alice");
		assert_eq!(context["clusters"]["c-1"]["id"], "c-1");
	}

	#[test]
	fn v1_policy_accepts_string_encoded_context() {
		let raw = json!({
			"id": "p-1",
			"name": "prod-policy",
			"subjects": [],
			"context": "{\"clusterUsers\":{},\"clusterGroups\":{\"dev\":{\"name\":\"dev\"}}}",
			"metadata": {}
		});

		let policy: PolicyV1 = serde_json::from_value(raw).unwrap();
		assert!(policy.context.cluster_groups.contains_key("dev"));
	}

	#[test]
	fn v2_policy_round_trips_untouched_fields() {
		let raw = json!({
			"id": "p-2",
			"name": "prod-policy",
			"description": "kube access",
			"subjects": [{"id": "u-1", "type": "User"}],
			"groups": [],
			"clusters": [{"id": "c-1"}],
			"clusterUsers": [{"name": "alice"}],
			"clusterGroups": [{"name": "dev"}]
		});

		let policy: KubernetesPolicy = serde_json::from_value(raw.clone()).unwrap();
		assert_eq!(serde_json::to_value(&policy).unwrap(), raw);
	}

	#[test]
	fn agent_manifest_request_uses_pascal_case() {
		let req = AgentManifestRequestV1 {
			cluster_name: "prod".into(),
			labels: BTreeMap::from([("cluster-name".to_string(), "prod-bzero".to_string())]),
			namespace: "bastionzero".into(),
		};
		assert_eq!(
			serde_json::to_value(&req).unwrap(),
			json!({
				"ClusterName": "prod",
				"Labels": {"cluster-name": "prod-bzero"},
				"Namespace": "bastionzero"
			})
		);
	}

	#[test]
	fn create_target_request_omits_missing_environment() {
		let req = CreateKubeTargetRequest {
			name: "prod".into(),
			namespace: "bastionzero".into(),
			labels: BTreeMap::new(),
			environment_id: None,
		};
		let value = serde_json::to_value(&req).unwrap();
		assert!(value.get("environmentId").is_none());
	}
}
