//! Pod manifest types handed to the orchestration collaborator.
//!
//! Shapes and JSON keys follow the Kubernetes core/v1 Pod API so a manifest
//! can be fed to a real cluster unchanged.

use serde::{Deserialize, Serialize};

pub const POD_KIND: &str = "Pod";
pub const API_VERSION: &str = "v1";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PodManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HostPathVolumeSource {
    pub path: String,
}

impl PodManifest {
    pub fn new(name: impl Into<String>, spec: PodSpec) -> Self {
        PodManifest {
            api_version: API_VERSION.to_string(),
            kind: POD_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: default_namespace(),
            },
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.spec.volumes.iter().find(|v| v.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl Container {
    /// `(host_path, mount_path, read_only)` for every mount of this container
    /// that resolves to a host-path volume of `pod`.
    pub fn host_binds<'a>(&'a self, pod: &'a PodManifest) -> Vec<(&'a str, &'a str, bool)> {
        self.volume_mounts
            .iter()
            .filter_map(|m| {
                let source = pod.volume(&m.name)?.host_path.as_ref()?;
                Some((source.path.as_str(), m.mount_path.as_str(), m.read_only))
            })
            .collect()
    }
}
