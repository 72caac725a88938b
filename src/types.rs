use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Instance fleet keyed by instance id.
pub type InstanceMap = HashMap<String, InstanceRecord>;

/// What we keep of an instance: its dependent resource ids and, after the
/// merge stage, the allow-listed tags to copy onto them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub volume_ids: Vec<String>,
    pub network_interface_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagPair>,
}

impl InstanceRecord {
    pub fn new(volume_ids: Vec<String>, network_interface_ids: Vec<String>) -> Self {
        Self {
            volume_ids,
            network_interface_ids,
            tags: Vec::new(),
        }
    }

    /// Every dependent resource that should receive this instance's tags.
    pub fn resource_ids(&self) -> Vec<String> {
        self.volume_ids
            .iter()
            .chain(&self.network_interface_ids)
            .cloned()
            .collect()
    }
}

/// A key/value pair as written by CreateTags. Kept as a list rather than a
/// map: duplicate keys accumulate and last-write-wins is the API's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPair {
    pub key: String,
    pub value: String,
}

impl TagPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One row from DescribeTags. Lives only between the fetch and merge stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub resource_id: String,
    pub key: String,
    pub value: String,
}

/// One page of DescribeInstances, already reduced to what the pipeline needs.
#[derive(Debug, Default)]
pub struct InstancePage {
    pub instances: Vec<(String, InstanceRecord)>,
    pub next_token: Option<String>,
}
