use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::ec2::Ec2Api;
use crate::types::{InstancePage, InstanceRecord, TagPair, TagRecord};

/// Scripted stand-in for the EC2 API. Backs `RETAG_MOCK=true` dry runs and
/// every pipeline test. Page tokens are page indexes rendered as strings.
#[derive(Default)]
pub struct MockEc2 {
    pages: Vec<Vec<(String, InstanceRecord)>>,
    tags: Vec<TagRecord>,
    fail_tag_lookups: bool,
    fail_writes_containing: Option<String>,
    created: Mutex<Vec<(Vec<String>, Vec<TagPair>)>>,
}

impl MockEc2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Vec<(String, InstanceRecord)>) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_tag(mut self, resource_id: &str, key: &str, value: &str) -> Self {
        self.tags.push(TagRecord {
            resource_id: resource_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Make every DescribeTags call fail.
    pub fn failing_tag_lookups(mut self) -> Self {
        self.fail_tag_lookups = true;
        self
    }

    /// Make any CreateTags call touching `resource_id` fail.
    pub fn failing_writes_containing(mut self, resource_id: &str) -> Self {
        self.fail_writes_containing = Some(resource_id.to_string());
        self
    }

    /// Every CreateTags call recorded so far, in completion order.
    pub fn created(&self) -> Vec<(Vec<String>, Vec<TagPair>)> {
        self.created.lock().expect("mock call log poisoned").clone()
    }

    /// A two-instance fleet for dry runs. Pair with `TargetTags=["env"]` to
    /// watch the owner tag get filtered out.
    pub fn sample() -> Self {
        Self::new()
            .with_page(vec![
                (
                    "i-0aaa1111".to_string(),
                    InstanceRecord::new(
                        vec!["vol-0aaa1111".to_string()],
                        vec!["eni-0aaa1111".to_string()],
                    ),
                ),
                (
                    "i-0bbb2222".to_string(),
                    InstanceRecord::new(
                        vec!["vol-0bbb2222".to_string(), "vol-0bbb3333".to_string()],
                        vec!["eni-0bbb2222".to_string()],
                    ),
                ),
            ])
            .with_tag("i-0aaa1111", "env", "prod")
            .with_tag("i-0aaa1111", "owner", "alice")
            .with_tag("i-0bbb2222", "env", "staging")
    }
}

#[async_trait]
impl Ec2Api for MockEc2 {
    async fn describe_instances(&self, next_token: Option<String>) -> Result<InstancePage> {
        let index = match next_token {
            Some(t) => t
                .parse::<usize>()
                .map_err(|_| anyhow!("unknown page token {t:?}"))?,
            None => 0,
        };
        let instances = self.pages.get(index).cloned().unwrap_or_default();
        let next_token = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        Ok(InstancePage {
            instances,
            next_token,
        })
    }

    async fn describe_tags(&self, resource_ids: &[String]) -> Result<Vec<TagRecord>> {
        if self.fail_tag_lookups {
            return Err(anyhow!("DescribeTags refused (scripted failure)"));
        }
        Ok(self
            .tags
            .iter()
            .filter(|t| resource_ids.contains(&t.resource_id))
            .cloned()
            .collect())
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &[TagPair]) -> Result<()> {
        if let Some(poison) = &self.fail_writes_containing {
            if resource_ids.iter().any(|r| r == poison) {
                return Err(anyhow!("CreateTags refused for {poison} (scripted failure)"));
            }
        }
        self.created
            .lock()
            .expect("mock call log poisoned")
            .push((resource_ids.to_vec(), tags.to_vec()));
        Ok(())
    }
}
