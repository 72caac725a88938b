use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::ec2::Ec2Api;
use crate::types::InstanceMap;

/// Fan each instance's merged tags out onto its volumes and interfaces: one
/// CreateTags call per instance, at most `max_workers` in flight. Instances
/// with no dependent resources are skipped (CreateTags needs at least one
/// resource); instances with no matched tags are skipped unless
/// `tag_untagged` asks for the empty overwrite. Every write is awaited
/// before any failure is reported, and the aggregate error names the
/// instances whose writes failed.
pub async fn create_tags_for_ebs_eni(
    api: &dyn Ec2Api,
    instances: &InstanceMap,
    settings: &Settings,
) -> Result<()> {
    let writes = instances.iter().filter_map(|(instance_id, instance)| {
        let resource_ids = instance.resource_ids();
        if resource_ids.is_empty() {
            return None;
        }
        if instance.tags.is_empty() && !settings.tag_untagged {
            return None;
        }
        Some((instance_id.clone(), resource_ids, instance.tags.clone()))
    });

    let mut results = stream::iter(writes.map(|(instance_id, resource_ids, tags)| async move {
        debug!(
            instance = %instance_id,
            resources = resource_ids.len(),
            tags = tags.len(),
            "writing tags to dependent resources"
        );
        let result = api.create_tags(&resource_ids, &tags).await;
        (instance_id, result)
    }))
    .buffer_unordered(settings.max_workers);

    let mut failed = Vec::new();
    let mut tagged = 0usize;
    while let Some((instance_id, result)) = results.next().await {
        match result {
            Ok(()) => tagged += 1,
            Err(e) => {
                warn!(instance = %instance_id, error = %format!("{e:#}"), "tag write failed");
                failed.push(instance_id);
            }
        }
    }

    if failed.is_empty() {
        info!(instances = tagged, "tag writes complete");
        Ok(())
    } else {
        failed.sort();
        Err(anyhow!(
            "tag writes failed for {} instance(s): {}",
            failed.len(),
            failed.join(", ")
        ))
    }
}
