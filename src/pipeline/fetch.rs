use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::ec2::Ec2Api;
use crate::types::TagRecord;
use crate::utils::split_into_chunks;

/// Fetch tags for the whole fleet: one DescribeTags call per chunk of ids,
/// at most `max_workers` in flight, results collected in completion order.
/// The downstream join is keyed, so ordering does not matter. The first
/// failed chunk aborts the fetch; in-flight lookups are dropped.
pub async fn fetch_instance_tags(
    api: &dyn Ec2Api,
    instance_ids: &[String],
    chunk_size: usize,
    max_workers: usize,
) -> Result<Vec<TagRecord>> {
    let chunks = split_into_chunks(instance_ids, chunk_size);
    debug!(
        instances = instance_ids.len(),
        chunks = chunks.len(),
        "querying instance tags"
    );

    let mut lookups = stream::iter(
        chunks
            .into_iter()
            .map(|chunk| async move { api.describe_tags(&chunk).await }),
    )
    .buffer_unordered(max_workers);

    // Each worker returns its own chunk's records; the coordinator extends
    // the aggregate serially, so no lock is needed.
    let mut tags = Vec::new();
    while let Some(batch) = lookups.next().await {
        tags.extend(batch?);
    }
    Ok(tags)
}
