//! The four-stage tag propagation pipeline: enumerate the fleet, fetch
//! instance tags in concurrent chunks, join the allow-listed tags back onto
//! the instance map, and fan the matched tags out onto each instance's EBS
//! volumes and network interfaces. Strictly linear, one pass per invocation;
//! every stage failure aborts the run.

pub mod apply;
pub mod enumerate;
pub mod fetch;
pub mod merge;

use anyhow::Result;
use tracing::info;

use crate::config::Settings;
use crate::ec2::Ec2Api;

pub async fn run(api: &dyn Ec2Api, settings: &Settings) -> Result<()> {
    let mut instances = enumerate::fetch_all_instances(api).await?;
    info!(instances = instances.len(), "enumerated instance fleet");

    let instance_ids: Vec<String> = instances.keys().cloned().collect();
    let tags = fetch::fetch_instance_tags(
        api,
        &instance_ids,
        settings.chunk_size,
        settings.max_workers,
    )
    .await?;
    info!(tags = tags.len(), "fetched instance tags");

    merge::merge_tags_into_instances(&mut instances, tags, &settings.target_tags);

    apply::create_tags_for_ebs_eni(api, &instances, settings).await
}
