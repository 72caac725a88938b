use anyhow::Result;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_ec2 as ec2;
use aws_types::region::Region;
use aws_types::SdkConfig;

use crate::config::Settings;
use crate::types::{InstancePage, InstanceRecord, TagPair, TagRecord};

// Matches the botocore config this agent historically ran with: standard
// retry mode, up to 10 attempts. No application-level retries on top.
const RETRY_MAX_ATTEMPTS: u32 = 10;

pub async fn configure_aws(settings: &Settings) -> SdkConfig {
    let region_provider =
        RegionProviderChain::first_try(settings.region.clone().map(Region::new))
            .or_default_provider();

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .retry_config(RetryConfig::standard().with_max_attempts(RETRY_MAX_ATTEMPTS))
        .load()
        .await
}

/// The three EC2 operations the pipeline consumes. A trait so the pipeline
/// can be driven by the scripted fake in tests and mock mode.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// One page of the fleet, reduced to attachment ids. `next_token`
    /// continues a previous page.
    async fn describe_instances(&self, next_token: Option<String>) -> Result<InstancePage>;

    /// All tags on the given resources. Callers keep `resource_ids` within
    /// the API's 200-value filter limit.
    async fn describe_tags(&self, resource_ids: &[String]) -> Result<Vec<TagRecord>>;

    /// Overwrite-style tag write onto every listed resource.
    async fn create_tags(&self, resource_ids: &[String], tags: &[TagPair]) -> Result<()>;
}

pub struct Ec2TagClient {
    client: ec2::Client,
}

impl Ec2TagClient {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: ec2::Client::new(conf),
        }
    }
}

/// Reduce one SDK instance to its id plus attached volume and interface ids.
/// Block-device mappings without an EBS attachment are dropped, as are
/// instances missing an id.
fn instance_entry(inst: &ec2::types::Instance) -> Option<(String, InstanceRecord)> {
    let instance_id = inst.instance_id()?.to_string();
    let volume_ids = inst
        .block_device_mappings()
        .iter()
        .filter_map(|bdm| bdm.ebs().and_then(|e| e.volume_id()))
        .map(str::to_string)
        .collect();
    let network_interface_ids = inst
        .network_interfaces()
        .iter()
        .filter_map(|ni| ni.network_interface_id())
        .map(str::to_string)
        .collect();
    Some((instance_id, InstanceRecord::new(volume_ids, network_interface_ids)))
}

#[async_trait]
impl Ec2Api for Ec2TagClient {
    async fn describe_instances(&self, next_token: Option<String>) -> Result<InstancePage> {
        let resp = self
            .client
            .describe_instances()
            .set_next_token(next_token)
            .send()
            .await?;

        let instances = resp
            .reservations()
            .iter()
            .flat_map(|res| res.instances())
            .filter_map(instance_entry)
            .collect();

        Ok(InstancePage {
            instances,
            next_token: resp.next_token().map(str::to_string),
        })
    }

    async fn describe_tags(&self, resource_ids: &[String]) -> Result<Vec<TagRecord>> {
        let mut records = Vec::new();
        let mut next: Option<String> = None;
        // DescribeTags caps a response at 1000 results, so follow its token
        // even within a single chunk of ids.
        loop {
            let resp = self
                .client
                .describe_tags()
                .filters(
                    ec2::types::Filter::builder()
                        .name("resource-id")
                        .set_values(Some(resource_ids.to_vec()))
                        .build(),
                )
                .set_next_token(next)
                .send()
                .await?;

            for td in resp.tags() {
                if let (Some(id), Some(key), Some(value)) =
                    (td.resource_id(), td.key(), td.value())
                {
                    records.push(TagRecord {
                        resource_id: id.to_string(),
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
            }

            next = resp.next_token().map(str::to_string);
            if next.is_none() {
                break;
            }
        }
        Ok(records)
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &[TagPair]) -> Result<()> {
        let tags = tags
            .iter()
            .map(|t| {
                ec2::types::Tag::builder()
                    .key(&t.key)
                    .value(&t.value)
                    .build()
            })
            .collect();

        self.client
            .create_tags()
            .set_resources(Some(resource_ids.to_vec()))
            .set_tags(Some(tags))
            .send()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec2::types::{
        EbsInstanceBlockDevice, Instance, InstanceBlockDeviceMapping, InstanceNetworkInterface,
    };

    #[test]
    fn entry_keeps_only_attached_volume_and_interface_ids() {
        let inst = Instance::builder()
            .instance_id("i-1")
            .block_device_mappings(
                InstanceBlockDeviceMapping::builder()
                    .device_name("/dev/xvda")
                    .ebs(EbsInstanceBlockDevice::builder().volume_id("vol-1").build())
                    .build(),
            )
            // ephemeral mapping, no EBS attachment
            .block_device_mappings(
                InstanceBlockDeviceMapping::builder()
                    .device_name("/dev/xvdb")
                    .build(),
            )
            .network_interfaces(
                InstanceNetworkInterface::builder()
                    .network_interface_id("eni-1")
                    .build(),
            )
            .build();

        let (id, record) = instance_entry(&inst).unwrap();
        assert_eq!(id, "i-1");
        assert_eq!(record.volume_ids, vec!["vol-1"]);
        assert_eq!(record.network_interface_ids, vec!["eni-1"]);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn entry_skips_instances_without_an_id() {
        let inst = Instance::builder()
            .network_interfaces(
                InstanceNetworkInterface::builder()
                    .network_interface_id("eni-1")
                    .build(),
            )
            .build();
        assert!(instance_entry(&inst).is_none());
    }

    #[test]
    fn entry_tolerates_bare_instances() {
        let inst = Instance::builder().instance_id("i-bare").build();
        let (_, record) = instance_entry(&inst).unwrap();
        assert!(record.volume_ids.is_empty());
        assert!(record.network_interface_ids.is_empty());
        assert!(record.resource_ids().is_empty());
    }
}
