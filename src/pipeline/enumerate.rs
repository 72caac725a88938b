use anyhow::Result;
use tracing::debug;

use crate::ec2::Ec2Api;
use crate::types::InstanceMap;

/// Build the fleet map, following continuation tokens until the whole fleet
/// has been seen. Only attachment ids survive; everything else about an
/// instance is discarded at the API seam.
pub async fn fetch_all_instances(api: &dyn Ec2Api) -> Result<InstanceMap> {
    let mut instances = InstanceMap::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = api.describe_instances(next_token).await?;
        debug!(page_instances = page.instances.len(), "collected instance page");
        instances.extend(page.instances);
        next_token = page.next_token;
        if next_token.is_none() {
            break;
        }
    }
    Ok(instances)
}
