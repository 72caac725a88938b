use std::collections::HashSet;

use crate::types::{InstanceMap, TagPair, TagRecord};

/// Join fetched tag records onto the instance map, in place. A record lands
/// only when its resource id is a known instance and its key is in the
/// allow-list; anything else is filtering, not an error. Duplicate keys
/// accumulate — CreateTags decides what a duplicate means.
pub fn merge_tags_into_instances(
    instances: &mut InstanceMap,
    tags: Vec<TagRecord>,
    target_tags: &HashSet<String>,
) {
    for tag in tags {
        if !target_tags.contains(&tag.key) {
            continue;
        }
        if let Some(instance) = instances.get_mut(&tag.resource_id) {
            instance.tags.push(TagPair::new(tag.key, tag.value));
        }
    }
}
