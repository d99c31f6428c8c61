//! Tag sets and correlation keys
//!
//! Backend objects carry no notion of which cluster, Service or port they
//! belong to. Every object created for a Service is therefore stamped with a
//! fixed set of tags, and later reconciliations find their objects again by
//! matching those tags.

use nsxlb_core::{
    Tag, SCOPE_CLUSTER, SCOPE_IP_POOL_ID, SCOPE_LB_CLASS, SCOPE_OWNER, SCOPE_PORT, SCOPE_SERVICE,
};
use std::collections::BTreeMap;

use crate::helpers::ObjectName;
use crate::mapping::Mapping;

/// Immutable set of tags holding at most one tag per scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeMap<String, Tag>,
}

impl TagSet {
    /// Create an empty tag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new set with the given tags added.
    ///
    /// A tag replaces any existing tag of the same scope. `self` is left as is.
    pub fn add(&self, tags: impl IntoIterator<Item = Tag>) -> TagSet {
        let mut next = self.tags.clone();
        for tag in tags {
            next.insert(tag.scope.clone(), tag);
        }
        TagSet { tags: next }
    }

    /// All tags ordered by scope
    pub fn normalize(&self) -> Vec<Tag> {
        self.tags.values().cloned().collect()
    }

    /// Tag stored for a scope
    pub fn get(&self, scope: &str) -> Option<&Tag> {
        self.tags.get(scope)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over the tags in scope order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        TagSet::new().add(iter)
    }
}

/// Whether every required tag is present in `tags` with the same value.
///
/// Tags in `tags` whose scope is not required are ignored.
pub fn check_tags(tags: &[Tag], required: &[Tag]) -> bool {
    required
        .iter()
        .all(|req| tags.iter().any(|t| t.scope == req.scope && t.value == req.value))
}

/// Value of the first tag with the given scope
pub fn get_tag<'a>(tags: &'a [Tag], scope: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.scope == scope)
        .map(|t| t.value.as_str())
}

pub fn owner_tag(owner: &str) -> Tag {
    Tag::new(SCOPE_OWNER, owner)
}

pub fn cluster_tag(cluster_name: &str) -> Tag {
    Tag::new(SCOPE_CLUSTER, cluster_name)
}

pub fn service_tag(object_name: &ObjectName) -> Tag {
    Tag::new(SCOPE_SERVICE, object_name.to_string())
}

/// Port tag in the form `PROTOCOL/source_port`
pub fn port_tag(mapping: &Mapping) -> Tag {
    Tag::new(
        SCOPE_PORT,
        format!("{}/{}", mapping.protocol, mapping.source_port),
    )
}

pub fn ip_pool_tag(ip_pool_id: &str) -> Tag {
    Tag::new(SCOPE_IP_POOL_ID, ip_pool_id)
}

pub fn class_tag(class_name: &str) -> Tag {
    Tag::new(SCOPE_LB_CLASS, class_name)
}
