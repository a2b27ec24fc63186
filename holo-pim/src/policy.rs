//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Route policy tags attached to redistributed multicast routes.
//!
//! A [`PolicyTags`] marks a route for later matching by an export
//! policy's tag-set condition (`holo_utils::policy::TagSet`). Export
//! filters run in the destination protocol, which has no knowledge of
//! the route's origin, so the origin protocol tags the route up front.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PolicyTags {
    tags: BTreeSet<u32>,
}

impl PolicyTags {
    pub fn new() -> PolicyTags {
        PolicyTags::default()
    }

    pub fn from_tags(tags: impl IntoIterator<Item = u32>) -> PolicyTags {
        PolicyTags {
            tags: tags.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.tags.iter().copied()
    }

    // Union the tags from `other` into `self`.
    pub fn insert(&mut self, other: &PolicyTags) {
        self.tags.extend(other.tags.iter());
    }

    // True if at least one tag is shared between the two sets.
    pub fn contains_at_least_one(&self, other: &PolicyTags) -> bool {
        self.tags.intersection(&other.tags).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_insert() {
        let mut a = PolicyTags::from_tags([1, 2]);
        let b = PolicyTags::from_tags([2, 3]);
        a.insert(&b);
        assert_eq!(a, PolicyTags::from_tags([1, 2, 3]));
    }

    #[test]
    fn intersection_test() {
        let a = PolicyTags::from_tags([1, 2]);
        let b = PolicyTags::from_tags([3, 4]);
        assert!(!a.contains_at_least_one(&b));
        let c = PolicyTags::from_tags([2, 5]);
        assert!(a.contains_at_least_one(&c));
    }

    #[test]
    fn empty_set_has_no_intersection() {
        let a = PolicyTags::new();
        let b = PolicyTags::from_tags([1]);
        assert!(!a.contains_at_least_one(&b));
        assert!(a.is_empty());
    }
}
