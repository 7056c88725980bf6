// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state differ.
//!
//! Records are keyed by their `content` address. A record whose address is
//! still desired is left alone; only the difference is created or deleted.

use std::collections::HashSet;

use crate::types::{DesiredState, DnsRecord};

/// Operations needed to bring the published records in line with the
/// desired address set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDiff {
    /// Addresses with no record yet, in ascending order
    pub to_create: Vec<String>,
    /// Records whose address is no longer desired, in listing order
    pub to_delete: Vec<DnsRecord>,
}

impl RecordDiff {
    /// Nothing to create or delete.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute the minimal create/delete set.
///
/// - `to_delete`: every observed record whose content is not desired. With an
///   empty desired set this is every observed record.
/// - `to_create`: every desired address no observed record carries.
///
/// Two observed records with the same content are treated alike: both are kept
/// or both are deleted. No update is ever emitted.
#[must_use]
pub fn compute_diff(desired: &DesiredState, observed: &[DnsRecord]) -> RecordDiff {
    if desired.is_empty() {
        return RecordDiff {
            to_create: Vec::new(),
            to_delete: observed.to_vec(),
        };
    }

    let published: HashSet<&str> = observed.iter().map(|r| r.content.as_str()).collect();

    let to_delete = observed
        .iter()
        .filter(|record| !desired.contains(&record.content))
        .cloned()
        .collect();

    let to_create = desired
        .iter()
        .filter(|address| !published.contains(address.as_str()))
        .cloned()
        .collect();

    RecordDiff {
        to_create,
        to_delete,
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
