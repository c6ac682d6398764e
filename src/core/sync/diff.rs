// ─── Diff Engine ───
// Pure comparison of desired against observed state. No I/O.

use super::artifact::{Artifact, DesiredState};
use crate::core::cache::ObservedState;

/// Keys that must be fetched, in key order.
///
/// A key is included unless it was observed locally and, when the manifest
/// carries a fingerprint, the observed one is byte-for-byte equal.
/// Local files unknown to the manifest are never touched.
pub fn diff(desired: &DesiredState, observed: &ObservedState) -> Vec<String> {
    stale_artifacts(desired, observed)
        .into_iter()
        .map(|artifact| artifact.key.clone())
        .collect()
}

/// Same selection as [`diff`], returning the artifacts themselves.
pub fn stale_artifacts<'a>(desired: &'a DesiredState, observed: &ObservedState) -> Vec<&'a Artifact> {
    desired
        .iter()
        .filter(|artifact| is_stale(artifact, observed))
        .collect()
}

pub fn is_stale(artifact: &Artifact, observed: &ObservedState) -> bool {
    let Some(local) = observed.get(&artifact.key) else {
        return true;
    };

    match &artifact.fingerprint {
        None => false,
        Some(expected) => local.fingerprint.as_deref() != Some(expected.as_str()),
    }
}
