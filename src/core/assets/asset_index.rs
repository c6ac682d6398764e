use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::cache::{CacheLayout, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::sync::{Artifact, ArtifactSource, DesiredState};

/// Asset index document: logical name -> content-addressed object.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetIndex {
    pub fn parse(source: &str, raw: &[u8]) -> LauncherResult<Self> {
        let index: AssetIndex =
            serde_json::from_slice(raw).map_err(|e| LauncherError::malformed(source, e))?;

        if let Some((name, _)) = index
            .objects
            .iter()
            .find(|(_, obj)| !is_sha1_hex(&obj.hash))
        {
            return Err(LauncherError::malformed(
                source,
                format!("asset {name} has an invalid hash"),
            ));
        }

        Ok(index)
    }

    /// One artifact per distinct object hash under `assets/objects/<2>/<hash>`.
    pub fn desired_state(&self, layout: &CacheLayout, resources_url: &str) -> LauncherResult<DesiredState> {
        let base = resources_url.trim_end_matches('/');
        self.objects
            .iter()
            .map(|(name, obj)| {
                if !is_sha1_hex(&obj.hash) {
                    return Err(LauncherError::malformed(
                        resources_url,
                        format!("asset {name} has an invalid hash"),
                    ));
                }
                let url = format!("{}/{}/{}", base, &obj.hash[..2], obj.hash);
                Artifact::new(
                    CacheLayout::asset_object_key(&obj.hash),
                    layout.root(),
                    ArtifactSource::Url(url),
                )
                .map(|a| {
                    a.with_fingerprint(obj.hash.clone(), HashAlgorithm::Sha1)
                        .with_size(obj.size)
                })
            })
            .collect()
    }
}

fn is_sha1_hex(hash: &str) -> bool {
    hash.len() == HashAlgorithm::Sha1.hex_len() && hash.bytes().all(|b| b.is_ascii_hexdigit())
}
