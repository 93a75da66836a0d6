//! Tracked-asset fingerprints.
//!
//! Elements carrying the track marker (usually scripts and stylesheets) are
//! collected by URL. A destination whose list differs from the session's
//! baseline was built from another deployment and cannot be swapped in.

use sha2::{Digest, Sha256};
use url::Url;

use crate::dom::Document;

/// Ordered list of tracked asset URLs from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedAssets(Vec<String>);

impl TrackedAssets {
    /// Collect `src` (else `href`) of every element with `track_attr`,
    /// resolved against `base`.
    pub fn from_document(document: &Document, track_attr: &str, base: &Url) -> Self {
        let assets = document
            .query_all(|el| el.has_attr(track_attr))
            .into_iter()
            .map(|el| {
                let raw = el
                    .attr("src")
                    .filter(|s| !s.is_empty())
                    .or_else(|| el.attr("href"))
                    .unwrap_or("");
                match base.join(raw) {
                    Ok(url) if !raw.is_empty() => url.to_string(),
                    _ => raw.to_string(),
                }
            })
            .collect();
        Self(assets)
    }

    /// True if `newer` has a different count, or holds any asset this
    /// baseline lacks.
    pub fn has_changed(&self, newer: &TrackedAssets) -> bool {
        newer.0.len() != self.0.len() || newer.0.iter().any(|asset| !self.0.contains(asset))
    }

    /// SHA-256 over the ordered list, hex-encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for asset in &self.0 {
            hasher.update(asset.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
