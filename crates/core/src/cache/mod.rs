//! In-memory visit cache and tracked-asset fingerprints.
//!
//! The cache is owned by the loader and keyed by location, so at most one
//! visit exists per location. Entries expire by age only:
//!
//! - Stale entries are pruned at the start of every navigation attempt
//! - Survivors are flagged as cache-served before lookup
//! - Everything is dropped on loader teardown

pub mod assets;
pub mod visit;

pub use assets::TrackedAssets;
pub use visit::{Visit, VisitCache, VisitSummary};
