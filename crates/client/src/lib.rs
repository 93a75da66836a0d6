//! Client-side navigation for page-loader.
//!
//! This crate provides the HTTP fetch pipeline, the window abstraction the
//! loader drives, interaction classification, the content swap, and the
//! [`PageLoader`] state machine that ties them together.

pub mod fetch;
pub mod interaction;
pub mod loader;
pub mod swap;
pub mod window;

pub use fetch::{FetchConfig, Fetcher, HttpFetcher};
pub use interaction::{Interaction, InteractionKind, Modifiers};
pub use loader::{NavigationOutcome, PageLoader};
pub use swap::ContentSwapper;
pub use window::{ConnectionInfo, HeadlessWindow, HistoryState, TransitionEnd, TransitionMode, Window};
