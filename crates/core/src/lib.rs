//! Core types and shared functionality for page-loader.
//!
//! This crate provides:
//! - The owned document model the loader swaps content in and out of
//! - Visit cache with age-based expiry and tracked-asset fingerprints
//! - Lifecycle signals and the component registry
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;

pub use cache::{TrackedAssets, Visit, VisitCache, VisitSummary};
pub use config::{ConfigError, ElementAttrs, LoaderConfig};
pub use dom::{Document, Element, Link, Node, NodeId};
pub use error::{ContentSide, Error};
pub use events::{Component, Event, EventGateway, Listener, Page, Signal, SignalKind};
