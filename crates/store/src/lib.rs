//! HTTP access to the metrics document store and the package registry.
//!
//! [`DocStore`] covers the document operations the pipeline needs: fetch a
//! prior document for merging, upsert under a derived id, auto-id inserts
//! and a terms aggregation for the coverage reporter. [`ArchLookup`] asks
//! the registry which architectures a build should have been tested on.
//! Both are traits so the pipeline can run against in-memory fakes.

pub mod client;
pub mod error;
pub mod index;
pub mod registry;

pub use client::{DocStore, HttpDocStore};
pub use error::StoreError;
pub use registry::{ArchLookup, HttpArchLookup, NullArchLookup};
