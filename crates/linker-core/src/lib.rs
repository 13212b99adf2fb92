//! Core types and the study lookup layer for the PACS study linker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::StudyRegistry`]; the HTTP layer drives
//! [`lookup::LookupService`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod lookup;
pub mod memory;
pub mod store;
pub mod study;
pub mod worklist;

pub use error::{BoxError, LookupError, MemoryError, Result};
pub use lookup::{LookupService, ViewerConfig};
pub use store::{RegistryFault, StudyRegistry};
