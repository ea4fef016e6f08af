//! Core types, aggregation rules and the rating engine for Tally.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::TallyStore`]; everything that mutates a derived counter
//! goes through [`engine::Engine`].

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// trait's return types instead.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod id;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod pair;
pub mod store;
pub mod subject;

pub use engine::Engine;
pub use error::{Error, Result};
pub use memory::MemoryStore;
