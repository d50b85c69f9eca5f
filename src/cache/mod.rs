//! Incremental build cache for the packages layer
//!
//! Provides content-addressed reuse keyed by the composer.lock hash and the
//! stack identifier.
//!
//! # Decisions
//!
//! | Stored key | Current key | Decision |
//! |------------|-------------|----------|
//! | absent | any | Rebuild |
//! | `(F, E)` | `(F, E)` | Reuse |
//! | `(F, E)` | `(F', E)` | Rebuild |
//! | `(F, E)` | `(F, E')` | Rebuild |
//!
//! A layer is either complete (record written after a successful install)
//! or about to be rebuilt; a reset removes the record before any content
//! is written.

pub mod controller;
pub mod fingerprint;

pub use controller::{decide, keys, layer_types, persist, reset, CacheDecision, CacheKey};
pub use fingerprint::{Calculator, Fingerprint, Sha256Calculator};
