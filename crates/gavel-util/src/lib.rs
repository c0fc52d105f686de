//! Shared utilities for the Gavel classpath resolver.
//!
//! Cross-cutting concerns used by the other Gavel crates: the resolution
//! error taxonomy and hex digest helpers for artifact checksums.

pub mod errors;
pub mod hash;
