//! Core data types for the Gavel classpath resolver: Maven coordinates and
//! identities, version ordering and ranges, the buildscript input model, and
//! advisory warning events.

pub mod buildscript;
pub mod coordinate;
pub mod version;
pub mod warning;
