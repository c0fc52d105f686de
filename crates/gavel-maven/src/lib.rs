//! Maven repository protocol for the Gavel classpath resolver: source
//! configuration and URL layout, artifact descriptor (POM subset) parsing,
//! version-listing metadata, HTTP fetch with retries, checksum sidecar
//! verification, and the ordered repository set queried during resolution.

pub mod checksum;
pub mod descriptor;
pub mod fetch;
pub mod metadata;
pub mod repository;
pub mod set;
