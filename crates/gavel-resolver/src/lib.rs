//! Classpath resolution engine: turns ordered repository and classpath
//! declarations into a resolved, deduplicated, conflict-free classpath.
//! Highest-version-wins with explicit pins, transitive graph building with
//! cycle detection, and deterministic topological assembly.

pub mod classpath;
pub mod graph;
pub mod resolver;
pub mod select;

pub use classpath::{assemble, Classpath, ClasspathEntry};
pub use resolver::{resolve, resolve_buildscript, Resolution};
