use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for a Gavel resolution pass.
///
/// Every variant is fatal to the pass that produced it: no partial
/// classpath is emitted once any of these surfaces.
#[derive(Debug, Error, Diagnostic)]
pub enum GavelError {
    /// A dependency declaration could not be parsed into coordinates.
    #[error("Malformed coordinate `{input}`: {reason}")]
    #[diagnostic(help("Coordinates use the form group:artifact:version[:classifier]"))]
    MalformedCoordinate { input: String, reason: String },

    /// No configured repository source could supply the artifact.
    #[error("Artifact not found in any repository: {coordinate}")]
    #[diagnostic(help("Check the coordinate spelling and the declared repository list"))]
    NotFound { coordinate: String },

    /// Explicit pins at the same precedence disagree, or no version
    /// satisfies every requested constraint.
    #[error("Unresolvable version conflict for {identity}: {detail}")]
    UnresolvableConflict { identity: String, detail: String },

    /// The dependency graph contains a cycle.
    #[error("Cyclic dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// A reachable node never reached the `Resolved` state. Defensive:
    /// unreachable if the graph builder upheld its contract.
    #[error("Classpath assembly incomplete: {identity} is {state}")]
    AssemblyIncomplete { identity: String, state: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network request failed in a non-recoverable way.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Invalid or malformed buildscript input.
    #[error("Buildscript error: {message}")]
    #[diagnostic(help("Check the buildscript TOML for syntax errors"))]
    Buildscript { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type GavelResult<T> = miette::Result<T>;
