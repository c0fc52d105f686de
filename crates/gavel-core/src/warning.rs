//! Advisory events emitted during resolution without halting it.

use std::fmt;

/// A non-fatal advisory produced during a resolution pass.
///
/// Warnings are collected and returned to the caller alongside the result;
/// they never abort resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An artifact was served by a source flagged as deprecated.
    DeprecatedSourceUsed { source: String, coordinate: String },

    /// A requested version lost conflict resolution to another candidate.
    VersionOverridden {
        identity: String,
        requested: String,
        selected: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DeprecatedSourceUsed { source, coordinate } => {
                write!(f, "{coordinate} was served by deprecated source `{source}`")
            }
            Warning::VersionOverridden {
                identity,
                requested,
                selected,
                reason,
            } => {
                write!(
                    f,
                    "{identity}: requested {requested} but resolved {selected} ({reason})"
                )
            }
        }
    }
}
