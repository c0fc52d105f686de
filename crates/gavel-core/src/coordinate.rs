//! Dependency coordinates and their identity.
//!
//! A coordinate names a dependency (`group:artifact:version[:classifier]`).
//! Identity deliberately excludes the version: two requests for the same
//! `(group, artifact, classifier)` at different versions are requests for
//! the *same* classpath slot, which is what makes conflicts detectable.

use std::fmt;

use gavel_util::errors::GavelError;

use crate::version::VersionSpec;

/// A parsed dependency declaration. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: VersionSpec,
    pub classifier: Option<String>,
}

/// The conflict-detection identity of a coordinate: everything but the version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub group: String,
    pub artifact: String,
    pub classifier: Option<String>,
}

impl Coordinate {
    /// Parse `"group:artifact:version"` or `"group:artifact:version:classifier"`.
    pub fn parse(input: &str) -> Result<Self, GavelError> {
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(GavelError::MalformedCoordinate {
                input: input.to_string(),
                reason: format!("expected 3 or 4 `:`-separated fields, got {}", parts.len()),
            });
        }
        if parts.iter().take(3).any(|p| p.trim().is_empty()) {
            return Err(GavelError::MalformedCoordinate {
                input: input.to_string(),
                reason: "group, artifact, and version must all be non-empty".to_string(),
            });
        }
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: VersionSpec::parse(parts[2])?,
            classifier: parts.get(3).filter(|c| !c.is_empty()).map(|c| c.to_string()),
        })
    }

    /// Build a coordinate from already-separated fields.
    pub fn new(
        group: &str,
        artifact: &str,
        version: &str,
        classifier: Option<&str>,
    ) -> Result<Self, GavelError> {
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return Err(GavelError::MalformedCoordinate {
                input: format!("{group}:{artifact}:{version}"),
                reason: "group, artifact, and version must all be non-empty".to_string(),
            });
        }
        Ok(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: VersionSpec::parse(version)?,
            classifier: classifier.map(|c| c.to_string()),
        })
    }

    pub fn identity(&self) -> Identity {
        Identity {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

impl Identity {
    /// `group:artifact` key, extended with the classifier when present.
    pub fn key(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}", self.group, self.artifact, c),
            None => format!("{}:{}", self.group, self.artifact),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(ref c) = self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
