//! The buildscript input model: ordered repository and classpath declarations.
//!
//! Mirrors the shape of a Gradle `buildscript {}` block as a TOML document.
//! Array-of-tables syntax keeps declaration order, which the resolver relies
//! on for repository precedence and classpath tie-breaking:
//!
//! ```toml
//! [[repository]]
//! name = "google"
//! url = "https://maven.google.com"
//!
//! [[repository]]
//! name = "jcenter"
//! url = "https://jcenter.bintray.com"
//! deprecated = true
//!
//! [[classpath]]
//! coordinate = "com.android.tools.build:gradle:8.1.0"
//! pin = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use gavel_util::errors::{GavelError, GavelResult};

use crate::coordinate::Coordinate;

/// A parsed buildscript: ordered repositories plus ordered classpath roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buildscript {
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryDecl>,

    #[serde(default, rename = "classpath")]
    pub classpath: Vec<ClasspathDecl>,
}

/// A declared artifact source. Query order is declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDecl {
    pub name: String,
    pub url: String,

    /// Deprecated sources are still queried, but every artifact served from
    /// one is reported through the warnings channel.
    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A root classpath declaration, either shorthand or spelled-out fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClasspathDecl {
    /// `"group:artifact:version[:classifier]"` shorthand.
    #[serde(default)]
    pub coordinate: Option<String>,

    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub artifact: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,

    /// Pinned declarations outrank any transitively discovered version.
    #[serde(default)]
    pub pin: bool,
}

/// A root coordinate together with its declared precedence.
#[derive(Debug, Clone)]
pub struct RootDependency {
    pub coordinate: Coordinate,
    pub pin: bool,
}

impl ClasspathDecl {
    /// Resolve this declaration to a coordinate, validating the fields.
    pub fn to_coordinate(&self) -> Result<Coordinate, GavelError> {
        if let Some(ref short) = self.coordinate {
            return Coordinate::parse(short);
        }
        match (&self.group, &self.artifact, &self.version) {
            (Some(g), Some(a), Some(v)) => Coordinate::new(g, a, v, self.classifier.as_deref()),
            _ => Err(GavelError::MalformedCoordinate {
                input: format!("{self:?}"),
                reason: "declaration needs either `coordinate` or group/artifact/version"
                    .to_string(),
            }),
        }
    }
}

impl Buildscript {
    /// Load and parse a buildscript TOML file.
    pub fn from_path(path: &Path) -> GavelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GavelError::Buildscript {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a buildscript from a TOML string.
    pub fn parse_toml(content: &str) -> GavelResult<Self> {
        toml::from_str(content).map_err(|e| {
            GavelError::Buildscript {
                message: format!("Failed to parse buildscript: {e}"),
            }
            .into()
        })
    }

    /// The declared classpath roots as validated coordinates, in order.
    pub fn root_dependencies(&self) -> GavelResult<Vec<RootDependency>> {
        self.classpath
            .iter()
            .map(|decl| {
                Ok(RootDependency {
                    coordinate: decl.to_coordinate()?,
                    pin: decl.pin,
                })
            })
            .collect()
    }
}
