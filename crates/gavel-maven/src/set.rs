//! The ordered repository set: declared-order, first-hit-wins lookups.
//!
//! The set is an explicitly constructed, immutable value passed into the
//! resolution call. Query order is declaration order, which makes lookup
//! results deterministic and stable across runs for identical inputs.

use gavel_core::buildscript::RepositoryDecl;
use gavel_util::errors::{GavelError, GavelResult};
use reqwest::Client;

use crate::checksum;
use crate::descriptor::{parse_descriptor, ArtifactDescriptor};
use crate::metadata::{parse_version_listing, VersionListing};
use crate::repository::RepositorySource;

/// An ordered, immutable list of artifact sources.
#[derive(Debug, Clone, Default)]
pub struct RepositorySet {
    sources: Vec<RepositorySource>,
}

/// A successful descriptor lookup, with enough provenance for warnings and
/// payload references.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub descriptor: ArtifactDescriptor,
    /// Name of the source that served the descriptor.
    pub source: String,
    /// Whether that source is flagged deprecated.
    pub deprecated: bool,
    /// URL of the artifact's binary payload at the serving source.
    pub jar_url: String,
    /// SHA-1 of the payload when the source publishes a sidecar.
    pub checksum: Option<String>,
}

impl RepositorySet {
    pub fn new(sources: Vec<RepositorySource>) -> Self {
        Self { sources }
    }

    /// Build a set from ordered buildscript repository declarations.
    pub fn from_decls(decls: &[RepositoryDecl]) -> Self {
        Self::new(decls.iter().map(RepositorySource::from_decl).collect())
    }

    pub fn sources(&self) -> &[RepositorySource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Look up an artifact descriptor, trying sources in declared order.
    ///
    /// A miss at one source (404 or unreachable) falls through to the next;
    /// `Ok(None)` means every source missed.
    pub async fn lookup_descriptor(
        &self,
        client: &Client,
        group: &str,
        artifact: &str,
        version: &str,
        classifier: Option<&str>,
    ) -> GavelResult<Option<LookupOutcome>> {
        let pom_path = RepositorySource::pom_path(group, artifact, version);
        let jar_path = RepositorySource::jar_path(group, artifact, version, classifier);

        for source in &self.sources {
            let Some(xml) = source.get_text(client, &pom_path).await? else {
                tracing::debug!(source = %source.name, "miss for {group}:{artifact}:{version}");
                continue;
            };

            let mut descriptor = parse_descriptor(&xml)?;
            descriptor.resolve_properties();
            let checksum = checksum::fetch_sha1(client, source, &jar_path).await?;

            tracing::debug!(
                source = %source.name,
                deprecated = source.deprecated,
                "resolved {group}:{artifact}:{version}"
            );

            return Ok(Some(LookupOutcome {
                descriptor,
                source: source.name.clone(),
                deprecated: source.deprecated,
                jar_url: source.file_url(&jar_path),
                checksum,
            }));
        }

        Ok(None)
    }

    /// Look up the available-version listing for an artifact, declared order,
    /// first hit wins.
    pub async fn lookup_versions(
        &self,
        client: &Client,
        group: &str,
        artifact: &str,
    ) -> GavelResult<Option<VersionListing>> {
        let path = RepositorySource::metadata_path(group, artifact);
        for source in &self.sources {
            if let Some(xml) = source.get_text(client, &path).await? {
                return Ok(Some(parse_version_listing(&xml)?));
            }
        }
        Ok(None)
    }

    /// Download and checksum-verify an artifact's binary payload.
    ///
    /// Tries sources in declared order, like descriptor lookups.
    pub async fn fetch_artifact(
        &self,
        client: &Client,
        group: &str,
        artifact: &str,
        version: &str,
        classifier: Option<&str>,
    ) -> GavelResult<Vec<u8>> {
        let jar_path = RepositorySource::jar_path(group, artifact, version, classifier);
        for source in &self.sources {
            if let Some(bytes) = source.get_bytes(client, &jar_path).await? {
                checksum::verify(client, source, &jar_path, &bytes).await?;
                return Ok(bytes);
            }
        }
        Err(GavelError::NotFound {
            coordinate: format!("{group}:{artifact}:{version}"),
        }
        .into())
    }
}
