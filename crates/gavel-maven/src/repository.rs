//! Repository source configuration: names, URL layout, deprecation flag,
//! credentials, and the backend seam used to serve lookups from memory in
//! tests.

use std::collections::HashMap;
use std::sync::Arc;

use gavel_core::buildscript::RepositoryDecl;
use gavel_util::errors::GavelResult;
use reqwest::{Client, RequestBuilder};

use crate::fetch;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Google's Maven repository.
pub const GOOGLE_MAVEN_URL: &str = "https://maven.google.com";

/// JCenter, sunset in 2021 but still required by some legacy artifacts.
pub const JCENTER_URL: &str = "https://jcenter.bintray.com";

/// Where a source's files actually come from.
///
/// `InMemory` maps repository-relative paths (e.g.
/// `org/example/lib/1.0/lib-1.0.pom`) to file contents, so resolution tests
/// exercise the full lookup path without network access.
#[derive(Debug, Clone)]
pub enum Backend {
    Remote,
    InMemory(Arc<HashMap<String, String>>),
}

/// A configured artifact source. Sources are queried in declaration order;
/// the deprecation flag is first-class so the "still required for older
/// dependencies" compromise stays inspectable instead of living in a comment.
#[derive(Debug, Clone)]
pub struct RepositorySource {
    pub name: String,
    pub url: String,
    pub deprecated: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    backend: Backend,
}

impl RepositorySource {
    /// A remote source at the given base URL.
    pub fn remote(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.trim_end_matches('/').to_string(),
            deprecated: false,
            username: None,
            password: None,
            backend: Backend::Remote,
        }
    }

    /// An in-memory source serving the given relative-path → content map.
    pub fn in_memory(name: &str, files: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            url: format!("memory://{name}"),
            deprecated: false,
            username: None,
            password: None,
            backend: Backend::InMemory(Arc::new(files)),
        }
    }

    /// Google's Maven repository, as declared by `google()`.
    pub fn google() -> Self {
        Self::remote("google", GOOGLE_MAVEN_URL)
    }

    /// Maven Central, as declared by `mavenCentral()`.
    pub fn maven_central() -> Self {
        Self::remote("maven-central", MAVEN_CENTRAL_URL)
    }

    /// JCenter, as declared by `jcenter()`. Deprecated but still queried.
    pub fn jcenter() -> Self {
        Self::remote("jcenter", JCENTER_URL).deprecated(true)
    }

    /// Mark this source as deprecated.
    pub fn deprecated(mut self, flag: bool) -> Self {
        self.deprecated = flag;
        self
    }

    /// Build a source from a buildscript repository declaration.
    pub fn from_decl(decl: &RepositoryDecl) -> Self {
        Self {
            name: decl.name.clone(),
            url: decl.url.trim_end_matches('/').to_string(),
            deprecated: decl.deprecated,
            username: decl.username.clone(),
            password: decl.password.clone(),
            backend: Backend::Remote,
        }
    }

    /// Standard Maven layout path for a coordinate.
    ///
    /// `org.jetbrains.kotlin:kotlin-gradle-plugin:1.8.10` becomes
    /// `org/jetbrains/kotlin/kotlin-gradle-plugin/1.8.10`.
    pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    /// Repository-relative path to the descriptor (POM) file.
    pub fn pom_path(group: &str, artifact: &str, version: &str) -> String {
        format!(
            "{}/{artifact}-{version}.pom",
            Self::coordinate_path(group, artifact, version)
        )
    }

    /// Repository-relative path to the JAR, classifier-aware.
    pub fn jar_path(
        group: &str,
        artifact: &str,
        version: &str,
        classifier: Option<&str>,
    ) -> String {
        let filename = match classifier {
            Some(c) => format!("{artifact}-{version}-{c}.jar"),
            None => format!("{artifact}-{version}.jar"),
        };
        format!(
            "{}/{filename}",
            Self::coordinate_path(group, artifact, version)
        )
    }

    /// Repository-relative path to the artifact-level `maven-metadata.xml`.
    pub fn metadata_path(group: &str, artifact: &str) -> String {
        format!(
            "{}/{}/maven-metadata.xml",
            group.replace('.', "/"),
            artifact
        )
    }

    /// Full URL for a repository-relative path.
    pub fn file_url(&self, relpath: &str) -> String {
        format!("{}/{relpath}", self.url)
    }

    /// Whether this source has credentials configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// Apply this source's credentials to an outgoing request.
    pub fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
            (Some(user), None) => request.basic_auth(user, None::<&str>),
            (None, Some(token)) => request.bearer_auth(token),
            (None, None) => request,
        }
    }

    /// Fetch a text file by repository-relative path. `Ok(None)` means this
    /// source does not have the file.
    pub async fn get_text(&self, client: &Client, relpath: &str) -> GavelResult<Option<String>> {
        match &self.backend {
            Backend::InMemory(files) => Ok(files.get(relpath).cloned()),
            Backend::Remote => {
                let url = self.file_url(relpath);
                fetch::download_text(client, self, &url).await
            }
        }
    }

    /// Fetch a binary file by repository-relative path.
    pub async fn get_bytes(&self, client: &Client, relpath: &str) -> GavelResult<Option<Vec<u8>>> {
        match &self.backend {
            Backend::InMemory(files) => Ok(files.get(relpath).map(|s| s.clone().into_bytes())),
            Backend::Remote => {
                let url = self.file_url(relpath);
                fetch::download_bytes(client, self, &url).await
            }
        }
    }
}
