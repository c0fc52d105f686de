//! `maven-metadata.xml` parsing: the per-artifact version listing consulted
//! when a version range has to be pinned to a concrete release.

use gavel_util::errors::{GavelError, GavelResult};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Artifact-level metadata listing the versions a repository can serve.
#[derive(Debug, Clone, Default)]
pub struct VersionListing {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

/// Parse an artifact-level `maven-metadata.xml`.
pub fn parse_version_listing(xml: &str) -> GavelResult<VersionListing> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut listing = VersionListing::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                match path.join(">").as_str() {
                    "metadata>groupId" => listing.group_id = Some(text_buf.clone()),
                    "metadata>artifactId" => listing.artifact_id = Some(text_buf.clone()),
                    "metadata>versioning>latest" => listing.latest = Some(text_buf.clone()),
                    "metadata>versioning>release" => listing.release = Some(text_buf.clone()),
                    "metadata>versioning>versions>version" => {
                        listing.versions.push(text_buf.clone());
                    }
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GavelError::Network {
                    message: format!("Failed to parse maven-metadata.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_list() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>org.jetbrains.kotlin</groupId>
  <artifactId>kotlin-gradle-plugin</artifactId>
  <versioning>
    <latest>1.8.10</latest>
    <release>1.8.10</release>
    <versions>
      <version>1.7.0</version>
      <version>1.7.21</version>
      <version>1.8.0</version>
      <version>1.8.10</version>
    </versions>
    <lastUpdated>20230201120000</lastUpdated>
  </versioning>
</metadata>"#;
        let listing = parse_version_listing(xml).unwrap();
        assert_eq!(listing.group_id.as_deref(), Some("org.jetbrains.kotlin"));
        assert_eq!(listing.release.as_deref(), Some("1.8.10"));
        assert_eq!(listing.versions.len(), 4);
        assert_eq!(listing.versions[0], "1.7.0");
    }

    #[test]
    fn empty_metadata() {
        let listing = parse_version_listing("<metadata></metadata>").unwrap();
        assert!(listing.versions.is_empty());
        assert!(listing.latest.is_none());
    }
}
