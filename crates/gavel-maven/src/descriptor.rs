//! Artifact descriptor parsing: the POM subset classpath resolution needs.
//!
//! Only identity fields, `${property}` interpolation, and the direct
//! dependency list matter here. Build sections, parent chains, licensing,
//! and plugin configuration are downstream concerns and are not parsed.

use std::collections::BTreeMap;

use gavel_util::errors::{GavelError, GavelResult};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parsed artifact metadata returned by a repository lookup.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<DescriptorDependency>,
}

/// A dependency edge declared by a descriptor.
#[derive(Debug, Clone)]
pub struct DescriptorDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
}

impl DescriptorDependency {
    /// Whether this edge belongs on a consumer's classpath.
    ///
    /// Optional dependencies and `test`/`provided`/`system` scopes do not
    /// propagate to dependents.
    pub fn is_transitive(&self) -> bool {
        if self.optional {
            return false;
        }
        !matches!(
            self.scope.as_deref(),
            Some("test") | Some("provided") | Some("system")
        )
    }
}

impl ArtifactDescriptor {
    /// Resolve `${property}` references in a string using descriptor
    /// properties and the built-in project variables.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut iterations = 0;
        while result.contains("${") && iterations < 20 {
            iterations += 1;
            let mut new = String::with_capacity(result.len());
            let mut rest = result.as_str();
            // Substitute what resolves; keep unknown placeholders verbatim
            // and carry on scanning past them.
            while let Some(start) = rest.find("${") {
                let Some(end) = rest[start..].find('}') else {
                    break;
                };
                let key = &rest[start + 2..start + end];
                match self.resolve_property(key) {
                    Some(val) => {
                        new.push_str(&rest[..start]);
                        new.push_str(&val);
                    }
                    None => new.push_str(&rest[..start + end + 1]),
                }
                rest = &rest[start + end + 1..];
            }
            new.push_str(rest);
            if new == result {
                break;
            }
            result = new;
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.group_id.clone(),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.version.clone(),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate property references in all dependency fields.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        for dep in &mut self.dependencies {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            if let Some(ref v) = dep.version {
                dep.version = Some(snapshot.interpolate(v));
            }
        }
    }

    /// The dependency edges that propagate to a consumer's classpath.
    pub fn classpath_dependencies(&self) -> impl Iterator<Item = &DescriptorDependency> {
        self.dependencies.iter().filter(|d| d.is_transitive())
    }
}

/// Parse a descriptor XML string.
pub fn parse_descriptor(xml: &str) -> GavelResult<ArtifactDescriptor> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut descriptor = ArtifactDescriptor::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut current_dep: Option<DescriptorDependency> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                text_buf.clear();

                if path_context(&path) == "project>dependencies>dependency" {
                    current_dep = Some(DescriptorDependency {
                        group_id: String::new(),
                        artifact_id: String::new(),
                        version: None,
                        scope: None,
                        optional: false,
                        classifier: None,
                    });
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path_context(&path);
                let depth = path.len();

                // <project><properties><key>value</key></properties>
                if depth == 3 && path.get(1).map(|s| s.as_str()) == Some("properties") {
                    let prop_name = path.last().cloned().unwrap_or_default();
                    descriptor.properties.insert(prop_name, text_buf.clone());
                }

                if let Some(ref mut dep) = current_dep {
                    match path.last().map(|s| s.as_str()) {
                        Some("groupId") if ctx.ends_with(">dependency>groupId") => {
                            dep.group_id = text_buf.clone();
                        }
                        Some("artifactId") if ctx.ends_with(">dependency>artifactId") => {
                            dep.artifact_id = text_buf.clone();
                        }
                        Some("version") if ctx.ends_with(">dependency>version") => {
                            dep.version = Some(text_buf.clone());
                        }
                        Some("scope") if ctx.ends_with(">dependency>scope") => {
                            dep.scope = Some(text_buf.clone());
                        }
                        Some("optional") if ctx.ends_with(">dependency>optional") => {
                            dep.optional = text_buf.trim() == "true";
                        }
                        Some("classifier") if ctx.ends_with(">dependency>classifier") => {
                            dep.classifier = Some(text_buf.clone());
                        }
                        _ => {}
                    }

                    if ctx == "project>dependencies>dependency" {
                        if let Some(dep) = current_dep.take() {
                            descriptor.dependencies.push(dep);
                        }
                    }
                }

                if depth == 2 {
                    match path.last().map(|s| s.as_str()) {
                        Some("groupId") => descriptor.group_id = Some(text_buf.clone()),
                        Some("artifactId") => descriptor.artifact_id = Some(text_buf.clone()),
                        Some("version") => descriptor.version = Some(text_buf.clone()),
                        Some("packaging") => descriptor.packaging = Some(text_buf.clone()),
                        _ => {}
                    }
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GavelError::Network {
                    message: format!("Failed to parse descriptor XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(descriptor)
}

fn path_context(path: &[String]) -> String {
    path.join(">")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLUGIN_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.android.tools.build</groupId>
    <artifactId>gradle</artifactId>
    <version>8.1.0</version>
    <packaging>jar</packaging>

    <properties>
        <kotlin.version>1.8.10</kotlin.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.jetbrains.kotlin</groupId>
            <artifactId>kotlin-gradle-plugin</artifactId>
            <version>${kotlin.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>opt-in</artifactId>
            <version>1.0</version>
            <optional>true</optional>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_identity_fields() {
        let d = parse_descriptor(PLUGIN_DESCRIPTOR).unwrap();
        assert_eq!(d.group_id.as_deref(), Some("com.android.tools.build"));
        assert_eq!(d.artifact_id.as_deref(), Some("gradle"));
        assert_eq!(d.version.as_deref(), Some("8.1.0"));
        assert_eq!(d.dependencies.len(), 3);
    }

    #[test]
    fn property_interpolation() {
        let mut d = parse_descriptor(PLUGIN_DESCRIPTOR).unwrap();
        d.resolve_properties();
        assert_eq!(d.dependencies[0].version.as_deref(), Some("1.8.10"));
    }

    #[test]
    fn test_and_optional_edges_are_not_transitive() {
        let d = parse_descriptor(PLUGIN_DESCRIPTOR).unwrap();
        let transitive: Vec<&str> = d
            .classpath_dependencies()
            .map(|dep| dep.artifact_id.as_str())
            .collect();
        assert_eq!(transitive, ["kotlin-gradle-plugin"]);
    }

    #[test]
    fn project_variable_interpolation() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>3.0.0</version>
    <dependencies>
        <dependency>
            <groupId>${project.groupId}</groupId>
            <artifactId>sibling</artifactId>
            <version>${project.version}</version>
        </dependency>
    </dependencies>
</project>"#;
        let mut d = parse_descriptor(xml).unwrap();
        d.resolve_properties();
        assert_eq!(d.dependencies[0].group_id, "org.example");
        assert_eq!(d.dependencies[0].version.as_deref(), Some("3.0.0"));
    }

    #[test]
    fn unknown_placeholder_does_not_block_later_ones() {
        let mut d = ArtifactDescriptor::default();
        d.properties
            .insert("kotlin.version".to_string(), "1.8.10".to_string());
        assert_eq!(
            d.interpolate("${unknown}-${kotlin.version}"),
            "${unknown}-1.8.10"
        );
        assert_eq!(d.interpolate("${unknown}"), "${unknown}");
    }

    #[test]
    fn classifier_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <dependencies>
        <dependency>
            <groupId>io.netty</groupId>
            <artifactId>netty-transport-native-epoll</artifactId>
            <version>4.1.100</version>
            <classifier>linux-x86_64</classifier>
        </dependency>
    </dependencies>
</project>"#;
        let d = parse_descriptor(xml).unwrap();
        assert_eq!(d.dependencies[0].classifier.as_deref(), Some("linux-x86_64"));
    }
}
