use std::fmt;

use crate::core::error::{LauncherError, LauncherResult};

/// A parsed maven coordinate, as found in loader profile `libraries[].name`.
///
/// Accepted shapes:
///   `group:artifact:version`
///   `group:artifact:version:classifier`
/// each optionally suffixed with `@extension`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// Defaults to `jar`.
    pub extension: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let (body, extension) = match coord.rsplit_once('@') {
            Some((body, ext)) if !ext.is_empty() => (body, ext),
            Some(_) => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
            None => (coord, "jar"),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.iter().any(|p| p.is_empty() || p.contains('/') || p.contains('\\')) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    /// `artifact-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.artifact_id, self.version, c, self.extension),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Forward-slash path under `libraries/`:
    /// `<group/as/path>/<artifact>/<version>/<filename>`.
    pub fn relative_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.relative_path())
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_coordinate() {
        let a = MavenArtifact::parse("net.fabricmc:fabric-loader:0.14.21").unwrap();
        assert_eq!(a.group_id, "net.fabricmc");
        assert_eq!(a.artifact_id, "fabric-loader");
        assert_eq!(a.version, "0.14.21");
        assert_eq!(a.classifier, None);
        assert_eq!(a.extension, "jar");
    }

    #[test]
    fn parse_with_classifier_and_extension() {
        let a = MavenArtifact::parse("org.lwjgl:lwjgl:3.2.2:natives-linux@zip").unwrap();
        assert_eq!(a.classifier.as_deref(), Some("natives-linux"));
        assert_eq!(a.filename(), "lwjgl-3.2.2-natives-linux.zip");
        assert_eq!(a.to_string(), "org.lwjgl:lwjgl:3.2.2:natives-linux@zip");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        for bad in ["a:b", "a:b:c:d:e", "a::1.0", "a:b:1.0@", "a/../b:c:1.0"] {
            assert!(
                matches!(
                    MavenArtifact::parse(bad),
                    Err(LauncherError::InvalidMavenCoordinate(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn url_and_relative_path_follow_the_maven_layout() {
        let a = MavenArtifact::parse("net.fabricmc:intermediary:1.16.5").unwrap();
        assert_eq!(
            a.relative_path(),
            "net/fabricmc/intermediary/1.16.5/intermediary-1.16.5.jar"
        );
        assert_eq!(
            a.url("https://maven.fabricmc.net/"),
            "https://maven.fabricmc.net/net/fabricmc/intermediary/1.16.5/intermediary-1.16.5.jar"
        );
    }
}
