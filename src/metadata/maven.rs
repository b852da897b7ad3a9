use std::{fmt, path::PathBuf};

/// Parsed `group:artifact:version[:classifier][@ext]` library name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    pub fn parse(name: &str) -> crate::Result<Self> {
        let (name_part, extension) = match name.rsplit_once('@') {
            Some((name_part, ext)) => (name_part, ext),
            None => (name, "jar"),
        };
        let invalid = || crate::Error::InvalidLibraryName(name.to_owned());
        let mut parts = name_part.split(':');
        let group = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let artifact = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let version = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let classifier = parts.next().map(str::to_owned);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self {
            group: group.to_owned(),
            artifact: artifact.to_owned(),
            version: version.to_owned(),
            classifier,
            extension: extension.to_owned(),
        })
    }

    /// `group:artifact`, the identity used to spot the same library at two versions.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Slash-separated path inside a maven repository.
    pub fn url_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.filename()
        )
    }

    pub fn local_path(&self) -> PathBuf {
        self.group
            .split('.')
            .collect::<PathBuf>()
            .join(&self.artifact)
            .join(&self.version)
            .join(self.filename())
    }

    pub fn url(&self, repository: &str) -> String {
        format!("{}/{}", repository.trim_end_matches('/'), self.url_path())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}
