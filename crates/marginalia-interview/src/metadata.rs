use std::path::{Path, PathBuf};

/// Facts about the project being described, fixed for the whole interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    name: String,
    root_dir: PathBuf,
    language: String,
    description: String,
}

impl ProjectMetadata {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        root_dir: impl Into<PathBuf>,
        language: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root_dir: root_dir.into(),
            language: language.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
