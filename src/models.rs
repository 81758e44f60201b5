use crate::constants::*;
use serde::Deserialize;

/// Parsed response of the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateManifest {
    /// Server-side timestamp of the newest update, seconds since the epoch.
    #[serde(default)]
    pub last_update: i64,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Category of an update file, decided by a marker in its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Vulnerability,
    Component,
}

impl Category {
    /// Categories in processing order.
    pub const ALL: [Category; 2] = [Category::Vulnerability, Category::Component];

    /// Returns a human-readable name for the category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vulnerability => "vulnerabilities",
            Self::Component => "components",
        }
    }

    /// Substring that places a URL in this category.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Vulnerability => VULNERABILITY_MARKER,
            Self::Component => COMPONENT_MARKER,
        }
    }

    /// Prefix for downloaded files, scratch directories and the archive.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Vulnerability => VULNERABILITY_PREFIX,
            Self::Component => COMPONENT_PREFIX,
        }
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.prefix())
    }
}

/// URLs partitioned by category, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub vulnerabilities: Vec<String>,
    pub components: Vec<String>,
}

impl Buckets {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Vulnerability => &self.vulnerabilities,
            Category::Component => &self.components,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty() && self.components.is_empty()
    }
}
