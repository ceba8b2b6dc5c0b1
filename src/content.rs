//! Content sources for the navigation UI.
//!
//! A [`ContentSource`] is asked once, before the session starts, for the data
//! the MFD should browse:
//! - [`Content::Grouped`]: group label → ordered detail lines (list + detail).
//! - [`Content::Flat`]: a plain list of entries (list only).
//!
//! Content files are TOML or JSON, chosen by extension:
//!
//! ```toml
//! profile = "profiles/route.pr0"   # optional
//!
//! [pages]
//! "Page 1" = ["-- 1 -----------", "Line 1", "Line 2"]
//! "Page 2" = ["-- 1 -----------", "Line 1"]
//! ```
//!
//! A file with an `entries = [...]` array and no `pages` table is flat.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Group label → detail lines. `BTreeMap` keeps keys in lexicographic order.
pub type ContentMapping = BTreeMap<String, Vec<String>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Grouped(ContentMapping),
    Flat(Vec<String>),
}

impl Content {
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Grouped(map) => map.is_empty(),
            Content::Flat(entries) => entries.is_empty(),
        }
    }
}

/// Supplies MFD content and, optionally, a device profile to activate.
pub trait ContentSource {
    fn load(&mut self) -> Result<Content>;

    /// Profile file to activate alongside this content.
    fn profile(&self) -> Option<PathBuf> {
        None
    }
}

/// In-memory content.
#[derive(Clone, Debug)]
pub struct StaticContent {
    content: Content,
    profile: Option<PathBuf>,
}

impl StaticContent {
    pub fn grouped<K, L, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (K, L)>,
        K: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let map = groups
            .into_iter()
            .map(|(k, lines)| (k.into(), lines.into_iter().map(Into::into).collect()))
            .collect();
        Self {
            content: Content::Grouped(map),
            profile: None,
        }
    }

    pub fn flat<I>(entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            content: Content::Flat(entries.into_iter().map(Into::into).collect()),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<PathBuf>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

impl ContentSource for StaticContent {
    fn load(&mut self) -> Result<Content> {
        Ok(self.content.clone())
    }

    fn profile(&self) -> Option<PathBuf> {
        self.profile.clone()
    }
}

/// On-disk layout of a content file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub profile: Option<PathBuf>,
    #[serde(default)]
    pub pages: ContentMapping,
    #[serde(default)]
    pub entries: Vec<String>,
}

impl ContentFile {
    pub fn into_content(self) -> Content {
        if self.pages.is_empty() && !self.entries.is_empty() {
            Content::Flat(self.entries)
        } else {
            Content::Grouped(self.pages)
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s).map_err(ConfigError::from)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s).map_err(ConfigError::from)?)
    }
}

/// Content read from a TOML/JSON file. Relative profile paths resolve against
/// the file's directory.
#[derive(Clone, Debug)]
pub struct FileContent {
    path: PathBuf,
    profile: Option<PathBuf>,
}

impl FileContent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            profile: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentSource for FileContent {
    fn load(&mut self) -> Result<Content> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let file = match ext.as_deref() {
            Some("toml") => ContentFile::from_toml_str(&text)?,
            Some("json") => ContentFile::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(self.path.clone()).into()),
        };

        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        self.profile = file.profile.as_ref().map(|p| base.join(p));
        tracing::debug!(path = %self.path.display(), "loaded content file");
        Ok(file.into_content())
    }

    fn profile(&self) -> Option<PathBuf> {
        self.profile.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_keys_are_sorted() {
        let mut src = StaticContent::grouped([("Beta", vec!["b1"]), ("Alpha", vec!["a1"])]);
        let Content::Grouped(map) = src.load().unwrap() else {
            panic!("expected grouped content");
        };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["Alpha", "Beta"]);
    }

    #[test]
    fn toml_pages_table_is_grouped() {
        let file = ContentFile::from_toml_str(
            r#"
            profile = "route.pr0"
            [pages]
            "Page 2" = ["x"]
            "Page 1" = ["-- 1 --", "Line 1"]
            "#,
        )
        .unwrap();
        assert_eq!(file.profile.as_deref(), Some(Path::new("route.pr0")));
        match file.into_content() {
            Content::Grouped(map) => {
                assert_eq!(map["Page 1"], ["-- 1 --", "Line 1"]);
                assert_eq!(map.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn json_entries_are_flat() {
        let file = ContentFile::from_json_str(r#"{ "entries": ["Entry 1", "Entry 2"] }"#).unwrap();
        assert_eq!(
            file.into_content(),
            Content::Flat(vec!["Entry 1".into(), "Entry 2".into()])
        );
    }

    #[test]
    fn empty_file_is_empty_grouped() {
        let content = ContentFile::from_toml_str("").unwrap().into_content();
        assert!(content.is_empty());
        assert!(matches!(content, Content::Grouped(_)));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = FileContent::new("no/such/content.toml").load().unwrap_err();
        assert!(matches!(err, crate::Error::Config(ConfigError::Io { .. })));
    }

    #[test]
    fn file_profile_resolves_against_file_dir() {
        let dir = std::env::temp_dir().join(format!("stickmfd-content-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pages.toml");
        std::fs::write(&path, "profile = \"x52.pr0\"\n[pages]\nA = [\"a1\"]\n").unwrap();

        let mut src = FileContent::new(&path);
        assert!(matches!(src.load().unwrap(), Content::Grouped(_)));
        assert_eq!(src.profile(), Some(dir.join("x52.pr0")));

        let yaml = dir.join("pages.yaml");
        std::fs::write(&yaml, "pages: {}").unwrap();
        let err = FileContent::new(&yaml).load().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::UnsupportedFormat(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
