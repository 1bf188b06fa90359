use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Title, description and meta tags scraped from a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "metaData")]
    pub meta_data: BTreeMap<String, String>,
}

impl ScrapedRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// A record is only worth indexing when it has both a title and a
    /// `description` meta tag.
    pub fn is_valid(&self) -> bool {
        let has_title = self.title.as_deref().is_some_and(|t| !t.is_empty());
        let has_description = self
            .meta_data
            .get("description")
            .is_some_and(|d| !d.is_empty());
        has_title && has_description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
    Script,
    Stylesheet,
    Font,
}

impl AssetKind {
    /// Document kinds recognised by file extension on anchor hrefs.
    pub const DOCUMENTS: [AssetKind; 7] = [
        AssetKind::Pdf,
        AssetKind::Doc,
        AssetKind::Docx,
        AssetKind::Xlsx,
        AssetKind::Xls,
        AssetKind::Ppt,
        AssetKind::Pptx,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Pdf => "pdf",
            AssetKind::Doc => "doc",
            AssetKind::Docx => "docx",
            AssetKind::Xls => "xls",
            AssetKind::Xlsx => "xlsx",
            AssetKind::Ppt => "ppt",
            AssetKind::Pptx => "pptx",
            AssetKind::Script => "script",
            AssetKind::Stylesheet => "stylesheet",
            AssetKind::Font => "font",
        }
    }

    /// Match a URL path's extension against the document kinds.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        Self::DOCUMENTS.into_iter().find(|kind| kind.as_str() == ext)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedAsset {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub url: String,
    #[serde(rename = "parentUrl")]
    pub parent_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedImage {
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A lowercase, trimmed search phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggest: String,
}

impl Suggestion {
    /// Normalizes `raw`; returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let suggest = raw.trim().to_lowercase();
        if suggest.is_empty() {
            return None;
        }
        Some(Self { suggest })
    }
}
