//! Core domain types for the addon catalog.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Column names recognized in the source table.
pub mod columns {
    pub const NAME: &str = "Name";
    pub const TYPE: &str = "Type";
    pub const DESCRIPTION: &str = "Description";
    pub const AUTHORS: &str = "Authors";
    pub const MODRINTH: &str = "Modrinth";
    pub const CURSEFORGE: &str = "Curseforge";
    pub const CURSEFORGE_ID: &str = "Curseforge ID";
    pub const WEBSITE: &str = "Website";
}

// ---------------------------------------------------------------------------
// SourceRow
// ---------------------------------------------------------------------------

/// One row of the source table: column name → raw cell value, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl SourceRow {
    /// Build a row from the shared header list and this row's cells.
    pub fn new(headers: Arc<[String]>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Raw value of `column`, if the header has it and the row reaches it.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Iterate `(column, value)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// Header names shared by every row of the same table.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw cells, including any beyond the header width.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// ProjectId
// ---------------------------------------------------------------------------

/// A resolved registry-A (CurseForge) project identifier.
///
/// Accepts both JSON strings and integers when deserializing, since older
/// cache files stored the numeric id. Always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self::from(n),
        })
    }
}

// ---------------------------------------------------------------------------
// CurseForge metadata block
// ---------------------------------------------------------------------------

/// Allow-listed subset of a CurseForge mod descriptor.
///
/// Unknown fields in the API payload are ignored, which is what keeps
/// descriptions, file lists and category trees out of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseforgeInfo {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub authors: Vec<CurseforgeAuthor>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_released: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: CurseforgeLinks,
    #[serde(default)]
    pub logo: Option<CurseforgeAsset>,
    #[serde(default)]
    pub primary_category_id: Option<u64>,
    #[serde(default)]
    pub status: Option<u32>,
    #[serde(default)]
    pub summary: String,
    /// The API calls these `screenshots`.
    #[serde(default, alias = "screenshots")]
    pub thumbnails: Vec<CurseforgeAsset>,
}

/// A mod author as listed by CurseForge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurseforgeAuthor {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_url")]
    pub url: Option<Url>,
}

/// External links of a CurseForge mod. CurseForge sends `""` for unset links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseforgeLinks {
    #[serde(default, deserialize_with = "lenient_url")]
    pub website_url: Option<Url>,
    #[serde(default, deserialize_with = "lenient_url")]
    pub wiki_url: Option<Url>,
    #[serde(default, deserialize_with = "lenient_url")]
    pub issues_url: Option<Url>,
    #[serde(default, deserialize_with = "lenient_url")]
    pub source_url: Option<Url>,
}

/// Logo or screenshot image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseforgeAsset {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_url")]
    pub thumbnail_url: Option<Url>,
    #[serde(default, deserialize_with = "lenient_url")]
    pub url: Option<Url>,
}

/// Treat empty or unparseable URL strings as absent.
fn lenient_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Url>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| Url::parse(s.trim()).ok()))
}

/// Modrinth project payload with the volatile fields stripped.
pub type ModrinthInfo = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// AddonRecord
// ---------------------------------------------------------------------------

/// The working entity: one catalog entry, projected from a [`SourceRow`]
/// and then enriched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonRecord {
    /// Unique catalog name; join key for the cache and the table rewrite.
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub description: String,
    pub authors: String,
    /// Modrinth project link.
    pub modrinth: Option<String>,
    /// CurseForge project page link.
    pub curseforge: Option<String>,
    pub curseforge_id: Option<ProjectId>,
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curseforge_info: Option<CurseforgeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modrinth_info: Option<ModrinthInfo>,
}

/// How far enrichment got for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentState {
    /// Every referenced registry produced a metadata block.
    Enriched,
    /// At least one referenced registry produced nothing.
    Partial,
    /// No registry references; never touched the network.
    Unenriched,
}

impl AddonRecord {
    /// Project a source row onto the record schema. Blank cells become `None`.
    pub fn from_row(row: &SourceRow) -> Self {
        let text = |col: &str| row.get(col).unwrap_or_default().to_string();
        let optional = |col: &str| {
            row.get(col)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        Self {
            name: text(columns::NAME),
            category: text(columns::TYPE),
            description: text(columns::DESCRIPTION),
            authors: text(columns::AUTHORS),
            modrinth: optional(columns::MODRINTH),
            curseforge: optional(columns::CURSEFORGE),
            curseforge_id: optional(columns::CURSEFORGE_ID).map(ProjectId::new),
            website: optional(columns::WEBSITE),
            curseforge_info: None,
            modrinth_info: None,
        }
    }

    /// Whether any registry link is present.
    pub fn has_references(&self) -> bool {
        self.curseforge.is_some() || self.modrinth.is_some()
    }

    pub fn state(&self) -> EnrichmentState {
        if !self.has_references() {
            return EnrichmentState::Unenriched;
        }
        let curseforge_ok = self.curseforge.is_none() || self.curseforge_info.is_some();
        let modrinth_ok = self.modrinth.is_none() || self.modrinth_info.is_some();
        if curseforge_ok && modrinth_ok {
            EnrichmentState::Enriched
        } else {
            EnrichmentState::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> SourceRow {
        let headers: Arc<[String]> = pairs.iter().map(|(k, _)| k.to_string()).collect();
        SourceRow::new(headers, pairs.iter().map(|(_, v)| v.to_string()).collect())
    }

    #[test]
    fn source_row_preserves_column_order() {
        let r = row(&[("Name", "Foo"), ("Type", "Mod"), ("Website", "")]);
        let cols: Vec<&str> = r.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, ["Name", "Type", "Website"]);
        assert_eq!(r.get("Type"), Some("Mod"));
        assert_eq!(r.get("Missing"), None);
    }

    #[test]
    fn projection_maps_blank_cells_to_none() {
        let r = row(&[
            ("Name", "Foo"),
            ("Type", "Mod"),
            ("Description", "A mod"),
            ("Authors", "alice"),
            ("Modrinth", "https://modrinth.com/mod/foo-bar"),
            ("Curseforge", ""),
            ("Curseforge ID", "  "),
            ("Website", ""),
        ]);
        let record = AddonRecord::from_row(&r);

        assert_eq!(record.name, "Foo");
        assert_eq!(record.category, "Mod");
        assert_eq!(record.modrinth.as_deref(), Some("https://modrinth.com/mod/foo-bar"));
        assert!(record.curseforge.is_none());
        assert!(record.curseforge_id.is_none());
        assert!(record.website.is_none());
    }

    #[test]
    fn state_reflects_missing_blocks() {
        let mut record = AddonRecord::from_row(&row(&[("Name", "Bare")]));
        assert_eq!(record.state(), EnrichmentState::Unenriched);

        record.modrinth = Some("https://modrinth.com/mod/bare".into());
        assert_eq!(record.state(), EnrichmentState::Partial);

        record.modrinth_info = Some(ModrinthInfo::new());
        assert_eq!(record.state(), EnrichmentState::Enriched);
    }

    #[test]
    fn project_id_accepts_numbers_and_strings() {
        let ids: std::collections::BTreeMap<String, ProjectId> =
            serde_json::from_str(r#"{"Bar": "999", "Baz": 1234}"#).expect("parse ids");
        assert_eq!(ids["Bar"], ProjectId::new("999"));
        assert_eq!(ids["Baz"], ProjectId::new("1234"));

        let json = serde_json::to_string(&ids).expect("serialize ids");
        assert_eq!(json, r#"{"Bar":"999","Baz":"1234"}"#);
    }

    #[test]
    fn curseforge_info_ignores_unlisted_fields() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/curseforge-mod.json")
            .expect("read curseforge fixture");
        let payload: serde_json::Value = serde_json::from_str(&fixture).expect("parse fixture");
        let info: CurseforgeInfo =
            serde_json::from_value(payload["data"].clone()).expect("deserialize mod");

        assert_eq!(info.id, 238222);
        assert_eq!(info.slug, "jei");
        assert_eq!(info.authors.len(), 1);
        assert!(info.links.wiki_url.is_none(), "empty link string maps to None");
        assert_eq!(info.thumbnails.len(), 1);

        let out = serde_json::to_value(&info).expect("serialize");
        assert!(out.get("gameId").is_none());
        assert!(out.get("latestFiles").is_none());
        assert!(out.get("thumbnails").is_some());
        assert!(out.get("downloadCount").is_some());
    }
}
