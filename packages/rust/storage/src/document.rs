//! YAML document emitter and the downstream loader.
//!
//! Records are not dumped with their serde derives. Instead each type
//! describes itself as a [`DocumentValue`], a closed set of value shapes
//! (scalars, links, sequences, mappings), and that tree is rendered to YAML.
//! Links are typed [`Url`]s in the model and always come out as plain
//! strings; absent metadata blocks are omitted instead of written as null.

use std::path::Path;

use addonsync_shared::{
    AddonRecord, CurseforgeAsset, CurseforgeAuthor, CurseforgeInfo, CurseforgeLinks, ProjectId,
    Result, SyncError,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_yaml::Value as Yaml;
use tracing::{info, instrument};
use url::Url;

use crate::write_atomic;

// ---------------------------------------------------------------------------
// Value model
// ---------------------------------------------------------------------------

/// A document node.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// URL-like value; rendered as its string form.
    Link(Url),
    Sequence(Vec<DocumentValue>),
    /// Ordered key/value pairs.
    Mapping(Vec<(String, DocumentValue)>),
}

impl DocumentValue {
    fn text(value: &str) -> Self {
        Self::String(value.to_string())
    }

    fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::text)
    }

    fn number(value: impl Into<serde_json::Number>) -> Self {
        Self::Number(value.into())
    }

    fn timestamp(value: Option<&DateTime<Utc>>) -> Self {
        value.map_or(Self::Null, |ts| {
            Self::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        })
    }

    /// Convert into a YAML tree.
    pub fn into_yaml(self) -> Yaml {
        match self {
            Self::Null => Yaml::Null,
            Self::Bool(b) => Yaml::Bool(b),
            Self::Number(n) => number_to_yaml(&n),
            Self::String(s) => Yaml::String(s),
            Self::Link(url) => Yaml::String(url.into()),
            Self::Sequence(items) => {
                Yaml::Sequence(items.into_iter().map(Self::into_yaml).collect())
            }
            Self::Mapping(entries) => {
                let mut map = serde_yaml::Mapping::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(Yaml::String(key), value.into_yaml());
                }
                Yaml::Mapping(map)
            }
        }
    }
}

fn number_to_yaml(n: &serde_json::Number) -> Yaml {
    if let Some(u) = n.as_u64() {
        Yaml::Number(u.into())
    } else if let Some(i) = n.as_i64() {
        Yaml::Number(i.into())
    } else {
        Yaml::Number(n.as_f64().unwrap_or_default().into())
    }
}

/// Types that can describe themselves as a [`DocumentValue`].
pub trait ToDocument {
    fn to_document(&self) -> DocumentValue;
}

impl<T: ToDocument> ToDocument for Option<T> {
    fn to_document(&self) -> DocumentValue {
        self.as_ref().map_or(DocumentValue::Null, T::to_document)
    }
}

impl<T: ToDocument> ToDocument for Vec<T> {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Sequence(self.iter().map(T::to_document).collect())
    }
}

impl ToDocument for Url {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Link(self.clone())
    }
}

impl ToDocument for ProjectId {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::text(self.as_str())
    }
}

impl ToDocument for serde_json::Value {
    fn to_document(&self) -> DocumentValue {
        use serde_json::Value;
        match self {
            Value::Null => DocumentValue::Null,
            Value::Bool(b) => DocumentValue::Bool(*b),
            Value::Number(n) => DocumentValue::Number(n.clone()),
            Value::String(s) => DocumentValue::String(s.clone()),
            Value::Array(items) => {
                DocumentValue::Sequence(items.iter().map(ToDocument::to_document).collect())
            }
            Value::Object(map) => map.to_document(),
        }
    }
}

impl ToDocument for serde_json::Map<String, serde_json::Value> {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Mapping(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_document()))
                .collect(),
        )
    }
}

impl ToDocument for CurseforgeAuthor {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Mapping(vec![
            ("id".into(), DocumentValue::number(self.id)),
            ("name".into(), DocumentValue::text(&self.name)),
            ("url".into(), self.url.to_document()),
        ])
    }
}

impl ToDocument for CurseforgeLinks {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Mapping(vec![
            ("websiteUrl".into(), self.website_url.to_document()),
            ("wikiUrl".into(), self.wiki_url.to_document()),
            ("issuesUrl".into(), self.issues_url.to_document()),
            ("sourceUrl".into(), self.source_url.to_document()),
        ])
    }
}

impl ToDocument for CurseforgeAsset {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Mapping(vec![
            ("id".into(), DocumentValue::number(self.id)),
            ("title".into(), DocumentValue::text(&self.title)),
            ("description".into(), DocumentValue::text(&self.description)),
            ("thumbnailUrl".into(), self.thumbnail_url.to_document()),
            ("url".into(), self.url.to_document()),
        ])
    }
}

impl ToDocument for CurseforgeInfo {
    fn to_document(&self) -> DocumentValue {
        DocumentValue::Mapping(vec![
            ("id".into(), DocumentValue::number(self.id)),
            ("name".into(), DocumentValue::text(&self.name)),
            ("slug".into(), DocumentValue::text(&self.slug)),
            ("authors".into(), self.authors.to_document()),
            ("downloadCount".into(), DocumentValue::number(self.download_count)),
            ("dateCreated".into(), DocumentValue::timestamp(self.date_created.as_ref())),
            ("dateModified".into(), DocumentValue::timestamp(self.date_modified.as_ref())),
            ("dateReleased".into(), DocumentValue::timestamp(self.date_released.as_ref())),
            ("links".into(), self.links.to_document()),
            ("logo".into(), self.logo.to_document()),
            (
                "primaryCategoryId".into(),
                self.primary_category_id
                    .map_or(DocumentValue::Null, DocumentValue::number),
            ),
            (
                "status".into(),
                self.status.map_or(DocumentValue::Null, DocumentValue::number),
            ),
            ("summary".into(), DocumentValue::text(&self.summary)),
            ("thumbnails".into(), self.thumbnails.to_document()),
        ])
    }
}

impl ToDocument for AddonRecord {
    fn to_document(&self) -> DocumentValue {
        let mut entries = vec![
            ("name".to_string(), DocumentValue::text(&self.name)),
            ("type".into(), DocumentValue::text(&self.category)),
            ("description".into(), DocumentValue::text(&self.description)),
            ("authors".into(), DocumentValue::text(&self.authors)),
            ("modrinth".into(), DocumentValue::optional_text(self.modrinth.as_deref())),
            ("curseforge".into(), DocumentValue::optional_text(self.curseforge.as_deref())),
            ("curseforge_id".into(), self.curseforge_id.to_document()),
            ("website".into(), DocumentValue::optional_text(self.website.as_deref())),
        ];
        if let Some(info) = &self.curseforge_info {
            entries.push(("curseforge_info".into(), info.to_document()));
        }
        if let Some(info) = &self.modrinth_info {
            entries.push(("modrinth_info".into(), info.to_document()));
        }
        DocumentValue::Mapping(entries)
    }
}

// ---------------------------------------------------------------------------
// Emit / load
// ---------------------------------------------------------------------------

/// Render `records` as a YAML sequence.
pub fn render_document(records: &[AddonRecord]) -> Result<String> {
    let tree = DocumentValue::Sequence(records.iter().map(ToDocument::to_document).collect());
    serde_yaml::to_string(&tree.into_yaml())
        .map_err(|e| SyncError::parse(format!("failed to render document: {e}")))
}

/// Write the enriched records to `path`, replacing any previous document.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub async fn emit_document(path: &Path, records: &[AddonRecord]) -> Result<()> {
    let yaml = render_document(records).map_err(|e| SyncError::write(path, e))?;
    write_atomic(path, yaml.as_bytes()).await?;
    info!("document written");
    Ok(())
}

/// Load the emitted document for a renderer, returning its structure unchanged.
pub async fn load_document(path: &Path) -> Result<Yaml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::read(path, e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| SyncError::read(path, format!("invalid document: {e}")))
}
