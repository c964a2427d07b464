use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Treat an explicit `null` like a missing field.
/// GROQ projections emit `null` for every unset field they name.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Slug {
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ImageMetadata {
    pub dimensions: Option<ImageDimensions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ImageAsset {
    #[serde(rename = "_id")]
    pub id: String,
    pub metadata: Option<ImageMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ImageSource {
    pub asset: Option<ImageAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct GalleryImage {
    #[serde(rename = "_key")]
    pub key: String,
    pub asset: Option<ImageAsset>,
    pub caption: Option<String>,
}

/// Dimensions are either measured or free text, depending on the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(untagged)]
pub enum Dimensions {
    Measured {
        width: Option<f64>,
        height: Option<f64>,
        unit: Option<String>,
    },
    Text(String),
}

impl Dimensions {
    pub fn display(&self) -> String {
        match self {
            Dimensions::Text(text) => text.clone(),
            Dimensions::Measured { width, height, unit } => {
                let unit = unit.as_deref().unwrap_or("cm");
                match (width, height) {
                    (Some(w), Some(h)) => format!("{} × {} {}", w, h, unit),
                    (Some(w), None) => format!("{} {} wide", w, unit),
                    (None, Some(h)) => format!("{} {} high", h, unit),
                    (None, None) => String::new(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    pub slug: Option<Slug>,
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "null_default")]
    pub featured: bool,
    pub order: Option<i64>,
    #[serde(rename = "_createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub image: Option<ImageSource>,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<GalleryImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "detailedDescription", skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
}

impl Project {
    pub fn slug_str(&self) -> Option<&str> {
        self.slug.as_ref().map(|s| s.current.as_str())
    }
}

/// Minimal reference to a neighbouring project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ProjectLink {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    pub order: Option<i64>,
}

impl NavigationEntry {
    pub fn to_link(&self) -> ProjectLink {
        ProjectLink {
            slug: self.slug.current.clone(),
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationContext {
    pub current: Option<NavigationEntry>,
    pub previous: Option<NavigationEntry>,
    pub next: Option<NavigationEntry>,
}

impl NavigationContext {
    pub fn previous_link(&self) -> Option<ProjectLink> {
        self.previous.as_ref().map(NavigationEntry::to_link)
    }

    pub fn next_link(&self) -> Option<ProjectLink> {
        self.next.as_ref().map(NavigationEntry::to_link)
    }
}

/// Slug row as returned by the all-slugs query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlugRecord {
    pub slug: Option<String>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct SlugEntry {
    pub slug: String,
}

impl SlugEntry {
    /// Keep only records that carry a non-empty slug
    pub fn from_records(records: Vec<SlugRecord>) -> Vec<SlugEntry> {
        records
            .into_iter()
            .filter_map(|r| r.slug.filter(|s| !s.is_empty()))
            .map(|slug| SlugEntry { slug })
            .collect()
    }
}
