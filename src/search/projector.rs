//! Result projection / 结果投影
//!
//! Maps whichever backend produced a record into the public result shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Result, SearchError};
use crate::models::Figure;

/// Whether timestamps belong to an operation's result / 结果是否包含时间戳
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamps {
    Include,
    Omit,
}

/// Public search result / 对外搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSummary {
    pub id: String,
    pub manufacturer: String,
    pub name: String,
    pub scale: String,
    pub link: String,
    pub location: String,
    pub box_number: String,
    pub image: Option<String>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FigureSummary {
    pub fn from_figure(figure: &Figure, timestamps: Timestamps) -> Self {
        let (created_at, updated_at) = match timestamps {
            Timestamps::Include => (Some(figure.created_at.clone()), Some(figure.updated_at.clone())),
            Timestamps::Omit => (None, None),
        };
        Self {
            id: figure.id.clone(),
            manufacturer: figure.manufacturer.clone(),
            name: figure.name.clone(),
            scale: figure.scale.clone(),
            link: figure.link.clone(),
            location: figure.location.clone(),
            box_number: figure.box_number.clone(),
            image: figure.image.clone(),
            user_id: figure.user_id.clone(),
            created_at,
            updated_at,
        }
    }
}

pub fn project_all(figures: &[Figure], timestamps: Timestamps) -> Vec<FigureSummary> {
    figures.iter().map(|f| FigureSummary::from_figure(f, timestamps)).collect()
}

/// Fields returned by the managed index `$project` stage / 托管索引投影字段
pub const INDEX_PROJECTION_FIELDS: &[&str] = &[
    "_id",
    "manufacturer",
    "name",
    "scale",
    "link",
    "location",
    "boxNumber",
    "image",
    "userId",
    "createdAt",
    "updatedAt",
];

/// Extended-JSON scalar: plain string, `{"$oid": ..}` or `{"$date": ..}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtString {
    Plain(String),
    Oid {
        #[serde(rename = "$oid")]
        oid: String,
    },
    Date {
        #[serde(rename = "$date")]
        date: Value,
    },
}

impl ExtString {
    fn into_string(self) -> String {
        match self {
            ExtString::Plain(s) => s,
            ExtString::Oid { oid } => oid,
            ExtString::Date { date } => match date {
                Value::String(s) => s,
                // canonical form: {"$numberLong": "<millis>"}
                Value::Object(map) => map
                    .get("$numberLong")
                    .and_then(|v| v.as_str())
                    .and_then(|ms| ms.parse::<i64>().ok())
                    .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
                other => other.to_string(),
            },
        }
    }
}

/// Raw document as stored in the managed index / 托管索引原始文档
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexDocument {
    #[serde(rename = "_id")]
    id: ExtString,
    #[serde(default)]
    manufacturer: String,
    name: String,
    #[serde(default)]
    scale: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    box_number: String,
    #[serde(default)]
    image: Option<String>,
    user_id: ExtString,
    #[serde(default)]
    created_at: Option<ExtString>,
    #[serde(default)]
    updated_at: Option<ExtString>,
}

/// Map one managed-index document to a figure record / 将索引文档映射为记录
pub fn project_document(doc: &Value) -> Result<Figure> {
    let raw = IndexDocument::deserialize(doc)
        .map_err(|e| SearchError::Projection(e.to_string()))?;
    Ok(Figure {
        id: raw.id.into_string(),
        user_id: raw.user_id.into_string(),
        manufacturer: raw.manufacturer,
        name: raw.name,
        scale: raw.scale,
        link: raw.link,
        location: raw.location,
        box_number: raw.box_number,
        image: raw.image.filter(|s| !s.is_empty()),
        created_at: raw.created_at.map(ExtString::into_string).unwrap_or_default(),
        updated_at: raw.updated_at.map(ExtString::into_string).unwrap_or_default(),
    })
}
