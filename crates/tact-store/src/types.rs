use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A row from `quiz_selection_images`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogImage {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub display_order: i32,
}

/// A row from `governorates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governorate {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name_ar: String,
}

/// Row ids come back as UUID strings or bigints depending on the table.
pub(crate) fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_text(&value).ok_or_else(|| serde::de::Error::custom("id must be a string or number"))
}
