//! Raw export records as produced by the labeling tool.
//!
//! These mirror the task-export JSON closely and are only lightly typed: a
//! part's `value` stays a [`serde_json::Value`] until a variant that
//! understands its type tag decodes it.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An identifier that the export writes either as a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawId {
    fn from(value: &str) -> Self {
        RawId::Text(value.to_string())
    }
}

impl From<i64> for RawId {
    fn from(value: i64) -> Self {
        RawId::Number(value)
    }
}

/// One exported task: an image plus every labeling pass over it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTask {
    pub id: RawId,
    #[serde(default)]
    pub data: RawTaskData,
    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawTaskData {
    #[serde(default)]
    pub image: Option<String>,
}

/// One labeling pass: a flat list of parts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAnnotation {
    pub id: RawId,
    #[serde(default)]
    pub result: Vec<RawPart>,
    /// Split membership injected by an upstream classification step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_categories: Option<Vec<String>>,
    #[serde(default)]
    pub was_cancelled: bool,
}

/// One fragment of an annotation data entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawPart {
    pub id: RawId,
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<u32>,
}

impl RawPart {
    /// The part's fragment type.
    pub fn kind(&self) -> PartKind {
        PartKind::from_tag(&self.part_type)
    }

    /// Decodes `value` into the payload type for this part's fragment type.
    pub(crate) fn decode_value<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }
}

/// Fragment type tags the annotation data variants understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartKind {
    Labels,
    TextArea,
    Rectangle,
    Polygon,
    Choices,
    /// Any tag no variant consumes (e.g. `keypointlabels`).
    Other,
}

impl PartKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "labels" => PartKind::Labels,
            "textarea" => PartKind::TextArea,
            "rectangle" => PartKind::Rectangle,
            "polygon" => PartKind::Polygon,
            "choices" => PartKind::Choices,
            _ => PartKind::Other,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RectangleValue {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PolygonValue {
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextAreaValue {
    pub text: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelsValue {
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoicesValue {
    pub choices: Vec<String>,
}
