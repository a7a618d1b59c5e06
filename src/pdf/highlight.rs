//! Highlight records as exchanged with the paper API

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::ScaledPosition;
use crate::error::Result;

/// Server-assigned highlight identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightId(pub String);

impl HighlightId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HighlightId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// What was highlighted: selected text, or a screenshot for area highlights
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// PNG data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl HighlightContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(data_uri: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(data_uri.into()),
        }
    }

    /// Area highlights carry an image instead of text
    pub fn is_area(&self) -> bool {
        self.image.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMode {
    #[default]
    Public,
    Private,
    Anonymous,
    Group,
}

/// Who can see a comment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub mode: VisibilityMode,
    /// Group ids, only meaningful for [`VisibilityMode::Group`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightComment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub visibility: Visibility,
}

/// A persisted highlight
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: HighlightId,
    pub position: ScaledPosition,
    #[serde(default)]
    pub content: HighlightContent,
    #[serde(default)]
    pub comment: HighlightComment,
}

impl Highlight {
    pub fn page_number(&self) -> super::PageNumber {
        self.position.page_number
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the highlight list returned by the paper endpoint
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An unsaved highlight candidate. At most one exists at a time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GhostHighlight {
    pub position: ScaledPosition,
    pub content: HighlightContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::geometry::ScaledRect;

    const RECORD: &str = r#"{
        "id": "42",
        "position": {
            "pageNumber": 3,
            "boundingRect": {"top": 0.1, "left": 0.2, "width": 0.3, "height": 0.05},
            "rects": [{"top": 0.1, "left": 0.2, "width": 0.3, "height": 0.05}]
        },
        "content": {"text": "attention is all you need"},
        "comment": {"text": "classic", "visibility": {"mode": "group", "groups": ["nlp-club"]}}
    }"#;

    #[test]
    fn parses_api_record() {
        let highlight = Highlight::from_json(RECORD).unwrap();

        assert_eq!(highlight.id, HighlightId::from("42"));
        assert_eq!(highlight.page_number(), 3);
        assert!(!highlight.position.use_pdf_coordinates);
        assert_eq!(highlight.position.rects.len(), 1);
        assert_eq!(highlight.content.text.as_deref(), Some("attention is all you need"));
        assert_eq!(highlight.comment.visibility.mode, VisibilityMode::Group);
        assert_eq!(highlight.comment.visibility.groups, vec!["nlp-club"]);
    }

    #[test]
    fn serializes_camel_case_and_omits_defaults() {
        let highlight = Highlight {
            id: HighlightId::new("7"),
            position: ScaledPosition {
                page_number: 1,
                bounding_rect: ScaledRect::new(0.5, 0.5, 0.1, 0.1),
                rects: Vec::new(),
                use_pdf_coordinates: false,
            },
            content: HighlightContent::image("data:image/png;base64,AAAA"),
            comment: HighlightComment::default(),
        };

        let json = highlight.to_json().unwrap();
        assert!(json.contains("\"pageNumber\":1"));
        assert!(json.contains("\"boundingRect\""));
        assert!(!json.contains("usePdfCoordinates"));
        assert!(!json.contains("\"text\":null"));
        assert!(highlight.content.is_area());
    }

    #[test]
    fn missing_rects_and_comment_default() {
        let json = r#"{"id":"1","position":{"pageNumber":2,"boundingRect":{"top":0,"left":0,"width":1,"height":1},"usePdfCoordinates":true}}"#;
        let highlight = Highlight::from_json(json).unwrap();

        assert!(highlight.position.rects.is_empty());
        assert!(highlight.position.use_pdf_coordinates);
        assert_eq!(highlight.comment, HighlightComment::default());
    }
}
