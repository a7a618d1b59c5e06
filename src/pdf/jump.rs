//! One-shot "jump to" instructions
//!
//! A jump scrolls the viewer to a highlight or to a raw page position once.
//! Jumps are built by the application (sidebar clicks, URL fragments) and are
//! cleared as soon as the resulting scroll settles.

use serde::{Deserialize, Serialize};

use super::PageNumber;
use super::geometry::{PageViewport, ScaledRect, scaled_to_viewport};
use super::highlight::{Highlight, HighlightId};
use super::types::ScrollDestination;
use crate::error::{AnnotatorError, Result};

/// Gap in pixels kept between a jump target and the viewport top
pub const DEFAULT_SCROLL_MARGIN: f64 = 10.0;

/// Part of the application a jump is addressed to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpArea {
    #[default]
    Paper,
    Sidebar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    Highlight,
    Position,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpLocation {
    #[serde(default)]
    pub page_number: Option<PageNumber>,
    /// Highlight jumps: the highlight's bounding rect
    #[serde(default)]
    pub bounding_rect: Option<ScaledRect>,
    /// Position jumps: vertical offset in PDF units
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub use_pdf_coordinates: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpData {
    #[serde(default)]
    pub area: JumpArea,
    #[serde(rename = "type")]
    pub kind: JumpKind,
    #[serde(default)]
    pub id: Option<HighlightId>,
    #[serde(default)]
    pub location: Option<JumpLocation>,
}

/// A validated jump target
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JumpTarget {
    Highlight {
        page_number: PageNumber,
        bounding_rect: ScaledRect,
        use_pdf_coordinates: bool,
    },
    Position {
        page_number: PageNumber,
        top: f64,
    },
}

impl JumpTarget {
    pub fn page_number(&self) -> PageNumber {
        match self {
            Self::Highlight { page_number, .. } | Self::Position { page_number, .. } => {
                *page_number
            }
        }
    }

    /// Where to scroll, given the target page's viewport.
    ///
    /// Highlight targets keep `margin` pixels above the highlight.
    pub fn destination(&self, viewport: &PageViewport, margin: f64) -> ScrollDestination {
        match *self {
            Self::Highlight {
                page_number,
                bounding_rect,
                use_pdf_coordinates,
            } => {
                let rect = scaled_to_viewport(&bounding_rect, viewport, use_pdf_coordinates);
                let (left, top) = viewport.to_pdf_point(0.0, rect.top - margin);
                ScrollDestination {
                    page_number,
                    left,
                    top,
                }
            }
            Self::Position { page_number, top } => ScrollDestination {
                page_number,
                left: 0.0,
                top,
            },
        }
    }
}

/// Section heading location as extracted from the paper
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionAnchor {
    /// Page index (0-indexed)
    pub page_index: usize,
    /// Baseline of the heading in PDF units
    pub y: f64,
    pub height: f64,
}

impl JumpData {
    pub fn to_highlight(highlight: &Highlight) -> Self {
        Self {
            area: JumpArea::Paper,
            kind: JumpKind::Highlight,
            id: Some(highlight.id.clone()),
            location: Some(JumpLocation {
                page_number: Some(highlight.position.page_number),
                bounding_rect: Some(highlight.position.bounding_rect),
                position: None,
                use_pdf_coordinates: highlight.position.use_pdf_coordinates,
            }),
        }
    }

    pub fn to_position(page_number: PageNumber, position: f64) -> Self {
        Self {
            area: JumpArea::Paper,
            kind: JumpKind::Position,
            id: None,
            location: Some(JumpLocation {
                page_number: Some(page_number),
                bounding_rect: None,
                position: Some(position),
                use_pdf_coordinates: false,
            }),
        }
    }

    /// Jump just below a section heading
    pub fn to_section(section: &SectionAnchor) -> Self {
        Self::to_position(section.page_index as PageNumber + 1, section.y + section.height + 5.0)
    }

    pub fn is_for_paper(&self) -> bool {
        self.area == JumpArea::Paper
    }

    /// Highlight id the jump points at, for marking it in the layout
    pub fn scrolled_to(&self) -> Option<&HighlightId> {
        match self.kind {
            JumpKind::Highlight => self.id.as_ref(),
            JumpKind::Position => None,
        }
    }

    /// Validate the instruction.
    ///
    /// Jumps are constructed by the application, so a missing field is a
    /// programming error and reported as [`AnnotatorError::MalformedJump`].
    pub fn target(&self) -> Result<JumpTarget> {
        let location = self
            .location
            .as_ref()
            .ok_or_else(|| AnnotatorError::malformed_jump("location is missing"))?;
        let page_number = location
            .page_number
            .filter(|&page| page > 0)
            .ok_or_else(|| AnnotatorError::malformed_jump("page number is missing"))?;

        match self.kind {
            JumpKind::Highlight => {
                let bounding_rect = location
                    .bounding_rect
                    .ok_or_else(|| AnnotatorError::malformed_jump("bounding rect is missing"))?;
                Ok(JumpTarget::Highlight {
                    page_number,
                    bounding_rect,
                    use_pdf_coordinates: location.use_pdf_coordinates,
                })
            }
            JumpKind::Position => {
                let top = location
                    .position
                    .ok_or_else(|| AnnotatorError::malformed_jump("position is missing"))?;
                Ok(JumpTarget::Position { page_number, top })
            }
        }
    }
}

/// Target named by a URL fragment such as `#highlight-42`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FragmentTarget {
    Highlight(HighlightId),
    Section(String),
}

pub fn parse_fragment(fragment: &str) -> Option<FragmentTarget> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    if let Some(id) = fragment.strip_prefix("highlight-").filter(|id| !id.is_empty()) {
        return Some(FragmentTarget::Highlight(HighlightId::new(id)));
    }
    fragment
        .strip_prefix("section-")
        .filter(|id| !id.is_empty())
        .map(|id| FragmentTarget::Section(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::geometry::ScaledPosition;
    use crate::pdf::highlight::{HighlightComment, HighlightContent};

    fn highlight() -> Highlight {
        Highlight {
            id: HighlightId::new("42"),
            position: ScaledPosition {
                page_number: 3,
                bounding_rect: ScaledRect::new(0.25, 0.1, 0.5, 0.05),
                rects: Vec::new(),
                use_pdf_coordinates: false,
            },
            content: HighlightContent::text("x"),
            comment: HighlightComment::default(),
        }
    }

    #[test]
    fn highlight_jump_keeps_margin_above_target() {
        let jump = JumpData::to_highlight(&highlight());
        let target = jump.target().unwrap();
        let viewport = PageViewport::new(600.0, 800.0, 1.0);

        let dest = target.destination(&viewport, DEFAULT_SCROLL_MARGIN);

        assert_eq!(dest.page_number, 3);
        // Highlight top is 200px; 10px margin above it, flipped to PDF space
        assert!((dest.top - (800.0 - 190.0)).abs() < 1e-9);
        assert_eq!(dest.left, 0.0);
    }

    #[test]
    fn position_jump_uses_raw_position() {
        let jump = JumpData::to_position(2, 431.5);
        let dest = jump
            .target()
            .unwrap()
            .destination(&PageViewport::new(600.0, 800.0, 1.0), DEFAULT_SCROLL_MARGIN);
        assert_eq!(
            dest,
            ScrollDestination {
                page_number: 2,
                left: 0.0,
                top: 431.5
            }
        );
    }

    #[test]
    fn missing_fields_are_malformed() {
        let mut jump = JumpData::to_position(2, 10.0);
        jump.location.as_mut().unwrap().page_number = None;
        assert!(matches!(jump.target(), Err(AnnotatorError::MalformedJump { .. })));

        let mut jump = JumpData::to_position(2, 10.0);
        jump.location.as_mut().unwrap().position = None;
        assert!(matches!(jump.target(), Err(AnnotatorError::MalformedJump { .. })));

        let mut jump = JumpData::to_highlight(&highlight());
        jump.location = None;
        assert!(matches!(jump.target(), Err(AnnotatorError::MalformedJump { .. })));
    }

    #[test]
    fn parses_json_instruction() {
        let json = r#"{"area":"paper","type":"position","location":{"pageNumber":4,"position":120}}"#;
        let jump: JumpData = serde_json::from_str(json).unwrap();
        assert!(jump.is_for_paper());
        assert_eq!(
            jump.target().unwrap(),
            JumpTarget::Position {
                page_number: 4,
                top: 120.0
            }
        );
    }

    #[test]
    fn section_jump_lands_below_heading() {
        let jump = JumpData::to_section(&SectionAnchor {
            page_index: 1,
            y: 700.0,
            height: 12.0,
        });
        assert_eq!(
            jump.target().unwrap(),
            JumpTarget::Position {
                page_number: 2,
                top: 717.0
            }
        );
    }

    #[test]
    fn parses_fragments() {
        assert_eq!(
            parse_fragment("#highlight-42"),
            Some(FragmentTarget::Highlight(HighlightId::new("42")))
        );
        assert_eq!(
            parse_fragment("section-3"),
            Some(FragmentTarget::Section("3".into()))
        );
        assert_eq!(parse_fragment("#highlight-"), None);
        assert_eq!(parse_fragment("#comment-9"), None);
    }
}
