//! Selection capture
//!
//! Turns a native text selection or a mouse-drawn area into a highlight
//! candidate. Coordinates are made page-relative and converted to scaled
//! space right away so the candidate no longer depends on the zoom level.

use log::{debug, warn};

use super::PageNumber;
use super::engine::RenderingEngine;
use super::geometry::{
    MergeMargins, ScaledPosition, ViewportPosition, ViewportRect, bounding_rect,
    optimize_client_rects_with,
};
use super::highlight::HighlightContent;
use super::screenshot;
use super::types::{AreaSelection, NodeId, PageView, TextSelection};

/// A captured selection waiting for the user to confirm it
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionCandidate {
    /// Position in current viewport pixels, for anchoring the confirmation tip
    pub viewport_position: ViewportPosition,
    /// Zoom-independent position to persist
    pub scaled_position: ScaledPosition,
    pub content: HighlightContent,
}

impl SelectionCandidate {
    pub fn page_number(&self) -> PageNumber {
        self.scaled_position.page_number
    }
}

fn resolve_page<E: RenderingEngine>(engine: &E, anchor: NodeId) -> Option<PageView> {
    let page = engine.page_from_node(anchor)?;
    let view = engine.page_view(page);
    if view.is_none() {
        warn!("Selection resolved to page {page} which has no viewport");
    }
    view
}

/// Capture a text selection.
///
/// Returns `None` when the selection is not inside a page or has no client
/// rectangles; both are ordinary "nothing selected" outcomes.
pub fn capture_text<E: RenderingEngine>(
    engine: &E,
    selection: &TextSelection,
    margins: MergeMargins,
) -> Option<SelectionCandidate> {
    let view = resolve_page(engine, selection.anchor)?;

    let page_rects: Vec<ViewportRect> = selection
        .client_rects
        .iter()
        .map(|rect| view.to_page_relative(rect))
        .collect();
    let rects = optimize_client_rects_with(&page_rects, margins);
    let bounds = bounding_rect(&rects).ok()?;

    let viewport_position = ViewportPosition {
        page_number: view.page_number,
        bounding_rect: bounds,
        rects,
    };
    let scaled_position = viewport_position.to_scaled(&view.viewport);
    debug!(
        "Captured text selection on page {} ({} line rects)",
        view.page_number,
        viewport_position.rects.len()
    );

    Some(SelectionCandidate {
        viewport_position,
        scaled_position,
        content: HighlightContent::text(selection.text.clone()),
    })
}

/// Capture a mouse-drawn area, including a screenshot of it.
///
/// Returns `None` when the drag did not start on a page.
pub fn capture_area<E: RenderingEngine>(
    engine: &E,
    selection: &AreaSelection,
) -> Option<SelectionCandidate> {
    let view = resolve_page(engine, selection.anchor)?;
    let bounds = view.to_page_relative(&selection.rect);

    let viewport_position = ViewportPosition {
        page_number: view.page_number,
        bounding_rect: bounds,
        rects: Vec::new(),
    };
    let scaled_position = viewport_position.to_scaled(&view.viewport);
    let image = screenshot_area(engine, &view, &bounds);

    Some(SelectionCandidate {
        viewport_position,
        scaled_position,
        content: HighlightContent { text: None, image },
    })
}

/// Screenshot a page-relative area, logging instead of failing
pub(crate) fn screenshot_area<E: RenderingEngine>(
    engine: &E,
    view: &PageView,
    area: &ViewportRect,
) -> Option<String> {
    let Some(canvas) = engine.canvas(view.page_number) else {
        warn!("No canvas for page {}, area highlight has no image", view.page_number);
        return None;
    };
    match screenshot::area_as_png(canvas, &view.viewport, area) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("Failed to screenshot page {}: {e}", view.page_number);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::geometry::PageViewport;
    use crate::pdf::types::NodeId;
    use crate::test_utils::FakeEngine;

    fn engine() -> FakeEngine {
        let mut engine = FakeEngine::new(3, PageViewport::new(600.0, 800.0, 1.0));
        engine.map_node(NodeId(10), 2);
        engine
    }

    #[test]
    fn text_selection_outside_pages_is_ignored() {
        let selection = TextSelection {
            anchor: NodeId(999),
            client_rects: vec![ViewportRect::new(0.0, 0.0, 10.0, 10.0)],
            text: "x".into(),
        };
        assert!(capture_text(&engine(), &selection, MergeMargins::default()).is_none());
    }

    #[test]
    fn text_selection_without_rects_is_ignored() {
        let selection = TextSelection {
            anchor: NodeId(10),
            client_rects: Vec::new(),
            text: String::new(),
        };
        assert!(capture_text(&engine(), &selection, MergeMargins::default()).is_none());
    }

    #[test]
    fn text_selection_is_page_relative_and_scaled() {
        let engine = engine();
        let offset = engine.page_view(2).unwrap().offset_top;
        let selection = TextSelection {
            anchor: NodeId(10),
            client_rects: vec![
                ViewportRect::new(offset + 10.0, 0.0, 100.0, 14.0),
                ViewportRect::new(offset + 24.0, 0.0, 80.0, 14.0),
            ],
            text: "two lines".into(),
        };

        let candidate = capture_text(&engine, &selection, MergeMargins::default()).unwrap();

        assert_eq!(candidate.page_number(), 2);
        assert_eq!(
            candidate.viewport_position.bounding_rect,
            ViewportRect::new(10.0, 0.0, 100.0, 28.0)
        );
        let scaled = candidate.scaled_position.bounding_rect;
        assert!((scaled.top - 10.0 / 800.0).abs() < 1e-9);
        assert!((scaled.width - 100.0 / 600.0).abs() < 1e-9);
        assert_eq!(candidate.content.text.as_deref(), Some("two lines"));
    }

    #[test]
    fn area_selection_has_no_line_rects_and_an_image() {
        let engine = engine();
        let view = engine.page_view(2).unwrap();
        let selection = AreaSelection {
            anchor: NodeId(10),
            rect: ViewportRect::new(view.offset_top + 100.0, view.offset_left + 50.0, 120.0, 60.0),
        };

        let candidate = capture_area(&engine, &selection).unwrap();

        assert!(candidate.scaled_position.rects.is_empty());
        assert_eq!(
            candidate.viewport_position.bounding_rect,
            ViewportRect::new(100.0, 50.0, 120.0, 60.0)
        );
        assert!(candidate.content.is_area());
    }
}
