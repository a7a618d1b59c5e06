//! Overlay specification for one page
//!
//! Drawing is "replace contents": the engine swaps a page's overlay for the
//! spec built here, so building the same spec twice is harmless.

use super::PageNumber;
use super::geometry::PageViewport;
use super::highlight::{GhostHighlight, Highlight, HighlightId};
use super::layout::{ViewportHighlight, page_layout};
use super::terms::{MatchRect, TermMatchEngine};
use super::text_layer::TextLayer;

/// Everything drawn on top of one page
#[derive(Clone, Debug, PartialEq)]
pub struct OverlaySpec {
    pub page_number: PageNumber,
    /// Interactive highlight layer
    pub highlights: Vec<ViewportHighlight>,
    /// Non-interactive term match layer
    pub matches: Vec<MatchRect>,
}

impl OverlaySpec {
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.matches.is_empty()
    }
}

/// Rendering inputs the engine reports for a page
#[derive(Clone, Copy, Debug)]
pub struct PageInputs<'a> {
    pub page_number: PageNumber,
    pub viewport: &'a PageViewport,
    /// `None` while the text layer is not rendered yet
    pub text_layer: Option<&'a TextLayer>,
}

/// Build the overlay for one page from the current annotation state
pub fn build_overlay(
    page: PageInputs<'_>,
    highlights: &[Highlight],
    ghost: Option<&GhostHighlight>,
    scrolled_to: Option<&HighlightId>,
    terms: &TermMatchEngine,
) -> OverlaySpec {
    let matches = match page.text_layer {
        Some(layer) => terms.page_matches(page.page_number.saturating_sub(1) as usize, layer),
        None => Vec::new(),
    };

    OverlaySpec {
        page_number: page.page_number,
        highlights: page_layout(highlights, ghost, page.page_number, page.viewport, scrolled_to),
        matches,
    }
}
