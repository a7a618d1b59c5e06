//! Highlight layout: per-page grouping and viewport projection

use std::collections::BTreeMap;

use super::PageNumber;
use super::geometry::{PageViewport, ViewportPosition};
use super::highlight::{GhostHighlight, Highlight, HighlightComment, HighlightContent, HighlightId};

/// Either a persisted highlight or the ghost candidate
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutEntry<'a> {
    Saved(&'a Highlight),
    Ghost(&'a GhostHighlight),
}

impl LayoutEntry<'_> {
    pub fn page_number(&self) -> PageNumber {
        match self {
            Self::Saved(h) => h.position.page_number,
            Self::Ghost(g) => g.position.page_number,
        }
    }
}

/// A highlight projected onto the current viewport
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportHighlight {
    /// `None` for the ghost
    pub id: Option<HighlightId>,
    pub position: ViewportPosition,
    pub content: HighlightContent,
    pub comment: Option<HighlightComment>,
    /// Target of the active jump
    pub is_scrolled_to: bool,
}

impl ViewportHighlight {
    pub fn is_ghost(&self) -> bool {
        self.id.is_none()
    }
}

/// Partition highlights by page, keeping list order; the ghost goes last
pub fn group_by_page<'a>(
    highlights: &'a [Highlight],
    ghost: Option<&'a GhostHighlight>,
) -> BTreeMap<PageNumber, Vec<LayoutEntry<'a>>> {
    let mut pages: BTreeMap<PageNumber, Vec<LayoutEntry<'a>>> = BTreeMap::new();

    let entries = highlights
        .iter()
        .map(LayoutEntry::Saved)
        .chain(ghost.map(LayoutEntry::Ghost));
    for entry in entries {
        pages.entry(entry.page_number()).or_default().push(entry);
    }

    pages
}

/// Highlights of one page, projected onto that page's viewport.
///
/// Only touches the given page, so it can run per page-ready event.
pub fn page_layout(
    highlights: &[Highlight],
    ghost: Option<&GhostHighlight>,
    page: PageNumber,
    viewport: &PageViewport,
    scrolled_to: Option<&HighlightId>,
) -> Vec<ViewportHighlight> {
    let saved = highlights
        .iter()
        .filter(|h| h.position.page_number == page)
        .map(|h| ViewportHighlight {
            id: Some(h.id.clone()),
            position: h.position.to_viewport(viewport),
            content: h.content.clone(),
            comment: Some(h.comment.clone()),
            is_scrolled_to: scrolled_to == Some(&h.id),
        });
    let ghost = ghost
        .filter(|g| g.position.page_number == page)
        .map(|g| ViewportHighlight {
            id: None,
            position: g.position.to_viewport(viewport),
            content: g.content.clone(),
            comment: None,
            is_scrolled_to: false,
        });

    saved.chain(ghost).collect()
}

/// First highlight in list order containing the point
pub fn hit_test(layout: &[ViewportHighlight], x: f64, y: f64) -> Option<&ViewportHighlight> {
    layout.iter().find(|h| h.position.contains_point(x, y))
}
