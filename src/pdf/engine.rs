//! Boundary to the page rendering engine
//!
//! The engine renders pages, owns their DOM/canvas, and reports readiness.
//! The annotator only reads viewports and text layers from it and asks it to
//! scroll, zoom, and replace overlay contents.

use image::RgbaImage;

use super::PageNumber;
use super::overlay::OverlaySpec;
use super::text_layer::TextLayer;
use super::types::{NodeId, PageView, ScrollDestination};
use crate::error::Result;

/// Handle returned when registering a listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Event sources the annotator subscribes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Document-level keydown
    KeyDown,
    /// Document-level selection change
    SelectionChange,
    /// Viewer container scroll (reading progress)
    Scroll,
    /// First page laid out, viewports known
    PagesInit,
    /// A page's text layer finished rendering
    TextLayerRendered,
    /// One-shot scroll listener that settles a jump
    JumpSettle,
}

pub trait RenderingEngine {
    fn page_count(&self) -> usize;

    /// Viewport and placement of a page, if it has been laid out
    fn page_view(&self, page: PageNumber) -> Option<PageView>;

    /// Page containing the given node, if any
    fn page_from_node(&self, node: NodeId) -> Option<PageNumber>;

    /// Rendered text layer of a page, if ready
    fn text_layer(&self, page: PageNumber) -> Option<&TextLayer>;

    /// Backing canvas of a page, if rendered
    fn canvas(&self, page: PageNumber) -> Option<&RgbaImage>;

    /// Visible width of the viewer container in pixels
    fn container_width(&self) -> f64;

    fn current_scale(&self) -> f64;

    fn set_current_scale(&mut self, scale: f64);

    fn scroll_page_into_view(&mut self, destination: ScrollDestination);

    /// Replace the page's overlay contents
    fn apply_overlay(&mut self, overlay: OverlaySpec) -> Result<()>;

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Native text selection is suspended while an area is being dragged
    fn set_text_selection_enabled(&mut self, enabled: bool);
}
