//! Test doubles for the rendering engine and fixture builders

use std::collections::{BTreeMap, HashMap, HashSet};

use image::{Rgba, RgbaImage};

use crate::error::{AnnotatorError, Result};
use crate::pdf::{
    Highlight, HighlightComment, HighlightContent, HighlightId, ListenerId, ListenerKind, NodeId,
    OverlaySpec, PageNumber, PageView, PageViewport, RenderingEngine, ScaledPosition, ScaledRect,
    ScrollDestination, TextLayer,
};

/// Vertical gap between pages in the fake viewer
pub const PAGE_GAP: f64 = 10.0;

/// In-memory rendering engine that records what the annotator asks of it
pub struct FakeEngine {
    page_count: usize,
    unscaled_width: f64,
    unscaled_height: f64,
    scale: f64,
    container_width: f64,
    nodes: HashMap<NodeId, PageNumber>,
    text_layers: HashMap<PageNumber, TextLayer>,
    canvases: HashMap<PageNumber, RgbaImage>,
    missing_containers: HashSet<PageNumber>,
    laid_out: bool,
    overlays: BTreeMap<PageNumber, OverlaySpec>,
    overlay_writes: usize,
    scroll_calls: Vec<ScrollDestination>,
    listeners: HashMap<ListenerId, ListenerKind>,
    next_listener: u64,
    text_selection_enabled: bool,
}

impl FakeEngine {
    /// Pages of equal size stacked vertically, laid out and with canvases
    pub fn new(page_count: usize, viewport: PageViewport) -> Self {
        let canvases = (1..=page_count as PageNumber)
            .map(|page| {
                let canvas = RgbaImage::from_pixel(
                    viewport.width as u32,
                    viewport.height as u32,
                    Rgba([255, 255, 255, 255]),
                );
                (page, canvas)
            })
            .collect();

        Self {
            page_count,
            unscaled_width: viewport.width / viewport.scale,
            unscaled_height: viewport.height / viewport.scale,
            scale: viewport.scale,
            container_width: viewport.width,
            nodes: HashMap::new(),
            text_layers: HashMap::new(),
            canvases,
            missing_containers: HashSet::new(),
            laid_out: true,
            overlays: BTreeMap::new(),
            overlay_writes: 0,
            scroll_calls: Vec::new(),
            listeners: HashMap::new(),
            next_listener: 1,
            text_selection_enabled: true,
        }
    }

    /// Make nodes resolve to a page
    pub fn map_node(&mut self, node: NodeId, page: PageNumber) {
        self.nodes.insert(node, page);
    }

    pub fn set_text_layer(&mut self, page: PageNumber, layer: TextLayer) {
        self.text_layers.insert(page, layer);
    }

    pub fn remove_canvas(&mut self, page: PageNumber) {
        self.canvases.remove(&page);
    }

    /// Overlay writes to this page fail with `MissingLayer`
    pub fn remove_container(&mut self, page: PageNumber) {
        self.missing_containers.insert(page);
    }

    pub fn restore_container(&mut self, page: PageNumber) {
        self.missing_containers.remove(&page);
    }

    /// Pages report no viewport until laid out again
    pub fn set_laid_out(&mut self, laid_out: bool) {
        self.laid_out = laid_out;
    }

    pub fn set_container_width(&mut self, width: f64) {
        self.container_width = width;
    }

    /// Last overlay applied to a page
    pub fn overlay(&self, page: PageNumber) -> Option<&OverlaySpec> {
        self.overlays.get(&page)
    }

    pub fn overlays(&self) -> &BTreeMap<PageNumber, OverlaySpec> {
        &self.overlays
    }

    /// Number of successful overlay writes across all pages
    pub fn overlay_writes(&self) -> usize {
        self.overlay_writes
    }

    pub fn scroll_calls(&self) -> &[ScrollDestination] {
        &self.scroll_calls
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners_of(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|k| **k == kind).count()
    }

    pub fn text_selection_enabled(&self) -> bool {
        self.text_selection_enabled
    }

    fn viewport(&self) -> PageViewport {
        PageViewport::new(
            self.unscaled_width * self.scale,
            self.unscaled_height * self.scale,
            self.scale,
        )
    }
}

impl RenderingEngine for FakeEngine {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_view(&self, page: PageNumber) -> Option<PageView> {
        if !self.laid_out || page == 0 || page as usize > self.page_count {
            return None;
        }
        let viewport = self.viewport();
        Some(PageView {
            page_number: page,
            viewport,
            offset_left: 0.0,
            offset_top: f64::from(page - 1) * (viewport.height + PAGE_GAP),
        })
    }

    fn page_from_node(&self, node: NodeId) -> Option<PageNumber> {
        self.nodes.get(&node).copied()
    }

    fn text_layer(&self, page: PageNumber) -> Option<&TextLayer> {
        self.text_layers.get(&page)
    }

    fn canvas(&self, page: PageNumber) -> Option<&RgbaImage> {
        self.canvases.get(&page)
    }

    fn container_width(&self) -> f64 {
        self.container_width
    }

    fn current_scale(&self) -> f64 {
        self.scale
    }

    fn set_current_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn scroll_page_into_view(&mut self, destination: ScrollDestination) {
        self.scroll_calls.push(destination);
    }

    fn apply_overlay(&mut self, overlay: OverlaySpec) -> Result<()> {
        if self.missing_containers.contains(&overlay.page_number) {
            return Err(AnnotatorError::MissingLayer(overlay.page_number));
        }
        self.overlay_writes += 1;
        self.overlays.insert(overlay.page_number, overlay);
        Ok(())
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn set_text_selection_enabled(&mut self, enabled: bool) {
        self.text_selection_enabled = enabled;
    }
}

/// Text highlight with a single line rect equal to its bounding rect
pub fn text_highlight(id: &str, page: PageNumber, rect: ScaledRect) -> Highlight {
    Highlight {
        id: HighlightId::new(id),
        position: ScaledPosition {
            page_number: page,
            bounding_rect: rect,
            rects: vec![rect],
            use_pdf_coordinates: false,
        },
        content: HighlightContent::text(id),
        comment: HighlightComment::default(),
    }
}
