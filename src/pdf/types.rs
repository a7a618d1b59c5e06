//! Core types exchanged with the rendering engine

use super::PageNumber;
use super::geometry::{PageViewport, ViewportRect};

/// Opaque handle for a node in the rendered document tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// What the engine knows about one rendered page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageView {
    /// Page number (1-indexed)
    pub page_number: PageNumber,
    /// Transform for the current zoom level
    pub viewport: PageViewport,
    /// Left edge of the page element in container coordinates
    pub offset_left: f64,
    /// Top edge of the page element in container coordinates
    pub offset_top: f64,
}

impl PageView {
    /// Translate a container-space rectangle into page-relative pixels
    #[must_use]
    pub fn to_page_relative(&self, rect: &ViewportRect) -> ViewportRect {
        rect.translate(-self.offset_left, -self.offset_top)
    }
}

/// A native text selection as reported by the viewer
#[derive(Clone, Debug, PartialEq)]
pub struct TextSelection {
    /// Node the selection range starts in
    pub anchor: NodeId,
    /// Client rectangles of the range, in container coordinates
    pub client_rects: Vec<ViewportRect>,
    /// Selected text
    pub text: String,
}

/// A rectangle the user dragged out with the mouse
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaSelection {
    /// Node the drag started on
    pub anchor: NodeId,
    /// Dragged rectangle in container coordinates
    pub rect: ViewportRect,
}

/// Scroll target in PDF user space ("XYZ" destination)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollDestination {
    pub page_number: PageNumber,
    pub left: f64,
    pub top: f64,
}

/// Scroll state of the viewer container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    /// Full height of the scrolled content
    pub viewer_height: f64,
    /// Visible height of the container
    pub container_height: f64,
}

impl ScrollMetrics {
    /// Reading progress in percent (0..=100)
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let max_y = (self.viewer_height - self.container_height).max(0.0);
        if max_y <= 0.0 {
            return 0.0;
        }
        (self.scroll_top / max_y).clamp(0.0, 1.0) * 100.0
    }
}

/// Keys the annotator reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        let metrics = ScrollMetrics {
            scroll_top: 500.0,
            viewer_height: 1000.0,
            container_height: 600.0,
        };
        assert!((metrics.progress_percent() - 100.0).abs() < 1e-9);

        let metrics = ScrollMetrics {
            scroll_top: 100.0,
            viewer_height: 1000.0,
            container_height: 600.0,
        };
        assert!((metrics.progress_percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn progress_without_scroll_room_is_zero() {
        let metrics = ScrollMetrics {
            scroll_top: 0.0,
            viewer_height: 400.0,
            container_height: 600.0,
        };
        assert_eq!(metrics.progress_percent(), 0.0);
    }

    #[test]
    fn page_relative_subtracts_offset() {
        let view = PageView {
            page_number: 2,
            viewport: PageViewport::new(600.0, 800.0, 1.0),
            offset_left: 20.0,
            offset_top: 810.0,
        };
        let rect = view.to_page_relative(&ViewportRect::new(900.0, 30.0, 10.0, 10.0));
        assert_eq!(rect, ViewportRect::new(90.0, 10.0, 10.0, 10.0));
    }
}
