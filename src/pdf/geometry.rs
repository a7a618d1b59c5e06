//! Rectangle primitives and coordinate-space conversion
//!
//! Two spaces are in play. *Viewport* rectangles are in pixels and only valid
//! for the zoom level they were measured at. *Scaled* rectangles are fractions
//! of the page size, so they survive zoom changes and are the only form that
//! gets persisted.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::PageNumber;
use crate::error::{AnnotatorError, Result};

/// Vertical tolerance for treating two rectangles as the same text line
pub const DEFAULT_SAME_LINE_MARGIN: f64 = 5.0;
/// Horizontal gap still treated as adjacent on the same line
pub const DEFAULT_NEXT_TO_MARGIN: f64 = 10.0;

/// Axis-aligned rectangle in viewport pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Shift by the given offset, e.g. to make container coordinates page-relative
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }

    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    /// Strict containment on all four edges
    fn is_strictly_inside(&self, other: &Self) -> bool {
        self.top > other.top
            && self.left > other.left
            && self.bottom() < other.bottom()
            && self.right() < other.right()
    }

    fn is_same_line(&self, other: &Self, margin: f64) -> bool {
        (self.top - other.top).abs() < margin && (self.height - other.height).abs() < margin
    }

    /// `other` starts within this rectangle's horizontal span
    fn overlaps(&self, other: &Self) -> bool {
        self.left <= other.left && other.left <= self.right()
    }

    fn is_next_to(&self, other: &Self, margin: f64) -> bool {
        self.left <= other.left
            && self.right() <= other.right()
            && other.left - self.right() <= margin
    }

    fn absorb(&mut self, other: &Self) {
        self.width = (other.right() - self.left).max(self.width);
        self.height = self.height.max(other.height);
    }
}

/// Axis-aligned rectangle expressed as fractions of the page size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaledRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ScaledRect {
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Per-page viewport as reported by the rendering engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageViewport {
    /// Page width in pixels at the current scale
    pub width: f64,
    /// Page height in pixels at the current scale
    pub height: f64,
    /// Scale the page was rendered at
    pub scale: f64,
}

impl PageViewport {
    #[must_use]
    pub const fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Page width at scale 1.0
    #[must_use]
    pub fn unscaled_width(&self) -> f64 {
        if self.scale > 0.0 {
            self.width / self.scale
        } else {
            self.width
        }
    }

    /// Convert a viewport point to PDF user space (bottom-left origin, unscaled)
    #[must_use]
    pub fn to_pdf_point(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        (x / scale, (self.height - y) / scale)
    }

    fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Express a viewport rectangle as fractions of the page size.
///
/// With `use_pdf_coordinates` the vertical axis is flipped first so that
/// `top` counts from the bottom edge.
#[must_use]
pub fn viewport_to_scaled(
    rect: &ViewportRect,
    viewport: &PageViewport,
    use_pdf_coordinates: bool,
) -> ScaledRect {
    if viewport.is_degenerate() {
        return ScaledRect::default();
    }

    let top = if use_pdf_coordinates {
        viewport.height - rect.bottom()
    } else {
        rect.top
    };

    ScaledRect {
        top: top / viewport.height,
        left: rect.left / viewport.width,
        width: rect.width / viewport.width,
        height: rect.height / viewport.height,
    }
}

/// Inverse of [`viewport_to_scaled`]
#[must_use]
pub fn scaled_to_viewport(
    rect: &ScaledRect,
    viewport: &PageViewport,
    use_pdf_coordinates: bool,
) -> ViewportRect {
    let top = rect.top * viewport.height;
    let height = rect.height * viewport.height;
    let top = if use_pdf_coordinates {
        viewport.height - (top + height)
    } else {
        top
    };

    ViewportRect {
        top,
        left: rect.left * viewport.width,
        width: rect.width * viewport.width,
        height,
    }
}

/// Tolerances used when merging selection rectangles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeMargins {
    pub same_line: f64,
    pub next_to: f64,
}

impl Default for MergeMargins {
    fn default() -> Self {
        Self {
            same_line: DEFAULT_SAME_LINE_MARGIN,
            next_to: DEFAULT_NEXT_TO_MARGIN,
        }
    }
}

/// Merge the per-glyph-run rectangles of a text selection into one
/// rectangle per visual line, using the default margins.
#[must_use]
pub fn optimize_client_rects(rects: &[ViewportRect]) -> Vec<ViewportRect> {
    optimize_client_rects_with(rects, MergeMargins::default())
}

/// Like [`optimize_client_rects`] with explicit margins.
///
/// Runs until nothing changes, so feeding the output back in is a no-op.
#[must_use]
pub fn optimize_client_rects_with(
    rects: &[ViewportRect],
    margins: MergeMargins,
) -> Vec<ViewportRect> {
    let mut rects = rects.to_vec();

    loop {
        rects.sort_by(compare_reading_order);

        let before = rects.len();
        let snapshot = rects.clone();
        rects.retain(|a| !snapshot.iter().any(|b| a.is_strictly_inside(b)));

        let merged = merge_pass(&mut rects, margins);
        if !merged && rects.len() == before {
            return rects;
        }
    }
}

fn compare_reading_order(a: &ViewportRect, b: &ViewportRect) -> Ordering {
    a.top
        .total_cmp(&b.top)
        .then_with(|| a.left.total_cmp(&b.left))
}

fn merge_pass(rects: &mut Vec<ViewportRect>, margins: MergeMargins) -> bool {
    let mut removed = vec![false; rects.len()];
    let mut changed = false;

    for i in 0..rects.len() {
        for j in 0..rects.len() {
            if i == j || removed[i] || removed[j] {
                continue;
            }
            let (a, b) = (rects[i], rects[j]);
            if !a.is_same_line(&b, margins.same_line) {
                continue;
            }
            if a.overlaps(&b) || a.is_next_to(&b, margins.next_to) {
                rects[i].absorb(&b);
                removed[j] = true;
                changed = true;
            }
        }
    }

    if changed {
        let mut flags = removed.into_iter();
        rects.retain(|_| !flags.next().unwrap_or(false));
    }
    changed
}

/// Smallest rectangle enclosing every input rectangle
pub fn bounding_rect(rects: &[ViewportRect]) -> Result<ViewportRect> {
    let first = rects.first().ok_or(AnnotatorError::EmptyInput)?;

    let (mut x0, mut y0, mut x1, mut y1) = (first.left, first.top, first.right(), first.bottom());
    for rect in &rects[1..] {
        x0 = x0.min(rect.left);
        y0 = y0.min(rect.top);
        x1 = x1.max(rect.right());
        y1 = y1.max(rect.bottom());
    }

    Ok(ViewportRect::new(y0, x0, x1 - x0, y1 - y0))
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Zoom-independent location of a highlight on a page
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledPosition {
    pub page_number: PageNumber,
    pub bounding_rect: ScaledRect,
    #[serde(default)]
    pub rects: Vec<ScaledRect>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_pdf_coordinates: bool,
}

impl ScaledPosition {
    /// Project onto the page's current viewport
    #[must_use]
    pub fn to_viewport(&self, viewport: &PageViewport) -> ViewportPosition {
        let flip = self.use_pdf_coordinates;
        ViewportPosition {
            page_number: self.page_number,
            bounding_rect: scaled_to_viewport(&self.bounding_rect, viewport, flip),
            rects: self
                .rects
                .iter()
                .map(|rect| scaled_to_viewport(rect, viewport, flip))
                .collect(),
        }
    }
}

/// Location of a highlight in the current viewport's pixels
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewportPosition {
    pub page_number: PageNumber,
    pub bounding_rect: ViewportRect,
    pub rects: Vec<ViewportRect>,
}

impl ViewportPosition {
    #[must_use]
    pub fn to_scaled(&self, viewport: &PageViewport) -> ScaledPosition {
        ScaledPosition {
            page_number: self.page_number,
            bounding_rect: viewport_to_scaled(&self.bounding_rect, viewport, false),
            rects: self
                .rects
                .iter()
                .map(|rect| viewport_to_scaled(rect, viewport, false))
                .collect(),
            use_pdf_coordinates: false,
        }
    }

    /// True if the point hits the bounding rect or any line rect
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.bounding_rect.contains_point(x, y)
            || self.rects.iter().any(|rect| rect.contains_point(x, y))
    }
}
