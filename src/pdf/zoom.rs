//! Zoom state for the PDF viewer
//!
//! Each user action changes the scale by a fixed step. While the render for
//! one change is settling, further requests are dropped so that a burst of
//! clicks or key repeats cannot run the zoom away.

use std::time::{Duration, Instant};

use log::debug;

use super::geometry::PageViewport;

/// Zoom direction for a single user action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    fn sign(self) -> f64 {
        match self {
            Self::In => 1.0,
            Self::Out => -1.0,
        }
    }
}

#[derive(Debug)]
pub struct Zoom {
    step: f64,
    settle: Duration,
    min_scale: f64,
    settling_until: Option<Instant>,
}

impl Default for Zoom {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP, Self::DEFAULT_SETTLE_MS, Self::MIN_SCALE)
    }
}

impl Zoom {
    /// Scale change per action
    pub const DEFAULT_STEP: f64 = 0.05;
    /// Time a zoom render gets to settle before the next request is accepted
    pub const DEFAULT_SETTLE_MS: u64 = 200;
    /// Minimum allowed scale
    pub const MIN_SCALE: f64 = 0.1;
    /// Subtracted from the fit-to-width scale so the page does not touch the edges
    pub const FIT_WIDTH_MARGIN: f64 = 0.05;

    pub fn new(step: f64, settle_ms: u64, min_scale: f64) -> Self {
        Self {
            step,
            settle: Duration::from_millis(settle_ms),
            min_scale,
            settling_until: None,
        }
    }

    /// Compute the next scale, or `None` while a previous zoom is settling
    pub fn request(&mut self, direction: ZoomDirection, current: f64, now: Instant) -> Option<f64> {
        if self.is_settling(now) {
            debug!("Zoom request dropped, previous zoom still settling");
            return None;
        }

        self.settling_until = Some(now + self.settle);
        Some(self.clamp_scale(current + direction.sign() * self.step))
    }

    pub fn is_settling(&self, now: Instant) -> bool {
        self.settling_until.is_some_and(|until| now < until)
    }

    /// Scale that fits the page width into the container
    pub fn fit_width(&self, container_width: f64, viewport: &PageViewport, margin: f64) -> f64 {
        let page_width = viewport.unscaled_width();
        if page_width <= 0.0 {
            return 1.0;
        }
        self.clamp_scale(container_width / page_width - margin)
    }

    /// Clamp scale to valid range, handling NaN/Inf
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        if !scale.is_finite() {
            1.0
        } else {
            scale.max(self.min_scale)
        }
    }
}
