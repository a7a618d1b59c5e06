//! Application state shared between the annotator and the UI
//!
//! The store is injected into the annotator as `Rc<RefCell<S>>`. Every
//! mutation publishes a [`StoreEvent`] to all subscribers; the annotator
//! drains its receiver in `pump` and redraws what changed.

use std::collections::BTreeMap;

use flume::{Receiver, Sender};
use log::debug;

use super::geometry::ScaledPosition;
use super::highlight::{GhostHighlight, Highlight, HighlightId};
use super::jump::JumpData;
use super::terms::TermStyle;
use crate::error::{AnnotatorError, Result};

/// Change notification published by the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    HighlightsChanged,
    GhostChanged,
    JumpChanged,
    AcronymsChanged,
    ProgressChanged,
}

/// What the annotator reads from and writes to the application state
pub trait AnnotationState {
    /// Visible highlights, newest first
    fn highlights(&self) -> &[Highlight];

    fn ghost(&self) -> Option<&GhostHighlight>;

    fn jump_data(&self) -> Option<&JumpData>;

    /// Terms to mark in the document, with their display style
    fn acronyms(&self) -> &BTreeMap<String, TermStyle>;

    fn set_ghost(&mut self, ghost: Option<GhostHighlight>);

    fn add_highlight(&mut self, highlight: Highlight);

    /// Replace an area highlight's position and screenshot together
    fn update_area_highlight(
        &mut self,
        id: &HighlightId,
        position: ScaledPosition,
        image: Option<String>,
    ) -> Result<()>;

    fn clear_jump(&mut self);

    fn update_reading_progress(&mut self, percent: f64);

    /// Receive a notification for every later mutation
    fn subscribe(&mut self) -> Receiver<StoreEvent>;
}

/// In-memory state for one open paper
#[derive(Debug, Default)]
pub struct PaperStore {
    highlights: Vec<Highlight>,
    hidden: Vec<Highlight>,
    ghost: Option<GhostHighlight>,
    jump: Option<JumpData>,
    acronyms: BTreeMap<String, TermStyle>,
    reading_progress: f64,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl PaperStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&mut self, event: StoreEvent) {
        // Dropped receivers unsubscribe implicitly
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Replace all highlights, e.g. after loading a paper
    pub fn set_highlights(&mut self, highlights: Vec<Highlight>) {
        debug!("Loaded {} highlights", highlights.len());
        self.highlights = highlights;
        self.hidden.clear();
        self.publish(StoreEvent::HighlightsChanged);
    }

    /// Replace a highlight's record, e.g. after editing its comment
    pub fn update_highlight(&mut self, highlight: Highlight) -> Result<()> {
        let slot = self
            .highlights
            .iter_mut()
            .chain(self.hidden.iter_mut())
            .find(|h| h.id == highlight.id)
            .ok_or_else(|| AnnotatorError::UnknownHighlight(highlight.id.clone()))?;
        *slot = highlight;
        self.publish(StoreEvent::HighlightsChanged);
        Ok(())
    }

    pub fn remove_highlight(&mut self, id: &HighlightId) -> Result<Highlight> {
        let removed = if let Some(index) = self.highlights.iter().position(|h| &h.id == id) {
            self.highlights.remove(index)
        } else if let Some(index) = self.hidden.iter().position(|h| &h.id == id) {
            self.hidden.remove(index)
        } else {
            return Err(AnnotatorError::UnknownHighlight(id.clone()));
        };
        self.publish(StoreEvent::HighlightsChanged);
        Ok(removed)
    }

    /// Hide every highlight, or bring the hidden ones back if any are hidden.
    ///
    /// Shown highlights go after the visible ones in their original order.
    /// Returns whether highlights are visible afterwards.
    pub fn toggle_highlights(&mut self) -> bool {
        let visible = if self.hidden.is_empty() {
            self.hidden.append(&mut self.highlights);
            false
        } else {
            self.highlights.append(&mut self.hidden);
            true
        };
        self.publish(StoreEvent::HighlightsChanged);
        visible
    }

    pub fn hidden_highlights(&self) -> &[Highlight] {
        &self.hidden
    }

    pub fn find_highlight(&self, id: &HighlightId) -> Option<&Highlight> {
        self.highlights.iter().chain(self.hidden.iter()).find(|h| &h.id == id)
    }

    pub fn jump_to(&mut self, jump: JumpData) {
        self.jump = Some(jump);
        self.publish(StoreEvent::JumpChanged);
    }

    pub fn set_acronyms(&mut self, acronyms: BTreeMap<String, TermStyle>) {
        if self.acronyms == acronyms {
            return;
        }
        self.acronyms = acronyms;
        self.publish(StoreEvent::AcronymsChanged);
    }

    pub fn reading_progress(&self) -> f64 {
        self.reading_progress
    }
}

impl AnnotationState for PaperStore {
    fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    fn ghost(&self) -> Option<&GhostHighlight> {
        self.ghost.as_ref()
    }

    fn jump_data(&self) -> Option<&JumpData> {
        self.jump.as_ref()
    }

    fn acronyms(&self) -> &BTreeMap<String, TermStyle> {
        &self.acronyms
    }

    fn set_ghost(&mut self, ghost: Option<GhostHighlight>) {
        if self.ghost.is_none() && ghost.is_none() {
            return;
        }
        self.ghost = ghost;
        self.publish(StoreEvent::GhostChanged);
    }

    fn add_highlight(&mut self, highlight: Highlight) {
        self.highlights.insert(0, highlight);
        self.publish(StoreEvent::HighlightsChanged);
    }

    fn update_area_highlight(
        &mut self,
        id: &HighlightId,
        position: ScaledPosition,
        image: Option<String>,
    ) -> Result<()> {
        let highlight = self
            .highlights
            .iter_mut()
            .find(|h| &h.id == id)
            .ok_or_else(|| AnnotatorError::UnknownHighlight(id.clone()))?;
        highlight.position = position;
        if image.is_some() {
            highlight.content.image = image;
        }
        self.publish(StoreEvent::HighlightsChanged);
        Ok(())
    }

    fn clear_jump(&mut self) {
        if self.jump.take().is_some() {
            self.publish(StoreEvent::JumpChanged);
        }
    }

    fn update_reading_progress(&mut self, percent: f64) {
        if (self.reading_progress - percent).abs() < f64::EPSILON {
            return;
        }
        self.reading_progress = percent;
        self.publish(StoreEvent::ProgressChanged);
    }

    fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }
}
