//! Annotator - drives highlight overlays for a rendered document
//!
//! The annotator sits between the rendering engine and the application
//! state. Engine events and store notifications become [`Command`]s for the
//! pure [`PageLifecycle`]; the resulting [`Effect`]s are executed here.
//!
//! Time is never read from the clock. Every entry point that can start a
//! debounce, a zoom, or a jump takes the current `Instant`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use flume::Receiver;
use log::{debug, warn};

use super::PageNumber;
use super::debounce::SelectionDebouncer;
use super::engine::{ListenerId, ListenerKind, RenderingEngine};
use super::geometry::{MergeMargins, ViewportPosition, ViewportRect};
use super::highlight::{GhostHighlight, Highlight, HighlightComment, HighlightId};
use super::layout::{hit_test, page_layout};
use super::overlay::{PageInputs, build_overlay};
use super::selection::{self, SelectionCandidate};
use super::state::{Command, Effect, PageLifecycle};
use super::store::{AnnotationState, StoreEvent};
use super::terms::{ScanTicket, TermMatchEngine, TermScan, TermSearch};
use super::types::{AreaSelection, Key, ScrollMetrics, TextSelection};
use super::zoom::{Zoom, ZoomDirection};
use crate::error::{AnnotatorError, Result};
use crate::settings::Settings;

/// Listener that settles the current jump on the first user scroll
#[derive(Clone, Copy, Debug)]
struct JumpListener {
    id: ListenerId,
    /// Scrolls before this instant come from the jump itself
    armed_at: Instant,
}

/// Highlight overlay driver for one open document
pub struct Annotator<E: RenderingEngine, S: AnnotationState> {
    engine: E,
    store: Rc<RefCell<S>>,
    events: Receiver<StoreEvent>,
    lifecycle: PageLifecycle,
    zoom: Zoom,
    debouncer: SelectionDebouncer,
    terms: TermMatchEngine,
    pending_scan: Option<ScanTicket>,
    margins: MergeMargins,
    scroll_margin: f64,
    fit_width_margin: f64,
    jump_arm_delay: Duration,
    listeners: Vec<ListenerId>,
    jump_listener: Option<JumpListener>,
    text_selection_active: bool,
    area_selection_active: bool,
}

impl<E: RenderingEngine, S: AnnotationState> Annotator<E, S> {
    pub fn new(engine: E, store: Rc<RefCell<S>>, settings: &Settings) -> Self {
        let events = store.borrow_mut().subscribe();

        Self {
            engine,
            store,
            events,
            lifecycle: PageLifecycle::new(),
            zoom: settings.zoom(),
            debouncer: SelectionDebouncer::new(settings.selection_debounce_ms),
            terms: TermMatchEngine::new(),
            pending_scan: None,
            margins: settings.merge_margins(),
            scroll_margin: settings.scroll_margin_px,
            fit_width_margin: settings.fit_width_margin,
            jump_arm_delay: settings.jump_arm_delay(),
            listeners: Vec::new(),
            jump_listener: None,
            text_selection_active: false,
            area_selection_active: false,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn store(&self) -> &Rc<RefCell<S>> {
        &self.store
    }

    pub fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    pub fn terms(&self) -> &TermMatchEngine {
        &self.terms
    }

    pub fn is_mounted(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Subscribe to the engine events the annotator reacts to
    pub fn mount(&mut self) {
        if self.is_mounted() {
            return;
        }

        self.listeners = [
            ListenerKind::KeyDown,
            ListenerKind::SelectionChange,
            ListenerKind::Scroll,
            ListenerKind::PagesInit,
            ListenerKind::TextLayerRendered,
        ]
        .into_iter()
        .map(|kind| self.engine.add_listener(kind))
        .collect();
        debug!("Mounted annotator with {} listeners", self.listeners.len());
    }

    /// Remove every listener, including a pending jump listener
    pub fn unmount(&mut self) {
        for id in self.listeners.drain(..) {
            self.engine.remove_listener(id);
        }
        if let Some(listener) = self.jump_listener.take() {
            self.engine.remove_listener(listener.id);
        }
        self.debouncer.cancel();
        let effects = self.lifecycle.apply(Command::Reset);
        debug_assert!(effects.is_empty(), "reset draws nothing");
    }

    /// Process store notifications.
    ///
    /// Call after every batch of events and after mutating the store. The
    /// first error is returned once all notifications have been handled.
    pub fn pump(&mut self, now: Instant) -> Result<()> {
        let events: Vec<StoreEvent> = self.events.try_iter().collect();
        let mut first_error = None;

        for event in events {
            let command = match event {
                StoreEvent::HighlightsChanged => Command::HighlightsChanged,
                StoreEvent::GhostChanged => Command::GhostChanged,
                StoreEvent::JumpChanged => Command::JumpChanged,
                StoreEvent::AcronymsChanged => {
                    self.restart_term_scan();
                    // Old positions are gone either way
                    Command::TermPositionsChanged
                }
                StoreEvent::ProgressChanged => continue,
            };
            if let Err(e) = self.run(command, now) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Page viewports are known
    pub fn on_pages_init(&mut self, now: Instant) -> Result<()> {
        let page_count = self.engine.page_count();
        if !self.store.borrow().acronyms().is_empty() {
            self.restart_term_scan();
        }
        self.run(Command::DocumentReady { page_count }, now)
    }

    pub fn on_text_layer_rendered(&mut self, page: PageNumber, now: Instant) -> Result<()> {
        self.run(Command::TextLayerRendered(page), now)
    }

    /// Report reading progress and settle an armed jump
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) {
        self.store
            .borrow_mut()
            .update_reading_progress(metrics.progress_percent());

        if let Some(listener) = self.jump_listener.filter(|l| now >= l.armed_at) {
            debug!("Jump settled");
            self.engine.remove_listener(listener.id);
            self.jump_listener = None;
            self.store.borrow_mut().clear_jump();
        }
    }

    /// Native selection changed; `None` or an empty selection means collapsed
    pub fn on_selection_change(&mut self, selection: Option<TextSelection>, now: Instant) {
        match selection.filter(|s| !s.client_rects.is_empty()) {
            Some(selection) => {
                self.text_selection_active = true;
                self.debouncer.register(selection, now);
            }
            None => {
                self.text_selection_active = false;
                self.debouncer.cancel();
            }
        }
    }

    /// Release a settled text selection as a highlight candidate
    pub fn tick(&mut self, now: Instant) -> Option<SelectionCandidate> {
        let selection = self.debouncer.flush_ready(now)?;
        selection::capture_text(&self.engine, &selection, self.margins)
    }

    /// The user started or stopped dragging out an area
    pub fn set_area_selection_in_progress(&mut self, active: bool) {
        self.area_selection_active = active;
        self.engine.set_text_selection_enabled(!active);
    }

    /// The user finished dragging out an area
    pub fn on_area_selection(&mut self, area: &AreaSelection) -> Option<SelectionCandidate> {
        self.set_area_selection_in_progress(false);
        selection::capture_area(&self.engine, area)
    }

    pub fn on_key_down(&mut self, key: Key) {
        if key == Key::Escape {
            self.discard_ghost();
        }
    }

    /// Mouse pressed anywhere; clicks outside the tip drop the ghost
    pub fn on_mouse_down(&mut self, on_tip: bool) {
        if !on_tip {
            self.discard_ghost();
        }
    }

    /// Keep a candidate on screen while the user writes a comment
    pub fn confirm_candidate(&mut self, candidate: &SelectionCandidate) {
        self.store.borrow_mut().set_ghost(Some(GhostHighlight {
            position: candidate.scaled_position.clone(),
            content: candidate.content.clone(),
        }));
    }

    pub fn discard_ghost(&mut self) {
        self.store.borrow_mut().set_ghost(None);
    }

    /// Turn the ghost into a persisted highlight with its server id
    pub fn save_ghost(&mut self, id: HighlightId, comment: HighlightComment) -> Option<Highlight> {
        let mut store = self.store.borrow_mut();
        let ghost = store.ghost()?.clone();
        let highlight = Highlight {
            id,
            position: ghost.position,
            content: ghost.content,
            comment,
        };
        store.add_highlight(highlight.clone());
        store.set_ghost(None);
        Some(highlight)
    }

    /// Highlight tips stay hidden while the user is selecting something
    pub fn can_show_tip(&self) -> bool {
        !self.text_selection_active
            && !self.area_selection_active
            && self.store.borrow().ghost().is_none()
    }

    /// Saved highlight under a page-relative point
    pub fn highlight_at(&self, page: PageNumber, x: f64, y: f64) -> Option<HighlightId> {
        let view = self.engine.page_view(page)?;
        let store = self.store.borrow();
        let layout = page_layout(store.highlights(), None, page, &view.viewport, None);
        hit_test(&layout, x, y).and_then(|h| h.id.clone())
    }

    /// Move or resize an area highlight to a page-relative rectangle
    pub fn resize_area_highlight(&mut self, id: &HighlightId, rect: ViewportRect) -> Result<()> {
        let (page, is_area) = {
            let store = self.store.borrow();
            let highlight = store
                .highlights()
                .iter()
                .find(|h| &h.id == id)
                .ok_or_else(|| AnnotatorError::UnknownHighlight(id.clone()))?;
            (highlight.page_number(), highlight.content.is_area())
        };
        if !is_area {
            warn!("Highlight {id} is not an area highlight, ignoring resize");
            return Ok(());
        }

        let view = self
            .engine
            .page_view(page)
            .ok_or(AnnotatorError::PageNotRendered(page))?;
        let position = ViewportPosition {
            page_number: page,
            bounding_rect: rect,
            rects: Vec::new(),
        }
        .to_scaled(&view.viewport);
        let image = selection::screenshot_area(&self.engine, &view, &rect);

        self.store
            .borrow_mut()
            .update_area_highlight(id, position, image)
    }

    /// Zoom by one step. Returns the new scale, or `None` while settling.
    pub fn zoom(&mut self, direction: ZoomDirection, now: Instant) -> Result<Option<f64>> {
        let Some(scale) = self.zoom.request(direction, self.engine.current_scale(), now) else {
            return Ok(None);
        };
        debug!("Zoom to {scale:.2}");
        self.engine.set_current_scale(scale);
        self.run(Command::ZoomChanged, now)?;
        Ok(Some(scale))
    }

    /// Scan ticket for the current acronym set, if one is waiting to run
    pub fn take_term_scan(&mut self) -> Option<ScanTicket> {
        self.pending_scan.take()
    }

    /// Install finished scan results. Returns false for a superseded scan.
    pub fn apply_term_scan(&mut self, scan: TermScan, now: Instant) -> Result<bool> {
        if !self.terms.apply(scan) {
            return Ok(false);
        }
        self.run(Command::TermPositionsChanged, now)?;
        Ok(true)
    }

    /// Run the waiting scan, if any, and apply its results
    pub async fn refresh_terms<T: TermSearch + ?Sized>(
        &mut self,
        search: &mut T,
        now: Instant,
    ) -> Result<bool> {
        let Some(ticket) = self.pending_scan.take() else {
            return Ok(false);
        };
        let scan = ticket.run(search).await;
        self.apply_term_scan(scan, now)
    }

    fn restart_term_scan(&mut self) {
        let acronyms = self.store.borrow().acronyms().clone();
        self.pending_scan = self.terms.begin_scan(acronyms, self.engine.page_count());
    }

    fn run(&mut self, command: Command, now: Instant) -> Result<()> {
        let retry_jump = match command {
            Command::TextLayerRendered(page) => self.jump_waits_on(page),
            _ => false,
        };
        let mut queue: VecDeque<Effect> = self.lifecycle.apply(command).into();
        if retry_jump {
            queue.push_front(Effect::ProcessJump);
        }
        let mut first_error = None;

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::FitToWidth => {
                    if self.fit_to_width() {
                        queue.extend(self.lifecycle.apply(Command::ZoomChanged));
                    }
                }
                Effect::ProcessJump => {
                    if let Err(e) = self.process_jump(now) {
                        first_error.get_or_insert(e);
                    }
                }
                Effect::DrawPage(page) => {
                    let outcome = self.draw_page(page);
                    queue.extend(self.lifecycle.apply(outcome));
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn fit_to_width(&mut self) -> bool {
        let Some(view) = self.engine.page_view(1) else {
            warn!("Cannot fit to width, first page has no viewport");
            return false;
        };
        let scale = self
            .zoom
            .fit_width(self.engine.container_width(), &view.viewport, self.fit_width_margin);
        debug!("Fit to width at scale {scale:.2}");
        self.engine.set_current_scale(scale);
        true
    }

    /// A paper jump to `page` was issued but never scrolled
    fn jump_waits_on(&self, page: PageNumber) -> bool {
        if self.jump_listener.is_some() {
            return false;
        }
        self.store
            .borrow()
            .jump_data()
            .filter(|jump| jump.is_for_paper())
            .and_then(|jump| jump.target().ok())
            .is_some_and(|target| target.page_number() == page)
    }

    fn process_jump(&mut self, now: Instant) -> Result<()> {
        if let Some(listener) = self.jump_listener.take() {
            self.engine.remove_listener(listener.id);
        }

        let Some(jump) = self
            .store
            .borrow()
            .jump_data()
            .filter(|jump| jump.is_for_paper())
            .cloned()
        else {
            return Ok(());
        };
        if !self.lifecycle.is_document_ready() {
            debug!("Deferring jump until the document is ready");
            return Ok(());
        }

        let target = jump.target()?;
        let page = target.page_number();
        if page as usize > self.lifecycle.page_count() {
            return Err(AnnotatorError::malformed_jump(format!(
                "page {page} is out of range ({} pages)",
                self.lifecycle.page_count()
            )));
        }
        let Some(view) = self.engine.page_view(page) else {
            warn!("Skipping jump, page {page} has no viewport");
            return Ok(());
        };

        let destination = target.destination(&view.viewport, self.scroll_margin);
        debug!("Jumping to page {page} at {:.1}", destination.top);
        self.engine.scroll_page_into_view(destination);

        let id = self.engine.add_listener(ListenerKind::JumpSettle);
        self.jump_listener = Some(JumpListener {
            id,
            armed_at: now + self.jump_arm_delay,
        });
        Ok(())
    }

    fn draw_page(&mut self, page: PageNumber) -> Command {
        let Some(view) = self.engine.page_view(page) else {
            warn!("Skipping draw, page {page} has no viewport");
            return Command::PageDrawFailed(page);
        };

        let overlay = {
            let store = self.store.borrow();
            let scrolled_to = store
                .jump_data()
                .filter(|jump| jump.is_for_paper())
                .and_then(|jump| jump.scrolled_to());
            build_overlay(
                PageInputs {
                    page_number: page,
                    viewport: &view.viewport,
                    text_layer: self.engine.text_layer(page),
                },
                store.highlights(),
                store.ghost(),
                scrolled_to,
                &self.terms,
            )
        };

        match self.engine.apply_overlay(overlay) {
            Ok(()) => Command::PageDrawn(page),
            Err(e) => {
                warn!("Skipping draw of page {page}: {e}");
                Command::PageDrawFailed(page)
            }
        }
    }
}

impl<E: RenderingEngine, S: AnnotationState> Drop for Annotator<E, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
