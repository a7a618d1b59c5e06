//! Page lifecycle state management

use log::{debug, warn};

use super::PageNumber;

/// Per-page readiness
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageState {
    /// No text layer yet, nothing can be drawn
    #[default]
    Unrendered,
    /// Text layer rendered, overlay not (or no longer) up to date
    TextLayerReady,
    /// Overlay drawn for the current state
    HighlightsDrawn,
}

impl PageState {
    fn is_ready(self) -> bool {
        matches!(self, Self::TextLayerReady | Self::HighlightsDrawn)
    }
}

/// Readiness of every page of the open document
#[derive(Clone, Debug, Default)]
pub struct PageLifecycle {
    pages: Vec<PageState>,
}

impl PageLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_document_ready(&self) -> bool {
        !self.pages.is_empty()
    }

    /// State of a page (1-indexed), `None` when out of range
    #[must_use]
    pub fn page_state(&self, page: PageNumber) -> Option<PageState> {
        let index = (page as usize).checked_sub(1)?;
        self.pages.get(index).copied()
    }

    /// Pages whose text layer is rendered, ascending
    #[must_use]
    pub fn ready_pages(&self) -> Vec<PageNumber> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_ready())
            .map(|(index, _)| index as PageNumber + 1)
            .collect()
    }

    fn slot(&mut self, page: PageNumber) -> Option<&mut PageState> {
        let index = (page as usize).checked_sub(1)?;
        self.pages.get_mut(index)
    }

    fn redraw_ready(&self) -> Vec<Effect> {
        self.ready_pages().into_iter().map(Effect::DrawPage).collect()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::DocumentReady { page_count } => {
                debug!("Document ready with {page_count} pages");
                self.pages.resize(page_count, PageState::Unrendered);
                vec![Effect::FitToWidth, Effect::ProcessJump]
            }

            Command::TextLayerRendered(page) => match self.slot(page) {
                Some(state) => {
                    *state = PageState::TextLayerReady;
                    vec![Effect::DrawPage(page)]
                }
                None => {
                    warn!(
                        "Ignoring text layer for page {page}, document has {} pages",
                        self.pages.len()
                    );
                    vec![]
                }
            },

            Command::HighlightsChanged
            | Command::GhostChanged
            | Command::ZoomChanged
            | Command::TermPositionsChanged => self.redraw_ready(),

            Command::JumpChanged => {
                let mut effects = vec![Effect::ProcessJump];
                effects.extend(self.redraw_ready());
                effects
            }

            Command::PageDrawn(page) => {
                if let Some(state) = self.slot(page).filter(|state| state.is_ready()) {
                    *state = PageState::HighlightsDrawn;
                }
                vec![]
            }

            Command::PageDrawFailed(page) => {
                if let Some(state) = self.slot(page).filter(|state| state.is_ready()) {
                    *state = PageState::TextLayerReady;
                }
                vec![]
            }

            Command::Reset => {
                self.pages.fill(PageState::Unrendered);
                vec![]
            }
        }
    }
}

/// Commands that modify page lifecycle state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Page viewports are known
    DocumentReady { page_count: usize },
    /// A page's text layer finished rendering (1-indexed)
    TextLayerRendered(PageNumber),
    HighlightsChanged,
    GhostChanged,
    ZoomChanged,
    TermPositionsChanged,
    JumpChanged,
    /// The overlay of a page was replaced
    PageDrawn(PageNumber),
    /// Drawing a page was skipped
    PageDrawFailed(PageNumber),
    /// Listeners were torn down
    Reset,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Fit the first page's width into the container
    FitToWidth,
    /// Scroll to the pending jump target, if any
    ProcessJump,
    /// Rebuild and apply the overlay of a page
    DrawPage(PageNumber),
}
