//! PDF annotation core

mod annotator;
mod debounce;
mod engine;
mod geometry;
mod highlight;
mod jump;
mod layout;
mod overlay;
mod screenshot;
mod selection;
mod state;
mod store;
mod terms;
mod text_layer;
mod types;
mod zoom;

/// Page number as shown to the user (1-indexed)
pub type PageNumber = u32;

pub use annotator::Annotator;
pub use debounce::{DEFAULT_SELECTION_DEBOUNCE_MS, SelectionDebouncer};
pub use engine::{ListenerId, ListenerKind, RenderingEngine};
pub use geometry::*;
pub use highlight::{
    GhostHighlight, Highlight, HighlightComment, HighlightContent, HighlightId, Visibility,
    VisibilityMode,
};
pub use jump::{
    DEFAULT_SCROLL_MARGIN, FragmentTarget, JumpArea, JumpData, JumpKind, JumpLocation, JumpTarget,
    SectionAnchor, parse_fragment,
};
pub use layout::{LayoutEntry, ViewportHighlight, group_by_page, hit_test, page_layout};
pub use overlay::{OverlaySpec, PageInputs, build_overlay};
pub use screenshot::{area_as_png, decode_data_uri};
pub use selection::{SelectionCandidate, capture_area, capture_text};
pub use state::{Command, Effect, PageLifecycle, PageState};
pub use store::{AnnotationState, PaperStore, StoreEvent};
pub use terms::{
    FindQuery, MatchRect, PageMatches, PageTextSearch, ScanTicket, TermMatchEngine, TermPositions,
    TermScan, TermSearch, TermStyle, TextSource, find_in_text,
};
pub use text_layer::{MatchSpan, RunOffset, TextLayer, TextRun, convert_matches, span_rects};
pub use types::*;
pub use zoom::*;
