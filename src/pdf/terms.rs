//! Acronym/term match engine
//!
//! Every term is searched across the whole document as an exact,
//! case-sensitive, whole-word query. Scans are generation tagged: starting a
//! new scan invalidates any scan still in flight, and its results are dropped
//! when they arrive.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::geometry::ViewportRect;
use super::text_layer::{TextLayer, convert_matches, span_rects};
use crate::error::Result;

/// Raw match offsets (in chars) per page index
pub type PageMatches = Vec<Vec<usize>>;

/// Term -> per-page match offsets
pub type TermPositions = BTreeMap<String, PageMatches>;

/// Presentation hint attached to a term (CSS color or class)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermStyle(pub String);

/// Query state handed to the find adapter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindQuery {
    pub query: String,
    pub case_sensitive: bool,
    pub highlight_all: bool,
    pub entire_word: bool,
}

impl FindQuery {
    /// Exact, case-sensitive, whole-word query used for acronyms
    pub fn exact_word(term: &str) -> Self {
        Self {
            query: term.to_string(),
            case_sensitive: true,
            highlight_all: false,
            entire_word: true,
        }
    }
}

/// Narrow adapter over the viewer's find controller
#[async_trait(?Send)]
pub trait TermSearch {
    /// Match offsets for every page of the document, indexed by page
    async fn search(&mut self, query: &FindQuery) -> Result<PageMatches>;
}

/// Source of per-page text content
#[async_trait(?Send)]
pub trait TextSource {
    fn page_count(&self) -> usize;

    async fn page_text(&self, page_index: usize) -> Result<String>;
}

#[async_trait(?Send)]
impl TextSource for Vec<String> {
    fn page_count(&self) -> usize {
        self.len()
    }

    async fn page_text(&self, page_index: usize) -> Result<String> {
        Ok(self.get(page_index).cloned().unwrap_or_default())
    }
}

/// [`TermSearch`] over extracted page text.
///
/// Text is extracted once for all pages and cached for the lifetime of the
/// document; every query afterwards only scans the cache.
pub struct PageTextSearch<S> {
    source: S,
    extracted: Option<Vec<String>>,
}

impl<S: TextSource> PageTextSearch<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            extracted: None,
        }
    }

    async fn extract_all(&mut self) -> Result<&[String]> {
        if self.extracted.is_none() {
            let source = &self.source;
            let pages = join_all((0..source.page_count()).map(|idx| source.page_text(idx))).await;
            let pages = pages.into_iter().collect::<Result<Vec<_>>>()?;
            debug!("Extracted text for {} pages", pages.len());
            self.extracted = Some(pages);
        }
        Ok(self.extracted.as_deref().unwrap_or_default())
    }
}

#[async_trait(?Send)]
impl<S: TextSource> TermSearch for PageTextSearch<S> {
    async fn search(&mut self, query: &FindQuery) -> Result<PageMatches> {
        let pages = self.extract_all().await?;
        Ok(pages.iter().map(|text| find_in_text(text, query)).collect())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Non-overlapping char offsets of `query` in `text`
pub fn find_in_text(text: &str, query: &FindQuery) -> Vec<usize> {
    let fold = |c: char| {
        if query.case_sensitive {
            c
        } else {
            c.to_lowercase().next().unwrap_or(c)
        }
    };
    let haystack: Vec<char> = text.chars().map(fold).collect();
    let needle: Vec<char> = query.query.chars().map(fold).collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    let mut offsets = Vec::new();
    let mut idx = 0;
    while idx + needle.len() <= haystack.len() {
        if haystack[idx..idx + needle.len()] != needle[..] {
            idx += 1;
            continue;
        }
        let end = idx + needle.len();
        let starts_word = idx == 0 || !(is_word_char(haystack[idx - 1]) && is_word_char(needle[0]));
        let ends_word = end == haystack.len()
            || !(is_word_char(haystack[end]) && is_word_char(needle[needle.len() - 1]));
        if !query.entire_word || (starts_word && ends_word) {
            offsets.push(idx);
            idx = end;
        } else {
            idx += 1;
        }
    }
    offsets
}

/// A match rectangle ready for the overlay
#[derive(Clone, Debug, PartialEq)]
pub struct MatchRect {
    pub term: String,
    pub style: TermStyle,
    pub rect: ViewportRect,
}

/// Permission to run one scan; carries the generation it belongs to
#[derive(Clone, Debug)]
pub struct ScanTicket {
    generation: u64,
    terms: Vec<String>,
    page_count: usize,
}

impl ScanTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Search every term, one after another.
    ///
    /// Terms are awaited sequentially because the find adapter's page cache
    /// is shared between them. A failed term is logged and left out.
    pub async fn run<T: TermSearch + ?Sized>(self, search: &mut T) -> TermScan {
        let mut positions = TermPositions::new();

        for term in &self.terms {
            match search.search(&FindQuery::exact_word(term)).await {
                Ok(mut pages) => {
                    pages.resize_with(self.page_count, Vec::new);
                    for offsets in &mut pages {
                        offsets.sort_unstable();
                        offsets.dedup();
                    }
                    positions.insert(term.clone(), pages);
                }
                Err(e) => warn!("Skipping term {term:?}: {e}"),
            }
        }

        TermScan {
            generation: self.generation,
            positions,
        }
    }
}

/// Results of a finished scan
#[derive(Clone, Debug)]
pub struct TermScan {
    generation: u64,
    pub positions: TermPositions,
}

#[derive(Debug, Default)]
pub struct TermMatchEngine {
    terms: BTreeMap<String, TermStyle>,
    positions: TermPositions,
    generation: u64,
}

impl TermMatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scan for a new term set, invalidating any scan in flight.
    ///
    /// An empty term set clears the positions and needs no scan.
    pub fn begin_scan(
        &mut self,
        terms: BTreeMap<String, TermStyle>,
        page_count: usize,
    ) -> Option<ScanTicket> {
        self.generation += 1;
        self.positions.clear();
        self.terms = terms;

        if self.terms.is_empty() {
            debug!("No terms to highlight");
            return None;
        }

        Some(ScanTicket {
            generation: self.generation,
            terms: self.terms.keys().cloned().collect(),
            page_count,
        })
    }

    /// Install scan results. Returns false if the scan was superseded.
    pub fn apply(&mut self, scan: TermScan) -> bool {
        if scan.generation != self.generation {
            debug!(
                "Discarding stale term scan (generation {} < {})",
                scan.generation, self.generation
            );
            return false;
        }
        self.positions = scan.positions;
        true
    }

    pub fn positions(&self) -> &TermPositions {
        &self.positions
    }

    pub fn terms(&self) -> &BTreeMap<String, TermStyle> {
        &self.terms
    }

    /// Match rectangles for one page (0-indexed) of the document
    pub fn page_matches(&self, page_index: usize, layer: &TextLayer) -> Vec<MatchRect> {
        let mut rects = Vec::new();

        for (term, pages) in &self.positions {
            let Some(offsets) = pages.get(page_index) else {
                continue;
            };
            if offsets.is_empty() {
                continue;
            }
            let style = self.terms.get(term).cloned().unwrap_or_default();
            for span in convert_matches(term.chars().count(), offsets, layer) {
                rects.extend(span_rects(&span, layer).into_iter().map(|rect| MatchRect {
                    term: term.clone(),
                    style: style.clone(),
                    rect,
                }));
            }
        }

        rects
    }
}
