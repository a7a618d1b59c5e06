use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use async_trait::async_trait;
use futures::executor::block_on;
use papernote::AnnotatorError;
use papernote::pdf::{
    Annotator, FindQuery, PageMatches, PageTextSearch, PageViewport, PaperStore, TermSearch,
    TermStyle, TextLayer, TextRun, ViewportRect,
};
use papernote::settings::Settings;
use papernote::test_utils::FakeEngine;

const PAGES: [&str; 3] = [
    "We train a GAN on faces. ",
    "The GAN and the VAE disagree; GANs are sharper. ",
    "Conclusion without acronyms. ",
];

fn acronyms(terms: &[(&str, &str)]) -> BTreeMap<String, TermStyle> {
    terms
        .iter()
        .map(|(term, style)| (term.to_string(), TermStyle(style.to_string())))
        .collect()
}

fn annotator() -> Annotator<FakeEngine, PaperStore> {
    let mut engine = FakeEngine::new(3, PageViewport::new(600.0, 800.0, 1.0));
    for (idx, text) in PAGES.iter().enumerate() {
        let width = text.chars().count() as f64 * 6.0;
        engine.set_text_layer(
            idx as u32 + 1,
            TextLayer::new(vec![TextRun::new(
                *text,
                ViewportRect::new(100.0, 50.0, width, 12.0),
            )]),
        );
    }
    let store = Rc::new(RefCell::new(PaperStore::new()));
    let mut annotator = Annotator::new(engine, store, &Settings::default());
    annotator.mount();
    annotator
}

fn search() -> PageTextSearch<Vec<String>> {
    PageTextSearch::new(PAGES.iter().map(|page| page.to_string()).collect())
}

fn render_all(annotator: &mut Annotator<FakeEngine, PaperStore>, now: Instant) {
    annotator.on_pages_init(now).unwrap();
    for page in 1..=3 {
        annotator.on_text_layer_rendered(page, now).unwrap();
    }
}

#[test]
fn absent_term_maps_to_empty_pages() {
    let mut annotator = annotator();
    let now = Instant::now();
    render_all(&mut annotator, now);

    annotator
        .store()
        .borrow_mut()
        .set_acronyms(acronyms(&[("NLP", "red")]));
    annotator.pump(now).unwrap();
    assert!(block_on(annotator.refresh_terms(&mut search(), now)).unwrap());

    let expected: PageMatches = vec![vec![], vec![], vec![]];
    assert_eq!(annotator.terms().positions()["NLP"], expected);
    for page in 1..=3 {
        assert!(annotator.engine().overlay(page).unwrap().matches.is_empty());
    }
}

#[test]
fn whole_word_matches_become_rectangles() {
    let mut annotator = annotator();
    let now = Instant::now();
    render_all(&mut annotator, now);

    annotator
        .store()
        .borrow_mut()
        .set_acronyms(acronyms(&[("GAN", "blue"), ("VAE", "green")]));
    annotator.pump(now).unwrap();
    block_on(annotator.refresh_terms(&mut search(), now)).unwrap();

    let positions = annotator.terms().positions();
    assert_eq!(positions["GAN"], vec![vec![11], vec![4], vec![]]);
    assert_eq!(positions["VAE"], vec![vec![], vec![16], vec![]]);

    let page_two = &annotator.engine().overlay(2).unwrap().matches;
    assert_eq!(page_two.len(), 2);
    let gan = page_two.iter().find(|m| m.term == "GAN").unwrap();
    assert_eq!(gan.style, TermStyle("blue".into()));
    assert!((gan.rect.left - (50.0 + 4.0 * 6.0)).abs() < 1e-6);
    assert!((gan.rect.width - 18.0).abs() < 1e-6);
    assert!(annotator.engine().overlay(3).unwrap().matches.is_empty());
}

#[test]
fn superseded_scan_is_dropped() {
    let mut annotator = annotator();
    let now = Instant::now();
    render_all(&mut annotator, now);

    annotator
        .store()
        .borrow_mut()
        .set_acronyms(acronyms(&[("GAN", "blue")]));
    annotator.pump(now).unwrap();
    let first = annotator.take_term_scan().unwrap();

    annotator
        .store()
        .borrow_mut()
        .set_acronyms(acronyms(&[("VAE", "green")]));
    annotator.pump(now).unwrap();
    let second = annotator.take_term_scan().unwrap();

    let mut search = search();
    let stale = block_on(first.run(&mut search));
    assert!(!annotator.apply_term_scan(stale, now).unwrap());
    assert!(annotator.terms().positions().is_empty());

    let fresh = block_on(second.run(&mut search));
    assert!(annotator.apply_term_scan(fresh, now).unwrap());
    assert_eq!(
        annotator.terms().positions().keys().collect::<Vec<_>>(),
        vec!["VAE"]
    );
}

#[test]
fn clearing_acronyms_removes_matches() {
    let mut annotator = annotator();
    let now = Instant::now();
    render_all(&mut annotator, now);

    annotator
        .store()
        .borrow_mut()
        .set_acronyms(acronyms(&[("GAN", "blue")]));
    annotator.pump(now).unwrap();
    block_on(annotator.refresh_terms(&mut search(), now)).unwrap();
    assert!(!annotator.engine().overlay(1).unwrap().matches.is_empty());

    annotator.store().borrow_mut().set_acronyms(BTreeMap::new());
    annotator.pump(now).unwrap();

    assert!(annotator.take_term_scan().is_none());
    assert!(annotator.engine().overlay(1).unwrap().matches.is_empty());
}

/// Find adapter whose controller rejects one query
struct FlakySearch {
    inner: PageTextSearch<Vec<String>>,
    broken: &'static str,
}

#[async_trait(?Send)]
impl TermSearch for FlakySearch {
    async fn search(&mut self, query: &FindQuery) -> papernote::Result<PageMatches> {
        if query.query == self.broken {
            return Err(AnnotatorError::search(&query.query, "find controller unavailable"));
        }
        self.inner.search(query).await
    }
}

#[test]
fn failing_term_does_not_block_others() {
    let mut annotator = annotator();
    let now = Instant::now();
    render_all(&mut annotator, now);

    annotator
        .store()
        .borrow_mut()
        .set_acronyms(acronyms(&[("GAN", "blue"), ("VAE", "green")]));
    annotator.pump(now).unwrap();

    let mut flaky = FlakySearch {
        inner: search(),
        broken: "VAE",
    };
    assert!(block_on(annotator.refresh_terms(&mut flaky, now)).unwrap());

    let positions = annotator.terms().positions();
    assert!(positions.contains_key("GAN"));
    assert!(!positions.contains_key("VAE"));
}
