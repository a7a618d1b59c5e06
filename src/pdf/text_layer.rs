//! Text layer geometry and match-offset conversion
//!
//! A page's text layer is a sequence of positioned text runs. Search results
//! come back as character offsets into the concatenation of those runs; this
//! module maps them back onto runs and then onto rectangles.

use super::geometry::ViewportRect;

/// One positioned run of text (a text-layer div)
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Run rectangle in page-relative viewport pixels
    pub rect: ViewportRect,
}

impl TextRun {
    pub fn new(text: impl Into<String>, rect: ViewportRect) -> Self {
        Self {
            text: text.into(),
            rect,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Rectangle covering chars `[start, end)`, interpolated across the run
    fn span_rect(&self, start: usize, end: usize) -> ViewportRect {
        let len = self.char_len();
        if len == 0 {
            return self.rect;
        }
        let per_char = self.rect.width / len as f64;
        let start = start.min(len);
        let end = end.clamp(start, len);
        ViewportRect {
            top: self.rect.top,
            left: self.rect.left + per_char * start as f64,
            width: per_char * (end - start) as f64,
            height: self.rect.height,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayer {
    pub runs: Vec<TextRun>,
}

impl TextLayer {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    /// Concatenated text content the search offsets refer to
    pub fn text_content(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Position inside the text layer: run index plus char offset in that run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOffset {
    pub run: usize,
    pub offset: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
    pub begin: RunOffset,
    pub end: RunOffset,
}

/// Map match offsets of a query of `query_len` chars onto runs.
///
/// Ascending offsets are walked in one pass; an offset behind the current
/// run restarts the walk from the first run.
pub fn convert_matches(
    query_len: usize,
    offsets: &[usize],
    layer: &TextLayer,
) -> Vec<MatchSpan> {
    let lens: Vec<usize> = layer.runs.iter().map(TextRun::char_len).collect();
    if lens.is_empty() {
        return Vec::new();
    }
    let last = lens.len() - 1;

    let mut run = 0;
    let mut run_start = 0;
    let mut spans = Vec::with_capacity(offsets.len());

    for &offset in offsets {
        if offset < run_start {
            run = 0;
            run_start = 0;
        }
        while run != last && offset >= run_start + lens[run] {
            run_start += lens[run];
            run += 1;
        }
        let begin = RunOffset {
            run,
            offset: offset - run_start,
        };

        let match_end = offset + query_len;
        while run != last && match_end > run_start + lens[run] {
            run_start += lens[run];
            run += 1;
        }
        let end = RunOffset {
            run,
            offset: match_end.saturating_sub(run_start),
        };

        spans.push(MatchSpan { begin, end });
    }

    spans
}

/// One rectangle per run the span touches
pub fn span_rects(span: &MatchSpan, layer: &TextLayer) -> Vec<ViewportRect> {
    (span.begin.run..=span.end.run)
        .filter_map(|idx| {
            let run = layer.runs.get(idx)?;
            let start = if idx == span.begin.run {
                span.begin.offset
            } else {
                0
            };
            let end = if idx == span.end.run {
                span.end.offset
            } else {
                run.char_len()
            };
            (end > start).then(|| run.span_rect(start, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> TextLayer {
        TextLayer::new(vec![
            TextRun::new("We use NLP ", ViewportRect::new(10.0, 0.0, 110.0, 12.0)),
            TextRun::new("and more NLP", ViewportRect::new(30.0, 0.0, 120.0, 12.0)),
        ])
    }

    #[test]
    fn maps_offsets_onto_runs() {
        let layer = layer();
        let content = layer.text_content();
        let offsets: Vec<usize> = content.match_indices("NLP").map(|(i, _)| i).collect();
        assert_eq!(offsets, vec![7, 20]);

        let spans = convert_matches(3, &offsets, &layer);
        assert_eq!(
            spans[0],
            MatchSpan {
                begin: RunOffset { run: 0, offset: 7 },
                end: RunOffset { run: 0, offset: 10 },
            }
        );
        assert_eq!(
            spans[1],
            MatchSpan {
                begin: RunOffset { run: 1, offset: 9 },
                end: RunOffset { run: 1, offset: 12 },
            }
        );
    }

    #[test]
    fn interpolates_rects_within_run() {
        let layer = layer();
        let spans = convert_matches(3, &[7], &layer);
        let rects = span_rects(&spans[0], &layer);

        assert_eq!(rects.len(), 1);
        assert!((rects[0].left - 70.0).abs() < 1e-9);
        assert!((rects[0].width - 30.0).abs() < 1e-9);
        assert_eq!(rects[0].top, 10.0);
    }

    #[test]
    fn match_across_runs_yields_rect_per_run() {
        let layer = TextLayer::new(vec![
            TextRun::new("ab", ViewportRect::new(0.0, 0.0, 20.0, 10.0)),
            TextRun::new("cd", ViewportRect::new(0.0, 20.0, 20.0, 10.0)),
        ]);

        let spans = convert_matches(2, &[1], &layer);
        assert_eq!(spans[0].begin, RunOffset { run: 0, offset: 1 });
        assert_eq!(spans[0].end, RunOffset { run: 1, offset: 1 });

        let rects = span_rects(&spans[0], &layer);
        assert_eq!(rects.len(), 2);
        assert!((rects[0].left - 10.0).abs() < 1e-9);
        assert!((rects[1].left - 20.0).abs() < 1e-9);
        assert!((rects[1].width - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unordered_offsets_map_like_ordered_ones() {
        let layer = layer();
        let ordered = convert_matches(3, &[7, 20], &layer);
        let reversed = convert_matches(3, &[20, 7], &layer);

        assert_eq!(reversed, vec![ordered[1], ordered[0]]);
        assert_eq!(convert_matches(3, &[7, 2], &layer)[1].begin, RunOffset { run: 0, offset: 2 });
    }

    #[test]
    fn empty_layer_has_no_spans() {
        assert!(convert_matches(3, &[0, 4], &TextLayer::default()).is_empty());
    }
}
