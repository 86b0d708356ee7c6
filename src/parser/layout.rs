//! Layout analysis for PDF pages.
//!
//! Walks a page's content stream to recover positioned text spans (text
//! matrix composed with the current transformation matrix, measured from the
//! visible page box origin), groups
//! spans into line segments (a line is cut wherever a gutter separates two
//! spans), and stacks segments into [`PageBlock`]s with bounding boxes.

use crate::error::{Error, Result};
use crate::model::{BBox, PageBlock};

use super::backend::{get_number_from_value, PageId, PdfBackend, PdfValue};

/// Average glyph width as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// Horizontal gap, in font sizes, that splits a line into two segments.
const GUTTER_WIDTH: f32 = 2.0;

/// Vertical gap, in font sizes, above which a segment starts a new block.
const BLOCK_GAP: f32 = 0.8;

/// TJ adjustments larger than this (thousandths of an em) read as a space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position information, bottom-up, relative to the lower
/// left corner of the visible page box.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated advance width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new span, estimating its width from the character count.
    pub fn new(text: String, x: f32, y: f32, font_size: f32) -> Self {
        let width = text.chars().count() as f32 * font_size * AVG_CHAR_WIDTH;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Approximate top edge (ascender).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    /// Approximate bottom edge (descender).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }
}

/// A horizontal run of spans on one baseline, not crossing a gutter.
#[derive(Debug, Clone)]
struct LineSegment {
    text: String,
    bbox: BBox,
    font_size: f32,
}

/// Recovers text blocks from a page through a [`PdfBackend`].
pub struct LayoutAnalyzer<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: PdfBackend + ?Sized> LayoutAnalyzer<'a, B> {
    /// Create a new layout analyzer.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Page width and the structural blocks of a page (1-indexed).
    pub fn page_blocks(&self, page_num: u32) -> Result<(f32, Vec<PageBlock>)> {
        let page_box = self.backend.page_box(self.page_id(page_num)?);
        let spans = self.extract_page_spans(page_num)?;
        let segments = group_spans_into_segments(spans, page_box.height);
        Ok((page_box.width, group_segments_into_blocks(segments)))
    }

    fn page_id(&self, page_num: u32) -> Result<PageId> {
        let pages = self.backend.pages();
        pages
            .get(&page_num)
            .copied()
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))
    }

    /// Extract text spans from a page with position and size information.
    pub fn extract_page_spans(&self, page_num: u32) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(page_num)?;
        let content = self.backend.page_content(page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.backend.decode_content(&content)?;
        let page_box = self.backend.page_box(page_id);

        let mut spans = Vec::new();
        let mut ctm = Matrix::IDENTITY;
        let mut saved: Vec<Matrix> = Vec::new();
        let mut font_name: Vec<u8> = Vec::new();
        let mut font_size: f32 = 12.0;
        let mut matrix = TextMatrix::default();
        let mut in_text_block = false;

        for op in ops {
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        ctm = previous;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.concat(&ctm);
                    }
                }
                "BT" => {
                    in_text_block = true;
                    matrix.reset();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if op.operands.len() >= 2 {
                        if let PdfValue::Name(name) = &op.operands[0] {
                            font_name = name.clone();
                        }
                        font_size = get_number_from_value(&op.operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = op.operands.first().and_then(get_number_from_value) {
                        matrix.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                        let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            matrix.leading = -ty;
                        }
                        matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        matrix.set(m);
                    }
                }
                "T*" => matrix.next_line(),
                "Tj" | "TJ" | "'" | "\"" if in_text_block => {
                    if op.operator == "'" || op.operator == "\"" {
                        matrix.next_line();
                    }
                    let (text, adjust) = match op.operator.as_str() {
                        "TJ" => self.decode_tj(page_id, &font_name, op.operands.first()),
                        "\"" => (self.decode_str(page_id, &font_name, op.operands.get(2)), 0.0),
                        _ => (self.decode_str(page_id, &font_name, op.operands.first()), 0.0),
                    };
                    if text.trim().is_empty() {
                        continue;
                    }
                    // Advance in unscaled text space units
                    let advance = text.chars().count() as f32 * font_size * AVG_CHAR_WIDTH
                        + adjust * font_size / 1000.0;
                    let rendering = matrix.matrix().concat(&ctm);
                    let (x, y) = rendering.apply(0.0, 0.0);
                    let mut span = TextSpan::new(
                        text,
                        x - page_box.x0,
                        y - page_box.y0,
                        font_size * rendering.vertical_scale(),
                    );
                    span.width = advance * rendering.horizontal_scale();
                    matrix.advance(advance);
                    spans.push(span);
                }
                _ => {}
            }
        }

        Ok(spans)
    }

    fn decode_str(&self, page: PageId, font: &[u8], operand: Option<&PdfValue>) -> String {
        match operand {
            Some(PdfValue::Str(bytes)) => self.backend.decode_text(page, font, bytes),
            _ => String::new(),
        }
    }

    /// Decode a TJ array; returns the text and the summed negative kerning.
    fn decode_tj(&self, page: PageId, font: &[u8], operand: Option<&PdfValue>) -> (String, f32) {
        let Some(PdfValue::Array(items)) = operand else {
            return (String::new(), 0.0);
        };
        let mut combined = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    combined.push_str(&self.backend.decode_text(page, font, bytes));
                }
                other => {
                    if let Some(n) = get_number_from_value(other) {
                        let adjustment = -n;
                        advance += adjustment;
                        if adjustment > TJ_SPACE_THRESHOLD
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
        }
        (combined, advance)
    }
}

/// Group spans into line segments, in top-down coordinates.
///
/// Spans whose baselines lie within 30% of the font size share a line; a
/// line is split wherever the horizontal gap exceeds [`GUTTER_WIDTH`].
fn group_spans_into_segments(mut spans: Vec<TextSpan>, page_height: f32) -> Vec<LineSegment> {
    if spans.is_empty() {
        return vec![];
    }

    // Sort spans by Y (descending, since PDF Y is bottom-up) then X
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    let mut segments = Vec::new();
    for mut line in lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let mut run: Vec<TextSpan> = Vec::new();
        for span in line {
            if let Some(prev) = run.last() {
                let gap = span.x - prev.right();
                if gap > prev.font_size.max(span.font_size) * GUTTER_WIDTH {
                    segments.push(segment_from_spans(std::mem::take(&mut run), page_height));
                }
            }
            run.push(span);
        }
        if !run.is_empty() {
            segments.push(segment_from_spans(run, page_height));
        }
    }

    segments
}

fn segment_from_spans(spans: Vec<TextSpan>, page_height: f32) -> LineSegment {
    let x0 = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let x1 = spans.iter().map(|s| s.right()).fold(f32::NEG_INFINITY, f32::max);
    let top = spans.iter().map(|s| s.top()).fold(f32::NEG_INFINITY, f32::max);
    let bottom = spans.iter().map(|s| s.bottom()).fold(f32::INFINITY, f32::min);
    let font_size = spans.iter().map(|s| s.font_size).fold(0.0, f32::max);

    let mut text = String::new();
    for span in &spans {
        if !text.is_empty() && !text.ends_with(' ') && !span.text.starts_with(' ') {
            text.push(' ');
        }
        text.push_str(&span.text);
    }

    LineSegment {
        text,
        bbox: BBox::new(x0, page_height - top, x1, page_height - bottom),
        font_size,
    }
}

/// Stack line segments into blocks.
///
/// A segment joins the most recent block it overlaps horizontally when the
/// vertical gap between them is small; otherwise it opens a new block.
fn group_segments_into_blocks(segments: Vec<LineSegment>) -> Vec<PageBlock> {
    let mut blocks: Vec<PageBlock> = Vec::new();

    for segment in segments {
        let target = blocks
            .iter()
            .rposition(|b| b.bbox.overlaps_horizontally(&segment.bbox));

        match target {
            Some(i) if segment.bbox.y0 - blocks[i].bbox.y1 <= segment.font_size * BLOCK_GAP => {
                let block = &mut blocks[i];
                block.bbox = block.bbox.union(&segment.bbox);
                block.text.push('\n');
                block.text.push_str(&segment.text);
            }
            _ => blocks.push(PageBlock::new(segment.bbox, segment.text)),
        }
    }

    blocks
}

/// An affine transform `[a b c d e f]`, row-vector convention as in PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Read six numeric operands (`cm`, `Tm`).
    fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let n = |i: usize| get_number_from_value(&operands[i]);
        Some(Self {
            a: n(0)?,
            b: n(1)?,
            c: n(2)?,
            d: n(3)?,
            e: n(4)?,
            f: n(5)?,
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Line matrix origin; Td and T* move relative to it, not to the pen.
    line_e: f32,
    line_f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    fn reset(&mut self) {
        let leading = self.leading;
        *self = Self {
            leading,
            ..Self::default()
        };
    }

    fn set(&mut self, m: Matrix) {
        self.a = m.a;
        self.b = m.b;
        self.c = m.c;
        self.d = m.d;
        self.e = m.e;
        self.f = m.f;
        self.line_e = m.e;
        self.line_f = m.f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    /// Move the pen right by `tx` text-space units after showing text.
    fn advance(&mut self, tx: f32) {
        self.e += tx * self.a;
        self.f += tx * self.b;
    }

    fn matrix(&self) -> Matrix {
        Matrix {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            f: self.f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, 10.0)
    }

    #[test]
    fn test_span_width_estimate() {
        let s = span("abcd", 100.0, 700.0);
        assert_eq!(s.width, 20.0);
        assert_eq!(s.right(), 120.0);
    }

    #[test]
    fn test_same_baseline_split_at_gutter() {
        let spans = vec![span("Article premier", 50.0, 700.0), span("Article deux", 320.0, 700.0)];
        let segments = group_spans_into_segments(spans, 842.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Article premier");
        assert_eq!(segments[1].text, "Article deux");
        assert!(segments[0].bbox.x1 < segments[1].bbox.x0);
    }

    #[test]
    fn test_adjacent_spans_stay_together() {
        let spans = vec![span("Le bail", 50.0, 700.0), span("commercial", 88.0, 700.0)];
        let segments = group_spans_into_segments(spans, 842.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Le bail commercial");
    }

    #[test]
    fn test_segments_stack_into_columns() {
        let spans = vec![
            span("gauche un", 50.0, 700.0),
            span("droite un", 320.0, 700.0),
            span("gauche deux", 50.0, 688.0),
            span("droite deux", 320.0, 688.0),
        ];
        let blocks = group_segments_into_blocks(group_spans_into_segments(spans, 842.0));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "gauche un\ngauche deux");
        assert_eq!(blocks[1].text, "droite un\ndroite deux");
    }

    #[test]
    fn test_large_vertical_gap_opens_block() {
        let spans = vec![span("titre", 50.0, 700.0), span("paragraphe", 50.0, 600.0)];
        let blocks = group_segments_into_blocks(group_spans_into_segments(spans, 842.0));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_bbox_is_top_down() {
        let segments = group_spans_into_segments(vec![span("x", 10.0, 800.0)], 842.0);
        let bbox = segments[0].bbox;
        assert!(bbox.y0 < bbox.y1);
        assert!((bbox.y0 - 34.0).abs() < 0.01);
    }

    #[test]
    fn test_text_matrix_td_moves_from_line_start() {
        let mut m = TextMatrix::default();
        m.translate(72.0, 700.0);
        m.advance(100.0);
        m.translate(0.0, -14.0);
        assert_eq!(m.matrix().apply(0.0, 0.0), (72.0, 686.0));
    }

    #[test]
    fn test_cm_translation_composes_with_text_matrix() {
        let ctm = Matrix {
            e: 300.0,
            ..Matrix::IDENTITY
        };
        let mut m = TextMatrix::default();
        m.translate(50.0, 720.0);
        let rendering = m.matrix().concat(&ctm);
        assert_eq!(rendering.apply(0.0, 0.0), (350.0, 720.0));
    }

    #[test]
    fn test_cm_scale_applies_to_size() {
        let ctm = Matrix {
            a: 2.0,
            d: 2.0,
            ..Matrix::IDENTITY
        };
        let scale_then_move = ctm.concat(&Matrix {
            e: 10.0,
            f: 20.0,
            ..Matrix::IDENTITY
        });
        assert_eq!(scale_then_move.apply(5.0, 5.0), (20.0, 30.0));
        assert_eq!(ctm.vertical_scale(), 2.0);
        assert_eq!(ctm.horizontal_scale(), 2.0);
    }
}
