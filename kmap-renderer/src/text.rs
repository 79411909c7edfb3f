//! Text layout inside a box or around a point.
//!
//! A [`TextElement`] is laid out once, from text, font and box constraints,
//! and is immutable afterwards. Layout only needs a [`TextMeasurer`], so the
//! same element can be measured in one place and drawn in another.
//!
//! ```text
//!   ┌──────────── width (or max width) ────────────┐
//!   │ top inset                                    │
//!   │   line 0   ← x offset from alignment         │
//!   │   line 1                                     │
//!   │   ▒▒▒▒▒▒   ← horizontally overflowing line   │
//!   │ bottom inset                                 │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! Wrapping breaks on whitespace, word endings and punctuation. A single
//! token wider than the box is split into syllables with a hyphen at each
//! forced break; if a syllable still does not fit, the line is flagged and
//! drawn as a translucent bar instead of glyphs.

use serde::{Deserialize, Serialize};

use crate::backend::{DrawContext, Font, TextMeasurer, TextMetrics};

/// String measured to derive a line height covering ascenders and descenders.
const LINE_HEIGHT_SAMPLE: &str = "Mjpunkrockisntdead!";

/// Alpha of the bar drawn in place of an overflowing line.
const OVERFLOW_ALPHA: f64 = 0.2;

/// Alignment along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    /// Left or top.
    Start,
    /// Centered.
    #[default]
    Center,
    /// Right or bottom.
    End,
}

/// Space between the box border and the text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    /// Top inset.
    pub top: f64,
    /// Bottom inset.
    pub bottom: f64,
    /// Left inset.
    pub left: f64,
    /// Right inset.
    pub right: f64,
}

impl Insets {
    /// The same inset on every side.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedLine {
    /// Text drawn for the line, including a hyphen at forced breaks.
    pub text: String,
    /// Measured width of `text`.
    pub width: f64,
    /// Offset from the left of the text area, from horizontal alignment.
    pub x_offset: f64,
    /// The line is wider than the box even after syllable splitting.
    pub horizontal_overflow: bool,
}

/// Builder for a [`TextElement`].
#[derive(Debug, Clone)]
pub struct TextElementBuilder {
    text: String,
    font: Font,
    width: Option<f64>,
    max_width: Option<f64>,
    height: Option<f64>,
    max_height: Option<f64>,
    max_lines: Option<usize>,
    line_height: f64,
    fill_style: Option<String>,
    stroke_style: Option<String>,
    stroke_width: f64,
    vertical_align: TextAlignment,
    horizontal_align: TextAlignment,
    insets: Insets,
}

impl TextElementBuilder {
    /// Fixed box width.
    #[must_use]
    pub fn width(mut self, width: impl Into<Option<f64>>) -> Self {
        self.width = width.into();
        self
    }

    /// Maximum box width.
    #[must_use]
    pub fn max_width(mut self, max_width: impl Into<Option<f64>>) -> Self {
        self.max_width = max_width.into();
        self
    }

    /// Fixed box height.
    #[must_use]
    pub fn height(mut self, height: impl Into<Option<f64>>) -> Self {
        self.height = height.into();
        self
    }

    /// Maximum box height.
    #[must_use]
    pub fn max_height(mut self, max_height: impl Into<Option<f64>>) -> Self {
        self.max_height = max_height.into();
        self
    }

    /// Maximum number of lines.
    #[must_use]
    pub fn max_lines(mut self, max_lines: impl Into<Option<usize>>) -> Self {
        self.max_lines = max_lines.into();
        self
    }

    /// Line height as a multiple of the font's ascent plus descent.
    #[must_use]
    pub fn line_height(mut self, factor: f64) -> Self {
        self.line_height = factor;
        self
    }

    /// Fill color.
    #[must_use]
    pub fn fill_style(mut self, color: impl Into<String>) -> Self {
        self.fill_style = Some(color.into());
        self
    }

    /// Skip filling; only a stroke, if any, is drawn.
    #[must_use]
    pub fn no_fill(mut self) -> Self {
        self.fill_style = None;
        self
    }

    /// Outline the text before filling it.
    #[must_use]
    pub fn stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke_style = Some(color.into());
        self.stroke_width = width;
        self
    }

    /// Vertical alignment inside the box.
    #[must_use]
    pub fn vertical_align(mut self, align: TextAlignment) -> Self {
        self.vertical_align = align;
        self
    }

    /// Horizontal alignment of each line.
    #[must_use]
    pub fn horizontal_align(mut self, align: TextAlignment) -> Self {
        self.horizontal_align = align;
        self
    }

    /// Insets between the box and the text.
    #[must_use]
    pub fn insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }

    /// Lay out the text.
    pub fn layout<M: TextMeasurer + ?Sized>(self, measurer: &M) -> TextElement {
        TextElement::layout(self, measurer)
    }
}

/// Laid-out text, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    text: String,
    font: Font,
    width: Option<f64>,
    height: Option<f64>,
    fill_style: Option<String>,
    stroke_style: Option<String>,
    stroke_width: f64,
    insets: Insets,
    effective_width: Option<f64>,
    line_metrics: TextMetrics,
    line_height: f64,
    lines: Vec<ComputedLine>,
    actual_width: f64,
    actual_height: f64,
    y_offset: f64,
    horizontal_overflow: bool,
    vertical_overflow: bool,
}

/// Result of the wrapping pass.
struct WrappedLines {
    lines: Vec<ComputedLine>,
    horizontal_overflow: bool,
    vertical_overflow: bool,
    actual_width: f64,
}

impl TextElement {
    /// Start building an element for `text` in `font`.
    #[must_use]
    pub fn builder(text: impl Into<String>, font: Font) -> TextElementBuilder {
        TextElementBuilder {
            text: text.into(),
            font,
            width: None,
            max_width: None,
            height: None,
            max_height: None,
            max_lines: None,
            line_height: 1.2,
            fill_style: Some("#000".to_string()),
            stroke_style: None,
            stroke_width: 1.0,
            vertical_align: TextAlignment::Center,
            horizontal_align: TextAlignment::Center,
            insets: Insets::default(),
        }
    }

    fn layout<M: TextMeasurer + ?Sized>(options: TextElementBuilder, measurer: &M) -> Self {
        let line_metrics = measurer.measure_text(&options.font, LINE_HEIGHT_SAMPLE);
        let line_height = (line_metrics.ascent + line_metrics.descent) * options.line_height;

        let insets = options.insets;
        let effective_width = constrain(options.width, options.max_width, insets.left + insets.right);
        let effective_height =
            constrain(options.height, options.max_height, insets.top + insets.bottom);

        let mut wrapped = wrap(&options, measurer, line_height, effective_width, effective_height);

        // Alignment needs the final actual width, so it runs after wrapping.
        let align_width = options.width.and(effective_width);
        for line in &mut wrapped.lines {
            line.x_offset = horizontal_offset(
                options.horizontal_align,
                line.width,
                align_width,
                wrapped.actual_width,
            );
        }

        #[allow(clippy::cast_precision_loss)]
        let actual_height =
            (wrapped.lines.len() as f64 * line_height - line_metrics.descent).max(0.0);
        let y_offset = vertical_offset(
            options.vertical_align,
            actual_height,
            options.height.and(effective_height),
        );

        Self {
            text: options.text,
            font: options.font,
            width: options.width,
            height: options.height,
            fill_style: options.fill_style,
            stroke_style: options.stroke_style,
            stroke_width: options.stroke_width,
            insets,
            effective_width,
            line_metrics,
            line_height,
            lines: wrapped.lines,
            actual_width: wrapped.actual_width,
            actual_height,
            y_offset,
            horizontal_overflow: wrapped.horizontal_overflow,
            vertical_overflow: wrapped.vertical_overflow,
        }
    }

    /// The source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The font.
    #[must_use]
    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Fixed width, if one was set.
    #[must_use]
    pub fn width(&self) -> Option<f64> {
        self.width
    }

    /// Fixed height, if one was set.
    #[must_use]
    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// Laid-out lines.
    #[must_use]
    pub fn lines(&self) -> &[ComputedLine] {
        &self.lines
    }

    /// Text color, if the text is filled.
    #[must_use]
    pub fn fill_style(&self) -> Option<&str> {
        self.fill_style.as_deref()
    }

    /// Distance between consecutive baselines.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Metrics of the sample used to derive the line height.
    #[must_use]
    pub fn line_metrics(&self) -> TextMetrics {
        self.line_metrics
    }

    /// Width of the widest fitting line, or the box width if a line overflows.
    #[must_use]
    pub fn actual_width(&self) -> f64 {
        self.actual_width
    }

    /// Height from the top of the first line to the last baseline.
    #[must_use]
    pub fn actual_height(&self) -> f64 {
        self.actual_height
    }

    /// [`Self::actual_width`] plus left and right insets.
    #[must_use]
    pub fn actual_width_with_insets(&self) -> f64 {
        self.actual_width + self.insets.left + self.insets.right
    }

    /// [`Self::actual_height`] plus top and bottom insets.
    #[must_use]
    pub fn actual_height_with_insets(&self) -> f64 {
        self.actual_height + self.insets.top + self.insets.bottom
    }

    /// Some line is wider than the box.
    #[must_use]
    pub fn horizontal_overflow(&self) -> bool {
        self.horizontal_overflow
    }

    /// Not all of the text fit in the box.
    #[must_use]
    pub fn vertical_overflow(&self) -> bool {
        self.vertical_overflow
    }

    /// Draw centered on `(x, y)`.
    pub fn draw_centered_at<C: DrawContext + ?Sized>(&self, ctx: &mut C, x: f64, y: f64) {
        let width = self.width.unwrap_or_else(|| self.actual_width_with_insets());
        let height = self.height.unwrap_or_else(|| self.actual_height_with_insets());
        self.draw(ctx, x - width / 2.0, y - height / 2.0);
    }

    /// Draw with the box's top left corner at `(min_x, min_y)`.
    pub fn draw<C: DrawContext + ?Sized>(&self, ctx: &mut C, min_x: f64, min_y: f64) {
        let min_x = min_x + self.insets.left;
        let min_y = min_y + self.insets.top + self.y_offset;

        ctx.set_font(&self.font);
        for (i, line) in self.lines.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let line_top = min_y + i as f64 * self.line_height;

            if line.horizontal_overflow {
                let bar_width = if self.width.is_some() {
                    self.effective_width.unwrap_or(0.0)
                } else {
                    self.actual_width
                };
                if let Some(fill) = &self.fill_style {
                    if bar_width > 0.0 {
                        ctx.save();
                        ctx.set_fill_style(fill);
                        ctx.set_global_alpha(OVERFLOW_ALPHA);
                        ctx.fill_rect(
                            min_x,
                            line_top,
                            bar_width,
                            self.line_metrics.ascent + self.line_metrics.descent,
                        );
                        ctx.restore();
                    }
                }
                continue;
            }

            let x = min_x + line.x_offset;
            let baseline = line_top + self.line_metrics.ascent;
            if let Some(stroke) = &self.stroke_style {
                ctx.set_line_width(self.stroke_width);
                ctx.set_stroke_style(stroke);
                ctx.stroke_text(&line.text, x, baseline);
            }
            if let Some(fill) = &self.fill_style {
                ctx.set_fill_style(fill);
                ctx.fill_text(&line.text, x, baseline);
            }
        }
    }
}

/// Space available for text given a fixed and a maximum size.
fn constrain(fixed: Option<f64>, max: Option<f64>, insets: f64) -> Option<f64> {
    let outer = match (fixed, max) {
        (Some(fixed), Some(max)) => Some(fixed.min(max)),
        (Some(size), None) | (None, Some(size)) => Some(size),
        (None, None) => None,
    };
    outer.map(|size| (size - insets).max(0.0))
}

fn horizontal_offset(
    align: TextAlignment,
    line_width: f64,
    box_width: Option<f64>,
    actual_width: f64,
) -> f64 {
    let reference = box_width.unwrap_or(actual_width);
    match align {
        TextAlignment::Start => 0.0,
        TextAlignment::Center => (reference - line_width) / 2.0,
        TextAlignment::End => reference - line_width,
    }
}

fn vertical_offset(align: TextAlignment, actual_height: f64, box_height: Option<f64>) -> f64 {
    match (align, box_height) {
        (TextAlignment::Start, _) | (TextAlignment::Center, None) => 0.0,
        (TextAlignment::Center, Some(height)) => (height - actual_height) / 2.0,
        (TextAlignment::End, Some(height)) => height - actual_height,
        (TextAlignment::End, None) => -actual_height,
    }
}

fn wrap<M: TextMeasurer + ?Sized>(
    options: &TextElementBuilder,
    measurer: &M,
    line_height: f64,
    effective_width: Option<f64>,
    effective_height: Option<f64>,
) -> WrappedLines {
    let font = &options.font;
    let measure = |text: &str| measurer.measure_text(font, text).width;

    let too_short = effective_height.is_some_and(|h| line_height > h);
    if too_short || options.max_lines == Some(0) {
        return WrappedLines {
            lines: Vec::new(),
            horizontal_overflow: true,
            vertical_overflow: true,
            actual_width: options
                .width
                .or(options.max_width)
                .unwrap_or_else(|| measure(&options.text)),
        };
    }

    let fits = |count: usize| {
        #[allow(clippy::cast_precision_loss)]
        let height_ok = effective_height.is_none_or(|h| count as f64 * line_height <= h);
        height_ok && options.max_lines.is_none_or(|max| count <= max)
    };

    let mut result = WrappedLines {
        lines: Vec::new(),
        horizontal_overflow: false,
        vertical_overflow: false,
        actual_width: 0.0,
    };

    'blocks: for block in options.text.split('\n') {
        let block = block.strip_suffix('\r').unwrap_or(block);
        let tokens = tokenize(block);

        let pieces: Vec<(String, f64)> = match effective_width {
            Some(max_width) => {
                let hyphen_width = measure("-");
                fit_lines(&tokens, max_width, &measure)
                    .into_iter()
                    .flat_map(|(line, width)| {
                        if width > max_width {
                            split_overflowing(&line, max_width - hyphen_width, &measure)
                        } else {
                            vec![(line, width)]
                        }
                    })
                    .collect()
            }
            None => vec![(block.to_string(), measure(block))],
        };

        for (text, width) in pieces {
            if !fits(result.lines.len() + 1) {
                result.vertical_overflow = true;
                break 'blocks;
            }

            let overflow = effective_width.is_some_and(|max| width > max);
            if overflow {
                result.horizontal_overflow = true;
                result.actual_width = effective_width.unwrap_or(width);
            } else if width > result.actual_width {
                result.actual_width = width;
            }
            result.lines.push(ComputedLine {
                text,
                width,
                x_offset: 0.0,
                horizontal_overflow: overflow,
            });
        }
    }

    result
}

/// Split one overflowing line into syllable chunks, hyphenating forced breaks.
fn split_overflowing(
    line: &str,
    max_width: f64,
    measure: &impl Fn(&str) -> f64,
) -> Vec<(String, f64)> {
    let chunks = syllables(line);
    let fitted = fit_lines(&chunks, max_width, measure);
    let last = fitted.len().saturating_sub(1);
    fitted
        .into_iter()
        .enumerate()
        .map(|(i, (text, width))| {
            if i < last {
                let text = format!("{text}-");
                let width = measure(&text);
                (text, width)
            } else {
                (text, width)
            }
        })
        .collect()
}

/// Greedily pack tokens into lines no wider than `max_width`.
///
/// A line always holds at least one token, so a single wide token yields a
/// line wider than `max_width`. Continuation lines drop leading whitespace.
fn fit_lines(
    tokens: &[&str],
    max_width: f64,
    measure: &impl Fn(&str) -> f64,
) -> Vec<(String, f64)> {
    let Some((first, rest)) = tokens.split_first() else {
        return vec![(String::new(), 0.0)];
    };

    let mut lines = Vec::new();
    let mut line = (*first).to_string();
    let mut width = measure(&line);

    for token in rest {
        let candidate = format!("{line}{token}");
        let candidate_width = measure(&candidate);
        if candidate_width > max_width {
            lines.push((line, width));
            line = token.trim_start().to_string();
            width = measure(&line);
        } else {
            line = candidate;
            width = candidate_width;
        }
    }
    lines.push((line, width));
    lines
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split a block into break opportunities.
///
/// Breaks fall between a non-space and a space, after punctuation, and at the
/// end of a word. Whitespace stays attached to the following token.
fn tokenize(block: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in block.char_indices() {
        if let Some(p) = prev {
            let split = (!p.is_whitespace() && c.is_whitespace())
                || (!p.is_whitespace() && !is_word_char(p))
                || matches!(p, '\\' | '.' | ',' | '_' | '-')
                || (is_word_char(p) && !is_word_char(c));
            if split {
                tokens.push(&block[start..i]);
                start = i;
            }
        }
        prev = Some(c);
    }
    tokens.push(&block[start..]);
    tokens
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Split a word into rough syllables: consonants, a vowel group, then either
/// every remaining consonant (at the end of the word) or one consonant of a
/// consonant pair. Words without vowels split into single characters.
fn syllables(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let n = chars.len();
    let byte_at = |i: usize| if i < n { chars[i].0 } else { word.len() };

    let mut chunks = Vec::new();
    let mut i = 0;
    while i < n {
        let start = i;
        let mut j = i;
        while j < n && !is_vowel(chars[j].1) {
            j += 1;
        }
        if j == n {
            break;
        }
        while j < n && is_vowel(chars[j].1) {
            j += 1;
        }
        if chars[j..].iter().all(|&(_, c)| !is_vowel(c)) {
            j = n;
        } else if j + 1 < n && !is_vowel(chars[j].1) && !is_vowel(chars[j + 1].1) {
            j += 1;
        }
        chunks.push(&word[byte_at(start)..byte_at(j)]);
        i = j;
    }

    if chunks.is_empty() {
        return chars
            .iter()
            .enumerate()
            .map(|(k, &(b, _))| &word[b..byte_at(k + 1)])
            .collect();
    }
    if i < n {
        chunks.push(&word[byte_at(i)..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::backend::{DrawCommand, RecordingContext};

    fn font() -> Font {
        // Monospace model: 6px per char, ascent 8, descent 2, line height 12.
        Font::new(10.0, "sans-serif")
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn texts(element: &TextElement) -> Vec<&str> {
        element.lines().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("hello world"), vec!["hello", " world"]);
        assert_eq!(tokenize("BRCA1-associated"), vec!["BRCA1", "-", "associated"]);
        assert_eq!(tokenize("a.b"), vec!["a", ".", "b"]);
        assert_eq!(tokenize(""), vec![""]);
    }

    #[test]
    fn test_syllables() {
        assert_eq!(syllables("abcdefghij"), vec!["ab", "cdef", "ghij"]);
        assert_eq!(syllables("BRCA1"), vec!["BRCA1"]);
        assert_eq!(syllables("123"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unconstrained_single_line() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("hello world", font()).layout(&ctx);
        assert_eq!(texts(&element), vec!["hello world"]);
        assert!(!element.horizontal_overflow());
        assert!(!element.vertical_overflow());
        assert!(approx_eq(element.actual_width(), 66.0));
        assert!(approx_eq(element.line_height(), 12.0));
        assert!(approx_eq(element.actual_height(), 10.0));
    }

    #[test]
    fn test_wraps_on_words() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("hello world", font())
            .max_width(40.0)
            .layout(&ctx);
        assert_eq!(texts(&element), vec!["hello", "world"]);
        assert!(approx_eq(element.actual_width(), 30.0));
        assert!(!element.vertical_overflow());
    }

    #[test]
    fn test_hyphenates_long_word() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("abcdefghij", font())
            .max_width(40.0)
            .layout(&ctx);
        assert_eq!(texts(&element), vec!["ab-", "cdef-", "ghij"]);
        assert!(!element.horizontal_overflow());
        assert!(approx_eq(element.actual_width(), 30.0));
    }

    #[test]
    fn test_unbreakable_overflow() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("xxxx", font())
            .width(5.0)
            .layout(&ctx);
        assert!(element.horizontal_overflow());
        assert!(element.lines().iter().all(|l| l.horizontal_overflow));
        assert!(approx_eq(element.actual_width(), 5.0));
    }

    #[test]
    fn test_max_lines_and_height() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("abcdefghij", font())
            .max_width(40.0)
            .max_lines(2)
            .layout(&ctx);
        assert_eq!(texts(&element), vec!["ab-", "cdef-"]);
        assert!(element.vertical_overflow());

        let element = TextElement::builder("one two three four", font())
            .max_width(30.0)
            .max_height(30.0)
            .layout(&ctx);
        assert_eq!(element.lines().len(), 2);
        assert!(element.vertical_overflow());
    }

    #[test]
    fn test_box_too_small() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("hello", font())
            .width(100.0)
            .height(5.0)
            .layout(&ctx);
        assert!(element.lines().is_empty());
        assert!(element.horizontal_overflow());
        assert!(element.vertical_overflow());
        assert!(approx_eq(element.actual_width(), 100.0));
        assert!(approx_eq(element.actual_height(), 0.0));
    }

    #[test]
    fn test_newlines_and_blank_lines() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("a\r\n\nb", font())
            .max_width(100.0)
            .layout(&ctx);
        assert_eq!(texts(&element), vec!["a", "", "b"]);
    }

    #[test]
    fn test_alignment_offsets() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("hello world", font())
            .max_width(40.0)
            .horizontal_align(TextAlignment::End)
            .layout(&ctx);
        assert!(element.lines().iter().all(|l| approx_eq(l.x_offset, 0.0)));

        let element = TextElement::builder("hi", font())
            .width(100.0)
            .horizontal_align(TextAlignment::Center)
            .layout(&ctx);
        assert!(approx_eq(element.lines()[0].x_offset, 44.0));
    }

    #[test]
    fn test_draw_positions_baselines() {
        let mut ctx = RecordingContext::new();
        let element = TextElement::builder("hello world", font())
            .max_width(40.0)
            .vertical_align(TextAlignment::Start)
            .horizontal_align(TextAlignment::Start)
            .stroke("#fff", 3.0)
            .layout(&ctx);
        element.draw(&mut ctx, 10.0, 20.0);

        let fills: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, x, y } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0], ("hello".to_string(), 10.0, 28.0));
        assert_eq!(fills[1], ("world".to_string(), 10.0, 40.0));
        assert_eq!(
            ctx.count(|c| matches!(c, DrawCommand::StrokeText { .. })),
            2
        );
    }

    #[test]
    fn test_draw_overflow_bar() {
        let mut ctx = RecordingContext::new();
        let element = TextElement::builder("xxxx", font())
            .width(5.0)
            .layout(&ctx);
        element.draw(&mut ctx, 0.0, 0.0);
        assert_eq!(ctx.filled_texts().count(), 0);
        assert!(ctx
            .commands()
            .contains(&DrawCommand::GlobalAlpha { alpha: OVERFLOW_ALPHA }));
        assert!(ctx.count(|c| matches!(c, DrawCommand::FillRect { .. })) >= 1);
    }

    #[test]
    fn test_draw_centered_at() {
        let mut ctx = RecordingContext::new();
        let element = TextElement::builder("hi", font())
            .vertical_align(TextAlignment::Start)
            .layout(&ctx);
        element.draw_centered_at(&mut ctx, 100.0, 100.0);
        // Width 12, height 10: top left is (94, 95); baseline 95 + 8.
        assert_eq!(
            ctx.commands().last(),
            Some(&DrawCommand::FillText {
                text: "hi".to_string(),
                x: 94.0,
                y: 103.0
            })
        );
    }

    #[test]
    fn test_insets_reduce_available_width() {
        let ctx = RecordingContext::new();
        let element = TextElement::builder("hello world", font())
            .width(76.0)
            .insets(Insets::uniform(5.0))
            .layout(&ctx);
        assert_eq!(element.lines().len(), 1);
        assert!(approx_eq(element.actual_width_with_insets(), 76.0));

        let element = TextElement::builder("hello world", font())
            .width(75.0)
            .insets(Insets::uniform(5.0))
            .layout(&ctx);
        assert_eq!(element.lines().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_layout_is_deterministic(
            text in "[a-zA-Z ,.\\-\n]{0,80}",
            max_width in 10.0f64..300.0,
        ) {
            let ctx = RecordingContext::new();
            let build = || TextElement::builder(text.clone(), font()).max_width(max_width).layout(&ctx);
            prop_assert_eq!(build(), build());
        }

        #[test]
        fn prop_fitting_lines_respect_width(
            text in "[a-z ]{1,80}",
            max_width in 40.0f64..300.0,
        ) {
            let ctx = RecordingContext::new();
            let element = TextElement::builder(text, font()).max_width(max_width).layout(&ctx);
            for line in element.lines() {
                if !line.horizontal_overflow {
                    prop_assert!(line.width <= max_width + 1e-9);
                }
            }
        }
    }
}
