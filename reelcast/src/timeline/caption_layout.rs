use serde::Serialize;

/// Horizontal text measurement used by caption layout.
///
/// Layout runs once per scene while the timeline is built; nothing measures text per frame.
pub trait TextMeasure {
    /// Advance width of `text` laid out on a single line at `size` px.
    fn advance(&mut self, text: &str, size: f64) -> f64;

    fn line_height(&self, size: f64) -> f64 {
        size * 1.25
    }
}

/// Fixed-advance measurer used when no font is configured.
#[derive(Clone, Copy, Debug)]
pub struct ApproxMeasure {
    /// Advance of one character in ems.
    pub em_advance: f64,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { em_advance: 0.55 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn advance(&mut self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * self.em_advance
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub width: f64,
}

/// A wrapped, size-fitted block of caption text.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TextBlock {
    pub font_size: f64,
    pub line_height: f64,
    pub lines: Vec<TextLine>,
    pub width: f64,
    pub height: f64,
}

impl TextBlock {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedWord {
    pub text: String,
    /// Left edge relative to the chunk's horizontal centre.
    pub x: f64,
    /// Top edge relative to the chunk's vertical centre.
    pub y: f64,
    pub width: f64,
}

/// One dynamic-mode word chunk with per-word positions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChunkLayout {
    pub font_size: f64,
    pub line_height: f64,
    pub words: Vec<PlacedWord>,
    pub width: f64,
    pub height: f64,
}

/// Precomputed caption geometry for one scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CaptionLayout {
    pub narration: TextBlock,
    pub subtitle: TextBlock,
    /// Narration words in order.
    pub words: Vec<String>,
    /// Dynamic-mode chunks; empty in standard mode.
    pub chunks: Vec<ChunkLayout>,
}

/// Parameters of the font-size fit search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitParams {
    pub max_width: f64,
    pub max_lines: usize,
    pub max_size: f64,
    pub min_size: f64,
    pub step: f64,
}

/// Caption layout inputs shared by every scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionLayoutOpts {
    pub narration: FitParams,
    pub subtitle: FitParams,
    pub words_per_chunk: usize,
    pub dynamic: bool,
}

pub const FIT_STEP_PX: f64 = 2.0;
const CHUNK_MAX_LINES: usize = 2;

/// Greedy word wrap at `size`. A word wider than `max_width` gets a line of its own.
pub fn wrap_words(
    words: &[&str],
    size: f64,
    max_width: f64,
    measure: &mut dyn TextMeasure,
) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0;
    for &word in words {
        if current.is_empty() {
            current.push_str(word);
            current_w = measure.advance(&current, size);
            continue;
        }
        let candidate = format!("{current} {word}");
        let w = measure.advance(&candidate, size);
        if w <= max_width {
            current = candidate;
            current_w = w;
        } else {
            lines.push(TextLine {
                text: std::mem::take(&mut current),
                width: current_w,
            });
            current.push_str(word);
            current_w = measure.advance(&current, size);
        }
    }
    if !current.is_empty() {
        lines.push(TextLine {
            text: current,
            width: current_w,
        });
    }
    lines
}

/// Search font sizes from `max_size` downward until the wrapped text fits the line budget.
///
/// Falls back to `min_size` when nothing fits.
pub fn fit_text(text: &str, params: FitParams, measure: &mut dyn TextMeasure) -> TextBlock {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return TextBlock {
            font_size: params.max_size,
            line_height: measure.line_height(params.max_size),
            ..TextBlock::default()
        };
    }
    let step = if params.step > 0.0 { params.step } else { FIT_STEP_PX };
    let min = params.min_size.min(params.max_size);

    let mut size = params.max_size;
    loop {
        let lines = wrap_words(&words, size, params.max_width, measure);
        let fits = lines.len() <= params.max_lines.max(1)
            && lines.iter().all(|l| l.width <= params.max_width);
        if fits || size <= min {
            return block(lines, size, measure);
        }
        size = (size - step).max(min);
    }
}

fn block(lines: Vec<TextLine>, size: f64, measure: &mut dyn TextMeasure) -> TextBlock {
    let line_height = measure.line_height(size);
    let width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
    let height = line_height * lines.len() as f64;
    TextBlock {
        font_size: size,
        line_height,
        lines,
        width,
        height,
    }
}

/// Lay out one dynamic chunk on at most two centred lines.
pub fn layout_chunk(words: &[&str], params: FitParams, measure: &mut dyn TextMeasure) -> ChunkLayout {
    let fitted = fit_text(
        &words.join(" "),
        FitParams {
            max_lines: CHUNK_MAX_LINES,
            ..params
        },
        measure,
    );
    let size = fitted.font_size;
    let space = measure.advance(" ", size);
    let height = fitted.height;

    let mut placed = Vec::with_capacity(words.len());
    for (line_i, line) in fitted.lines.iter().enumerate() {
        let y = line_i as f64 * fitted.line_height - height / 2.0;
        let mut x = -line.width / 2.0;
        for word in line.text.split(' ') {
            let width = measure.advance(word, size);
            placed.push(PlacedWord {
                text: word.to_owned(),
                x,
                y,
                width,
            });
            x += width + space;
        }
    }

    ChunkLayout {
        font_size: size,
        line_height: fitted.line_height,
        words: placed,
        width: fitted.width,
        height,
    }
}

/// Precompute caption geometry for one scene.
pub fn layout_captions(
    narration: &str,
    subtitle: &str,
    opts: &CaptionLayoutOpts,
    measure: &mut dyn TextMeasure,
) -> CaptionLayout {
    let words: Vec<&str> = narration.split_whitespace().collect();
    let chunks = if opts.dynamic {
        words
            .chunks(opts.words_per_chunk.max(1))
            .map(|c| layout_chunk(c, opts.narration, measure))
            .collect()
    } else {
        Vec::new()
    };
    CaptionLayout {
        narration: fit_text(narration, opts.narration, measure),
        subtitle: fit_text(subtitle, opts.subtitle, measure),
        words: words.iter().map(|w| (*w).to_owned()).collect(),
        chunks,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/caption_layout.rs"]
mod tests;
