//! Text Measurement
//!
//! The layout engine never shapes text itself. It talks to two injected
//! collaborators:
//!
//! - [`TextMeasurer`] - width of a run of text in a font
//! - [`LineBreaker`] - split text into lines no wider than a limit
//!
//! Both must be pure and deterministic for a given input. [`TextServices`]
//! bundles them with a bounded width cache; it is owned by the layout engine
//! instead of living in a global, so tests can swap in their own measurer.
//!
//! The defaults are a monospace measurer (`unicode-width` cells times a
//! per-font advance) and a first-fit word wrapper built on `textwrap`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use textwrap::WordSeparator;
use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;
use unicode_width::UnicodeWidthStr;

use crate::config::TextConfig;
use crate::types::Font;

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Measures text width in pixels.
pub trait TextMeasurer: Send + Sync {
    fn measure_width(&self, text: &str, font: &Font) -> f32;

    /// Batched variant. Override when the backend can amortize work.
    fn measure_widths(&self, texts: &[&str], font: &Font) -> Vec<f32> {
        texts.iter().map(|t| self.measure_width(t, font)).collect()
    }
}

/// One wrapped line: a byte range of the source text and its width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: usize,
    pub end: usize,
    pub width: f32,
}

/// Breaks text into lines.
pub trait LineBreaker: Send + Sync {
    fn wrap_text(
        &self,
        text: &str,
        max_width: f32,
        font: &Font,
        measurer: &dyn TextMeasurer,
    ) -> Vec<LineSegment>;
}

// =============================================================================
// Defaults
// =============================================================================

/// Every cell advances by `font.size * char_width_ratio`; wide characters
/// take two cells.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasurer {
    pub char_width_ratio: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self { char_width_ratio: 0.6 }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure_width(&self, text: &str, font: &Font) -> f32 {
        text.width() as f32 * font.size * self.char_width_ratio
    }
}

/// A word plus its trailing whitespace, measured in pixels.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    len: usize,
    width: f64,
    whitespace: f64,
}

impl Fragment for Piece {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.whitespace
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// First-fit word wrapping on ASCII spaces. Hard newlines always break;
/// a word wider than the limit gets a line of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordWrapBreaker;

impl LineBreaker for WordWrapBreaker {
    fn wrap_text(
        &self,
        text: &str,
        max_width: f32,
        font: &Font,
        measurer: &dyn TextMeasurer,
    ) -> Vec<LineSegment> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut lines = Vec::new();
        let mut para_start = 0;
        for para in text.split('\n') {
            wrap_paragraph(para, para_start, max_width, font, measurer, &mut lines);
            para_start += para.len() + 1;
        }
        lines
    }
}

fn wrap_paragraph(
    para: &str,
    base: usize,
    max_width: f32,
    font: &Font,
    measurer: &dyn TextMeasurer,
    out: &mut Vec<LineSegment>,
) {
    let mut pieces = Vec::new();
    let mut offset = base;
    for word in WordSeparator::AsciiSpace.find_words(para) {
        pieces.push(Piece {
            start: offset,
            len: word.word.len(),
            width: f64::from(measurer.measure_width(word.word, font)),
            whitespace: f64::from(measurer.measure_width(word.whitespace, font)),
        });
        offset += word.word.len() + word.whitespace.len();
    }
    if pieces.is_empty() {
        out.push(LineSegment { start: base, end: base, width: 0.0 });
        return;
    }

    let limit = if max_width.is_finite() { f64::from(max_width.max(0.0)) } else { f64::MAX };
    for line in wrap_first_fit(&pieces, &[limit]) {
        let (Some(first), Some(last)) = (line.first(), line.last()) else {
            continue;
        };
        let width: f64 = line.iter().map(|p| p.width + p.whitespace).sum::<f64>() - last.whitespace;
        out.push(LineSegment {
            start: first.start,
            end: last.start + last.len,
            width: width as f32,
        });
    }
}

// =============================================================================
// Text Services
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    family: String,
    size_bits: u32,
}

/// Injected text collaborators plus a bounded width cache.
pub struct TextServices {
    measurer: Arc<dyn TextMeasurer>,
    breaker: Arc<dyn LineBreaker>,
    cache: Mutex<LruCache<CacheKey, f32>>,
}

impl std::fmt::Debug for TextServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("TextServices")
            .field("capacity", &cache.cap())
            .field("cached", &cache.len())
            .finish_non_exhaustive()
    }
}

impl Default for TextServices {
    fn default() -> Self {
        Self::from_config(&TextConfig::default())
    }
}

impl TextServices {
    pub fn new(
        measurer: Arc<dyn TextMeasurer>,
        breaker: Arc<dyn LineBreaker>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            measurer,
            breaker,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Monospace measurer and word wrapper configured from `config`.
    pub fn from_config(config: &TextConfig) -> Self {
        Self::new(
            Arc::new(MonospaceMeasurer { char_width_ratio: config.char_width_ratio }),
            Arc::new(WordWrapBreaker),
            config.cache_capacity,
        )
    }

    /// Width of `text`, served from the cache when possible.
    pub fn measure_width(&self, text: &str, font: &Font) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let key = CacheKey {
            text: text.to_string(),
            family: font.family.clone(),
            size_bits: font.size.to_bits(),
        };
        let mut cache = self.cache.lock();
        if let Some(width) = cache.get(&key) {
            return *width;
        }
        let width = self.measurer.measure_width(text, font);
        cache.put(key, width);
        width
    }

    /// Wrap `text` to `max_width`.
    pub fn wrap(&self, text: &str, max_width: f32, font: &Font) -> Vec<LineSegment> {
        self.breaker.wrap_text(text, max_width, font, self.measurer.as_ref())
    }

    /// Number of lines `text` occupies at `max_width`.
    pub fn line_count(&self, text: &str, max_width: f32, font: &Font) -> usize {
        self.wrap(text, max_width, font).len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn font() -> Font {
        Font::default()
    }

    #[test]
    fn test_monospace_width() {
        let m = MonospaceMeasurer::default();
        assert!((m.measure_width("Hello", &font()) - 42.0).abs() < 1e-4);
        // Wide characters take two cells.
        assert!((m.measure_width("日本", &font()) - 33.6).abs() < 1e-3);
        assert_eq!(m.measure_width("", &font()), 0.0);
    }

    #[test]
    fn test_wrap_two_lines() {
        let m = MonospaceMeasurer::default();
        let text = "A much longer sentence that needs two lines";
        let lines = WordWrapBreaker.wrap_text(text, 200.0, &font(), &m);
        assert_eq!(lines.len(), 2);
        assert_eq!(&text[lines[0].start..lines[0].end], "A much longer sentence");
        assert_eq!(&text[lines[1].start..lines[1].end], "that needs two lines");
        assert!(lines.iter().all(|l| l.width <= 200.0));
    }

    #[test]
    fn test_wrap_hard_newlines_and_long_words() {
        let m = MonospaceMeasurer::default();
        let text = "one\n\nsupercalifragilistic";
        let lines = WordWrapBreaker.wrap_text(text, 50.0, &font(), &m);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].start, lines[1].end);
        assert_eq!(&text[lines[2].start..lines[2].end], "supercalifragilistic");
        assert!(lines[2].width > 50.0);
    }

    #[test]
    fn test_unbounded_wrap_is_one_line() {
        let services = TextServices::default();
        assert_eq!(services.line_count("a b c d e f", f32::INFINITY, &font()), 1);
        assert_eq!(services.line_count("", 100.0, &font()), 0);
    }

    struct Counting(AtomicUsize);

    impl TextMeasurer for Counting {
        fn measure_width(&self, text: &str, _font: &Font) -> f32 {
            self.0.fetch_add(1, Ordering::SeqCst);
            text.len() as f32
        }
    }

    #[test]
    fn test_cache_hits_and_eviction() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let services = TextServices::new(counting.clone(), Arc::new(WordWrapBreaker), 2);

        services.measure_width("a", &font());
        services.measure_width("a", &font());
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);

        services.measure_width("bb", &font());
        services.measure_width("a", &font());
        services.measure_width("ccc", &font());
        assert_eq!(services.cache_len(), 2);

        // "bb" was least recently used.
        services.measure_width("a", &font());
        assert_eq!(counting.0.load(Ordering::SeqCst), 3);
        services.measure_width("bb", &font());
        assert_eq!(counting.0.load(Ordering::SeqCst), 4);

        services.clear_cache();
        assert_eq!(services.cache_len(), 0);
    }

    #[test]
    fn test_zero_capacity_still_caches_last_width() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let services = TextServices::new(counting.clone(), Arc::new(WordWrapBreaker), 0);

        services.measure_width("a", &font());
        services.measure_width("a", &font());
        services.measure_width("b", &font());
        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
        assert_eq!(services.cache_len(), 1);
    }
}
