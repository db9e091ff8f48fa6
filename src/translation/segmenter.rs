/*!
 * Text segmentation into bounded chunks.
 *
 * Text is split into sentences first and consecutive sentences are packed
 * greedily into chunks of at most `max_chunk_size` characters. A sentence
 * longer than the limit becomes its own chunk rather than being cut.
 *
 * Chunks keep their trailing whitespace, so concatenating the chunk texts
 * in index order always reproduces the input exactly.
 */

use log::debug;

use crate::errors::SegmentationError;
use crate::language_utils;

/// An ordered slice of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the source text
    pub index: usize,
    /// The chunk text, including trailing whitespace
    pub text: String,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Length in bytes
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Trailing whitespace of the chunk text
    pub fn trailing_whitespace(&self) -> &str {
        let trimmed = self.text.trim_end();
        &self.text[trimmed.len()..]
    }
}

/// Returned by a tokenizer that lacks the resources for a language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerUnavailable {
    pub language: String,
}

/// Finds sentence boundaries in text
///
/// A boundary is a byte offset strictly inside the text where a new sentence
/// starts. Trailing whitespace belongs to the sentence before the boundary.
pub trait SentenceTokenizer: Send + Sync {
    /// Tokenizer name for diagnostics
    fn name(&self) -> &'static str;

    /// Sentence boundaries in ascending order
    fn boundaries(&self, text: &str, language: &str) -> Result<Vec<usize>, TokenizerUnavailable>;
}

const TERMINALS: [char; 4] = ['.', '!', '?', '…'];
const CJK_TERMINALS: [char; 3] = ['。', '！', '？'];
const CLOSERS: [char; 11] = ['"', '\'', '”', '’', ')', ']', '}', '»', '」', '』', '）'];
const OPENERS: [char; 8] = ['"', '\'', '“', '‘', '(', '[', '«', '¿'];

/// Abbreviations that end in a period without ending a sentence
fn abbreviations(language: &str) -> Option<&'static [&'static str]> {
    let list: &'static [&'static str] = match language {
        "en" => &[
            "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc",
            "ltd", "co", "corp", "no", "approx", "dept", "fig", "jan", "feb", "mar", "apr", "jun",
            "jul", "aug", "sep", "sept", "oct", "nov", "dec", "a.m", "p.m", "u.s",
        ],
        "de" => &[
            "z.b", "bzw", "usw", "dr", "prof", "nr", "ca", "vgl", "evtl", "ggf", "inkl", "str",
            "d.h", "u.a", "hr", "fr",
        ],
        "fr" => &["m", "mme", "mlle", "dr", "etc", "p.ex", "cf", "av", "bd", "env"],
        "es" => &["sr", "sra", "srta", "dr", "dra", "etc", "ud", "uds", "p.ej", "av", "núm"],
        "it" => &["sig", "sigg", "dott", "prof", "ecc", "es", "avv", "ing"],
        "pt" => &["sr", "sra", "dr", "dra", "etc", "av", "p.ex", "nº"],
        "nl" => &["dhr", "mevr", "dr", "bijv", "enz", "o.a", "d.w.z", "nr"],
        "ru" => &["г", "гг", "ул", "т.е", "т.д", "т.п", "т.к", "др", "пр", "см", "стр", "им"],
        "uk" => &["м", "вул", "т.д", "т.п", "р", "див", "ім"],
        "pl" => &["np", "itd", "itp", "dr", "prof", "ul", "tzn", "tj", "godz"],
        "zh" | "ja" | "ko" => &[],
        _ => return None,
    };
    Some(list)
}

/// Byte length of the whitespace run starting at `from`
fn whitespace_run(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(text.len() - from)
}

/// Skip consecutive characters from `set` starting at `from`
fn skip_chars(text: &str, from: usize, set: &[char]) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !set.contains(c))
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// The word immediately before byte offset `end`, without leading openers
fn word_before(text: &str, end: usize) -> &str {
    let start = text[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    text[start..end].trim_start_matches(|c| OPENERS.contains(&c))
}

/// The word starting at byte offset `start`, without leading openers
fn word_after(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    rest[..end].trim_start_matches(|c| OPENERS.contains(&c))
}

/// A single uppercase letter, as in "J." or "C."
fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

/// Rule-based sentence tokenizer with per-language abbreviation lists
#[derive(Debug, Clone, Default)]
pub struct RuleBasedTokenizer;

impl RuleBasedTokenizer {
    /// Whether the period at `period_at` ends a sentence, given the word at `next_at`
    fn ends_sentence(text: &str, period_at: usize, next_at: usize, abbreviations: &[&str]) -> bool {
        let word = word_before(text, period_at);
        if word.is_empty() {
            return true;
        }
        let lowered = word.to_lowercase();
        if abbreviations.contains(&lowered.as_str()) {
            return false;
        }

        let next = word_after(text, next_at);
        if next.chars().next().is_some_and(char::is_lowercase) {
            return !(is_initial(word) || Self::is_list_number(word));
        }

        // Initials such as "J. R. R. Tolkien" or "John F. Kennedy"
        if is_initial(word) {
            let next_is_initial = next.strip_suffix('.').is_some_and(is_initial);
            let head = text[..period_at - word.len()].trim_end();
            let previous = word_before(text, head.len());
            let previous = previous.strip_suffix('.').unwrap_or(previous);
            let after_name = is_initial(previous) || previous.chars().next().is_some_and(char::is_uppercase);
            return !(next_is_initial || after_name);
        }
        true
    }

    /// List numbering such as "1." or "12."
    fn is_list_number(word: &str) -> bool {
        word.len() <= 2 && word.chars().all(|c| c.is_ascii_digit())
    }
}

impl SentenceTokenizer for RuleBasedTokenizer {
    fn name(&self) -> &'static str {
        "rule-based"
    }

    fn boundaries(&self, text: &str, language: &str) -> Result<Vec<usize>, TokenizerUnavailable> {
        let resource_language = if language_utils::is_auto(language) {
            "en".to_string()
        } else {
            language_utils::normalize_to_part1_or_part2t(language)
                .unwrap_or_else(|_| language_utils::primary_subtag(language))
        };
        let abbreviations = abbreviations(&resource_language).ok_or_else(|| TokenizerUnavailable {
            language: language.to_string(),
        })?;

        let mut boundaries = Vec::new();
        let mut pos = 0;
        while let Some((offset, c)) = text[pos..].char_indices().next() {
            let at = pos + offset;
            let next = at + c.len_utf8();

            if c == '\n' {
                let run_end = at + whitespace_run(text, at);
                let newlines = text[at..run_end].matches('\n').count();
                if newlines >= 2 && run_end < text.len() {
                    boundaries.push(run_end);
                }
                pos = run_end;
                continue;
            }

            if CJK_TERMINALS.contains(&c) {
                let end = skip_chars(text, skip_chars(text, next, &CJK_TERMINALS), &CLOSERS);
                let end = end + whitespace_run(text, end);
                if end < text.len() {
                    boundaries.push(end);
                }
                pos = end;
                continue;
            }

            if TERMINALS.contains(&c) {
                let end = skip_chars(text, skip_chars(text, next, &TERMINALS), &CLOSERS);
                let ws = whitespace_run(text, end);
                let is_boundary = ws > 0
                    && end + ws < text.len()
                    && (c != '.' || next != end || Self::ends_sentence(text, at, end + ws, abbreviations));
                if is_boundary {
                    boundaries.push(end + ws);
                }
                pos = end;
                continue;
            }

            pos = next;
        }

        Ok(boundaries)
    }
}

/// Naive splitter used when no linguistic resources are available
///
/// Breaks after any whitespace that follows punctuation and after every
/// line break.
#[derive(Debug, Clone, Default)]
pub struct NaiveTokenizer;

const NAIVE_PUNCTUATION: [char; 10] = ['.', '!', '?', '…', ';', ':', '。', '！', '？', '；'];

impl SentenceTokenizer for NaiveTokenizer {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn boundaries(&self, text: &str, _language: &str) -> Result<Vec<usize>, TokenizerUnavailable> {
        let mut boundaries = Vec::new();
        let mut previous: Option<char> = None;
        let mut pos = 0;
        while let Some((offset, c)) = text[pos..].char_indices().next() {
            let at = pos + offset;
            if c.is_whitespace() {
                let run_end = at + whitespace_run(text, at);
                let after_punctuation = previous.is_some_and(|p| NAIVE_PUNCTUATION.contains(&p));
                if (after_punctuation || text[at..run_end].contains('\n')) && run_end < text.len() {
                    boundaries.push(run_end);
                }
                previous = text[..run_end].chars().next_back();
                pos = run_end;
                continue;
            }
            previous = Some(c);
            pos = at + c.len_utf8();
        }
        Ok(boundaries)
    }
}

/// Delimiters of opaque structural markers, e.g. `<<ENTRY_3>>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMarkers {
    pub open: String,
    pub close: String,
}

impl Default for StructuralMarkers {
    fn default() -> Self {
        Self {
            open: "<<".to_string(),
            close: ">>".to_string(),
        }
    }
}

impl StructuralMarkers {
    /// Byte spans of every complete marker in the text
    pub fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        if self.open.is_empty() || self.close.is_empty() {
            return spans;
        }
        let mut from = 0;
        while let Some(start) = text[from..].find(&self.open).map(|i| from + i) {
            let body = start + self.open.len();
            match text[body..].find(&self.close) {
                Some(i) => {
                    let end = body + i + self.close.len();
                    spans.push((start, end));
                    from = end;
                }
                None => break,
            }
        }
        spans
    }

    /// Whether the text contains at least one marker
    pub fn contains_marker(&self, text: &str) -> bool {
        !self.spans(text).is_empty()
    }
}

/// Splits text into ordered chunks bounded by a maximum size
pub struct TextSegmenter {
    tokenizer: Box<dyn SentenceTokenizer>,
    fallback: NaiveTokenizer,
    markers: Option<StructuralMarkers>,
    language: String,
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSegmenter {
    /// Create a segmenter with the rule-based tokenizer and default markers
    pub fn new() -> Self {
        Self {
            tokenizer: Box::new(RuleBasedTokenizer),
            fallback: NaiveTokenizer,
            markers: Some(StructuralMarkers::default()),
            language: language_utils::AUTO.to_string(),
        }
    }

    /// Set the source language used to pick tokenizer resources
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Replace the primary tokenizer
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn SentenceTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Set or disable the structural marker scheme
    pub fn with_markers(mut self, markers: Option<StructuralMarkers>) -> Self {
        self.markers = markers;
        self
    }

    /// Split text into chunks of at most `max_chunk_size` characters
    pub fn segment(&self, text: &str, max_chunk_size: usize) -> Result<Vec<Chunk>, SegmentationError> {
        self.segment_language(text, &self.language, max_chunk_size)
    }

    /// Like `segment`, picking tokenizer resources for `language`
    pub fn segment_language(
        &self,
        text: &str,
        language: &str,
        max_chunk_size: usize,
    ) -> Result<Vec<Chunk>, SegmentationError> {
        if max_chunk_size == 0 {
            return Err(SegmentationError::InvalidChunkSize(max_chunk_size));
        }
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut boundaries = match self.tokenizer.boundaries(text, language) {
            Ok(boundaries) => boundaries,
            Err(unavailable) => {
                debug!(
                    "{} tokenizer unavailable for '{}', using naive splitter",
                    self.tokenizer.name(),
                    unavailable.language
                );
                self.fallback.boundaries(text, language).unwrap_or_default()
            }
        };

        if let Some(markers) = &self.markers {
            let spans = markers.spans(text);
            boundaries.retain(|&b| !spans.iter().any(|&(start, end)| start < b && b < end));
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut chunk_start = 0;
        let mut chunk_chars = 0;
        let mut piece_start = 0;

        for piece_end in boundaries.into_iter().chain(std::iter::once(text.len())) {
            if piece_end <= piece_start {
                continue;
            }
            let piece_chars = text[piece_start..piece_end].chars().count();
            if chunk_chars > 0 && chunk_chars + piece_chars > max_chunk_size {
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: text[chunk_start..piece_start].to_string(),
                });
                chunk_start = piece_start;
                chunk_chars = 0;
            }
            chunk_chars += piece_chars;
            piece_start = piece_end;
        }

        chunks.push(Chunk {
            index: chunks.len(),
            text: text[chunk_start..].to_string(),
        });

        Ok(chunks)
    }
}

/// Segment text with the default segmenter
pub fn segment(text: &str, max_chunk_size: usize) -> Result<Vec<Chunk>, SegmentationError> {
    TextSegmenter::new().segment(text, max_chunk_size)
}
