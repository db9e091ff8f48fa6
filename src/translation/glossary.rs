/*!
 * User glossary applied to finished translations.
 *
 * Entries are literal term substitutions. All entries are compiled into a
 * single regex alternation ordered by descending source length, so the
 * leftmost match wins and, among matches starting at the same position,
 * the longest entry wins. Replaced text is never scanned again.
 *
 * When two entries have the same length, case-sensitive entries are tried
 * before case-insensitive ones.
 */

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GlossaryError;

/// A literal term substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl GlossaryEntry {
    pub fn new(source: impl Into<String>, target: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            case_sensitive,
        }
    }

    /// Whether `other` would occupy the same key as this entry
    ///
    /// Two entries differing only in case can co-exist when at least one of
    /// them is case-sensitive.
    fn same_key(&self, other: &GlossaryEntry) -> bool {
        self.source == other.source
            || (!self.case_sensitive
                && !other.case_sensitive
                && self.source.to_lowercase() == other.source.to_lowercase())
    }
}

/// Ordered set of glossary entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, returning the entry it replaced
    pub fn add(&mut self, entry: GlossaryEntry) -> Result<Option<GlossaryEntry>, GlossaryError> {
        if entry.source.is_empty() || entry.target.is_empty() {
            return Err(GlossaryError::EmptyTerm);
        }

        let Some(first) = self.entries.iter().position(|e| e.same_key(&entry)) else {
            self.entries.push(entry);
            return Ok(None);
        };

        let replaced = std::mem::replace(&mut self.entries[first], entry);
        let kept = self.entries[first].clone();
        let mut index = 0;
        self.entries.retain(|e| {
            let keep = index == first || !e.same_key(&kept);
            index += 1;
            keep
        });
        Ok(Some(replaced))
    }

    /// Remove the entry with exactly this source term
    pub fn remove(&mut self, source: &str) -> Option<GlossaryEntry> {
        let index = self.entries.iter().position(|e| e.source == source)?;
        Some(self.entries.remove(index))
    }

    /// Entry with exactly this source term
    pub fn get(&self, source: &str) -> Option<&GlossaryEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add many term pairs at once, skipping empty terms
    pub fn import<I, S, T>(&mut self, pairs: I, case_sensitive: bool) -> usize
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        pairs
            .into_iter()
            .filter_map(|(source, target)| {
                self.add(GlossaryEntry::new(source, target, case_sensitive)).ok()
            })
            .count()
    }

    /// Apply every entry to `text`
    pub fn apply(&self, text: &str) -> Result<String, GlossaryError> {
        Ok(GlossaryApplier::new(&self.entries)?.apply(text))
    }
}

/// Upper bound on the compiled size of the glossary matcher, in bytes
///
/// Each entry adds its own alternative, so large glossaries need far more
/// room than the regex default of 10 MiB.
pub const MATCHER_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Compiled matcher for a set of entries
#[derive(Debug, Clone)]
pub struct GlossaryApplier {
    regex: Option<Regex>,
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

impl GlossaryApplier {
    /// Compile entries into a single alternation
    pub fn new(entries: &[GlossaryEntry]) -> Result<Self, GlossaryError> {
        Self::with_size_limit(entries, MATCHER_SIZE_LIMIT)
    }

    /// Like `new`, failing when the compiled matcher exceeds `size_limit` bytes
    pub fn with_size_limit(entries: &[GlossaryEntry], size_limit: usize) -> Result<Self, GlossaryError> {
        let mut ordered: Vec<(usize, &GlossaryEntry)> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.source.is_empty())
            .collect();
        ordered.sort_by_key(|(index, e)| (Reverse(e.source.chars().count()), !e.case_sensitive, *index));

        let mut applier = Self {
            regex: None,
            exact: HashMap::new(),
            folded: HashMap::new(),
        };
        if ordered.is_empty() {
            return Ok(applier);
        }

        // Groups stay non-capturing: capture slots grow with the entry count.
        let pattern = ordered
            .iter()
            .map(|(_, e)| {
                let flags = if e.case_sensitive { "-i" } else { "i" };
                format!("(?{}:{})", flags, regex::escape(&e.source))
            })
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&pattern)
            .size_limit(size_limit)
            .build()
            .map_err(|e| GlossaryError::Pattern(e.to_string()))?;
        debug!("Compiled glossary matcher with {} entries", ordered.len());

        for (_, entry) in &ordered {
            let (map, key) = if entry.case_sensitive {
                (&mut applier.exact, entry.source.clone())
            } else {
                (&mut applier.folded, fold_case(&entry.source))
            };
            map.entry(key).or_insert_with(|| entry.target.clone());
        }
        applier.regex = Some(regex);
        Ok(applier)
    }

    /// Target for a matched span; case-sensitive entries win ties
    fn target_for(&self, matched: &str) -> Option<&String> {
        self.exact.get(matched).or_else(|| self.folded.get(&fold_case(matched)))
    }

    /// Replace every non-overlapping match with its target term
    pub fn apply(&self, text: &str) -> String {
        let Some(regex) = &self.regex else {
            return text.to_string();
        };
        regex
            .replace_all(text, |caps: &Captures| {
                let matched = &caps[0];
                self.target_for(matched).cloned().unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

#[derive(Debug, Serialize)]
struct GlossaryFile<'a> {
    entries: &'a [GlossaryEntry],
}

/// JSON file persistence for a glossary
#[derive(Debug, Clone)]
pub struct GlossaryStore {
    path: PathBuf,
}

impl GlossaryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, error: std::io::Error) -> GlossaryError {
        GlossaryError::Io {
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }

    fn parse_error(&self, message: impl Into<String>) -> GlossaryError {
        GlossaryError::Parse {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }

    /// Load the glossary; a missing file yields an empty glossary
    pub fn load(&self) -> Result<Glossary, GlossaryError> {
        if !self.path.exists() {
            debug!("No glossary at {}, starting empty", self.path.display());
            return Ok(Glossary::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| self.parse_error(e.to_string()))?;
        let glossary = self.parse(value)?;
        info!("Loaded {} glossary entries from {}", glossary.len(), self.path.display());
        Ok(glossary)
    }

    fn parse(&self, value: Value) -> Result<Glossary, GlossaryError> {
        let Value::Object(mut root) = value else {
            return Err(self.parse_error("expected a JSON object"));
        };
        let mut glossary = Glossary::new();

        match root.remove("entries") {
            Some(Value::Array(items)) => {
                for item in items {
                    let entry: GlossaryEntry =
                        serde_json::from_value(item).map_err(|e| self.parse_error(e.to_string()))?;
                    glossary.add(entry).map_err(|e| self.parse_error(e.to_string()))?;
                }
            }
            Some(Value::Object(map)) => {
                let case_sensitive = root
                    .get("case_sensitive")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                for (source, target) in map {
                    let Value::String(target) = target else {
                        return Err(self.parse_error(format!("entry '{}' is not a string", source)));
                    };
                    glossary.add(GlossaryEntry::new(source, target, case_sensitive))
                        .map_err(|e| self.parse_error(e.to_string()))?;
                }
            }
            Some(_) => return Err(self.parse_error("'entries' must be a list or an object")),
            None => {
                for (source, target) in root {
                    let Value::String(target) = target else {
                        return Err(self.parse_error(format!("entry '{}' is not a string", source)));
                    };
                    glossary.add(GlossaryEntry::new(source, target, false))
                        .map_err(|e| self.parse_error(e.to_string()))?;
                }
            }
        }

        Ok(glossary)
    }

    /// Save the glossary as pretty JSON
    pub fn save(&self, glossary: &Glossary) -> Result<(), GlossaryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(&GlossaryFile {
            entries: glossary.entries(),
        })
        .map_err(|e| self.parse_error(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }
}
