/*!
 * Tests for glossary matching through the public API
 */

use multitrans::errors::GlossaryError;
use multitrans::translation::glossary::{Glossary, GlossaryApplier, GlossaryEntry, GlossaryStore};

use crate::common::create_temp_dir;

fn numbered_entries(count: usize) -> Vec<GlossaryEntry> {
    (0..count)
        .map(|i| GlossaryEntry::new(format!("term{}", i), format!("T{}", i), false))
        .collect()
}

#[test]
fn test_apply_withTwentyThousandEntries_shouldCompileAndSubstitute() {
    let mut entries = numbered_entries(20_000);
    entries.push(GlossaryEntry::new("hello", "HI", false));

    let applier = GlossaryApplier::new(&entries).unwrap();

    assert_eq!(applier.apply("hello"), "HI");
    assert_eq!(applier.apply("Term19999 and TERM7 say Hello"), "T19999 and T7 say HI");
}

#[test]
fn test_withSizeLimit_whenMatcherTooLarge_shouldFailWithPatternError() {
    let result = GlossaryApplier::with_size_limit(&numbered_entries(100), 1024);
    assert!(matches!(result, Err(GlossaryError::Pattern(_))));
}

#[test]
fn test_apply_withEmptyGlossary_shouldReturnInputUnchanged() {
    let applier = GlossaryApplier::new(&[]).unwrap();
    assert_eq!(applier.apply("Nothing to replace"), "Nothing to replace");
}

#[test]
fn test_apply_withEarlierShorterMatch_shouldPreferLeftmost() {
    let applier = GlossaryApplier::new(&[
        GlossaryEntry::new("ab", "X", true),
        GlossaryEntry::new("bcd", "Y", true),
    ])
    .unwrap();
    assert_eq!(applier.apply("abcd"), "Xcd");
    assert_eq!(applier.apply("bcd abcd"), "Y Xcd");
}

#[test]
fn test_apply_caseInsensitive_withNonAsciiLetters_shouldFoldCase() {
    let applier = GlossaryApplier::new(&[GlossaryEntry::new("Ärger", "trouble", false)]).unwrap();
    assert_eq!(applier.apply("ÄRGER und ärger"), "trouble und trouble");
}

#[test]
fn test_apply_withCaseSensitiveVariant_shouldFallBackToInsensitiveEntryForOtherCasing() {
    let mut glossary = Glossary::new();
    glossary.add(GlossaryEntry::new("bank", "shore", false)).unwrap();
    glossary.add(GlossaryEntry::new("Bank", "Institution", true)).unwrap();

    assert_eq!(glossary.apply("BANK Bank bank").unwrap(), "shore Institution shore");
}

#[test]
fn test_store_saveTwice_shouldOverwritePreviousEntries() {
    let dir = create_temp_dir().unwrap();
    let store = GlossaryStore::new(dir.path().join("glossary.json"));

    let mut first = Glossary::new();
    first.add(GlossaryEntry::new("one", "eins", false)).unwrap();
    store.save(&first).unwrap();

    let mut second = Glossary::new();
    second.add(GlossaryEntry::new("two", "zwei", true)).unwrap();
    store.save(&second).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, second);
    assert_eq!(loaded.apply("one two").unwrap(), "one zwei");
}
