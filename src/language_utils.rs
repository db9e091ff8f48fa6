/*!
 * Language utilities for ISO language code handling.
 *
 * Accepted codes are ISO 639-1 and ISO 639-2 codes, optionally followed by
 * a region subtag (`zh-cn`, `pt_BR`). Source languages may also be `auto`.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Source language value meaning "let the provider detect it"
pub const AUTO: &str = "auto";

/// Check whether a code requests automatic source detection
pub fn is_auto(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(AUTO)
}

/// Strip any region subtag and lowercase the primary language subtag
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Map an ISO 639-2/B code to its ISO 639-2/T equivalent
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

fn lookup(code: &str) -> Option<Language> {
    let primary = primary_subtag(code);
    match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => {
            let part2t = bibliographic_to_terminology(&primary).unwrap_or(&primary);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate a target language code
pub fn validate_language_code(code: &str) -> Result<()> {
    lookup(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Validate a source language code, which may also be `auto`
pub fn validate_source_language_code(code: &str) -> Result<()> {
    if is_auto(code) {
        return Ok(());
    }
    validate_language_code(code)
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Language name suitable for a natural-language prompt
///
/// `auto` becomes "the source language"; unknown codes are used verbatim.
pub fn prompt_language_name(code: &str) -> String {
    if is_auto(code) {
        return "the source language".to_string();
    }
    get_language_name(code).unwrap_or_else(|_| code.to_string())
}
