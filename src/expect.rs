//! Assertion helpers used by page checks.
//!
//! Every helper returns `Ok(())` on success and
//! [`Error::AssertionFailed`](crate::Error::AssertionFailed) carrying the
//! expectation, the expected value and the observed value otherwise.

use unicode_normalization::UnicodeNormalization;

use crate::pattern::parse_slash_pattern;
use crate::{ElementRef, Error, Result, truncate_chars};

const ACTUAL_PREVIEW_CHARS: usize = 120;

fn failed(expectation: &str, expected: impl Into<String>, actual: impl Into<String>) -> Error {
    Error::AssertionFailed {
        expectation: expectation.to_string(),
        expected: expected.into(),
        actual: actual.into(),
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", truncate_chars(value, ACTUAL_PREVIEW_CHARS))
}

/// Canonical composition, so precomposed and combining-mark spellings of
/// the same text compare equal.
pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

/// Substring test that tolerates differences in Unicode normalization form.
pub fn text_contains(haystack: &str, needle: &str) -> bool {
    haystack.contains(needle) || normalize(haystack).contains(&normalize(needle))
}

pub fn equals(expectation: &str, expected: &str, actual: &str) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    Err(failed(expectation, quoted(expected), quoted(actual)))
}

pub fn not_equal(expectation: &str, forbidden: &str, actual: &str) -> Result<()> {
    if actual != forbidden {
        return Ok(());
    }
    Err(failed(expectation, format!("not {}", quoted(forbidden)), quoted(actual)))
}

pub fn contains(expectation: &str, haystack: &str, needle: &str) -> Result<()> {
    if text_contains(haystack, needle) {
        return Ok(());
    }
    Err(failed(
        expectation,
        format!("text containing {}", quoted(needle)),
        quoted(haystack),
    ))
}

/// Matches `text` against a `/pattern/flags` literal (`i` and `s` flags).
pub fn matches(expectation: &str, text: &str, literal: &str) -> Result<()> {
    let pattern = parse_slash_pattern(literal)?;
    if pattern.is_match(text)? {
        return Ok(());
    }
    Err(failed(
        expectation,
        format!("text matching {}", pattern.source()),
        quoted(text),
    ))
}

pub fn present<'a>(expectation: &str, selector: &str, found: Option<ElementRef<'a>>) -> Result<ElementRef<'a>> {
    found.ok_or_else(|| failed(expectation, format!("an element matching {selector}"), "none"))
}

pub fn absent(expectation: &str, selector: &str, found: Option<ElementRef<'_>>) -> Result<()> {
    match found {
        None => Ok(()),
        Some(element) => Err(failed(
            expectation,
            format!("no element matching {selector}"),
            element.snippet(),
        )),
    }
}

pub fn present_attr(expectation: &str, name: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(_) => Ok(()),
        None => Err(failed(expectation, format!("a {name} attribute"), "none")),
    }
}

pub fn count(expectation: &str, selector: &str, expected: usize, found: &[ElementRef<'_>]) -> Result<()> {
    if found.len() == expected {
        return Ok(());
    }
    Err(failed(
        expectation,
        format!("{expected} element(s) matching {selector}"),
        describe_matches(found),
    ))
}

pub fn at_least(expectation: &str, selector: &str, minimum: usize, found: &[ElementRef<'_>]) -> Result<()> {
    if found.len() >= minimum {
        return Ok(());
    }
    Err(failed(
        expectation,
        format!("at least {minimum} element(s) matching {selector}"),
        describe_matches(found),
    ))
}

fn describe_matches(found: &[ElementRef<'_>]) -> String {
    match found {
        [] => "0 elements".to_string(),
        [only] => format!("1 element: {}", only.snippet()),
        [first, ..] => format!("{} elements, first: {}", found.len(), first.snippet()),
    }
}
