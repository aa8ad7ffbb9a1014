use crate::{Error, Result};

/// A compiled raw-text pattern backed by `fancy_regex`.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    source: String,
    backend: fancy_regex::Regex,
}

impl Pattern {
    pub(crate) fn is_match(&self, input: &str) -> Result<bool> {
        self.backend
            .is_match(input)
            .map_err(|err| invalid(&self.source, err))
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PatternBuilder {
    pattern: String,
    case_insensitive: bool,
    dot_matches_new_line: bool,
}

impl PatternBuilder {
    pub(crate) fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            case_insensitive: false,
            dot_matches_new_line: false,
        }
    }

    pub(crate) fn case_insensitive(&mut self, enabled: bool) -> &mut Self {
        self.case_insensitive = enabled;
        self
    }

    pub(crate) fn dot_matches_new_line(&mut self, enabled: bool) -> &mut Self {
        self.dot_matches_new_line = enabled;
        self
    }

    pub(crate) fn build(&self) -> Result<Pattern> {
        let mut builder = fancy_regex::RegexBuilder::new(&self.pattern);
        builder.case_insensitive(self.case_insensitive);
        builder.dot_matches_new_line(self.dot_matches_new_line);
        let backend = builder.build().map_err(|err| invalid(&self.pattern, err))?;
        Ok(Pattern {
            source: self.pattern.clone(),
            backend,
        })
    }
}

/// Parses the `/body/flags` notation used by the page suites. Supported
/// flags are `i` and `s`.
pub(crate) fn parse_slash_pattern(literal: &str) -> Result<Pattern> {
    let malformed = || Error::InvalidPattern {
        pattern: literal.to_string(),
        message: "expected /pattern/flags".into(),
    };
    let body = literal.strip_prefix('/').ok_or_else(malformed)?;
    let close = body.rfind('/').ok_or_else(malformed)?;
    let (pattern, flags) = (&body[..close], &body[close + 1..]);

    let mut builder = PatternBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            's' => builder.dot_matches_new_line(true),
            other => {
                return Err(Error::InvalidPattern {
                    pattern: literal.to_string(),
                    message: format!("unsupported flag '{other}'"),
                });
            }
        };
    }
    builder.build()
}

fn invalid(pattern: &str, err: fancy_regex::Error) -> Error {
    Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_all_flag_spans_lines() -> Result<()> {
        let html = "<head>\n  <title>x</title>\n</head>";
        assert!(parse_slash_pattern(r"/<head>.*</head>/s")?.is_match(html)?);
        assert!(!parse_slash_pattern(r"/<head>.*</head>/")?.is_match(html)?);
        Ok(())
    }

    #[test]
    fn case_insensitive_flag() -> Result<()> {
        let pattern = parse_slash_pattern("/<!doctype html>/i")?;
        assert!(pattern.is_match("<!DOCTYPE html>")?);
        assert!(pattern.is_match("x<!DocType html>y")?);
        Ok(())
    }

    #[test]
    fn rejects_malformed_literals_and_flags() {
        assert!(matches!(
            parse_slash_pattern("no-slashes"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            parse_slash_pattern("/a/g"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            parse_slash_pattern("/(/"),
            Err(Error::InvalidPattern { .. })
        ));
    }
}
