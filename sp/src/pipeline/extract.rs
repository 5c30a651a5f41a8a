//! Candidate payload extraction
//!
//! Models wrap JSON in code fences and chatty prose. The extractor peels the
//! wrapping off and isolates the bracketed span that most likely holds the
//! answer. It never parses JSON; that is the validator's job.

use tracing::debug;

use super::error::{DEFAULT_SAMPLE_CHARS, ExtractionError, sample};

const FENCE: &str = "```";

/// Substring of a model response believed to hold a JSON array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePayload {
    text: String,
}

impl CandidatePayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Isolates the structured payload in a raw model response
#[derive(Debug, Clone)]
pub struct TextExtractor {
    sample_chars: usize,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CHARS)
    }
}

impl TextExtractor {
    pub fn new(sample_chars: usize) -> Self {
        Self { sample_chars }
    }

    /// Extract the candidate JSON array from `raw`
    ///
    /// Prefers the first balanced `[...]` that holds an object, then a
    /// truncated array of objects, then the first balanced `[...]`.
    pub fn extract(&self, raw: &str) -> Result<CandidatePayload, ExtractionError> {
        debug!(raw_len = raw.len(), "extract: called");
        let body = strip_fences(raw.trim());

        match locate_array(body) {
            Some(span) => {
                debug!(span_len = span.len(), "extract: found candidate");
                Ok(CandidatePayload::new(span))
            }
            None => {
                debug!("extract: no bracketed span");
                Err(ExtractionError::NoStructuredPayload {
                    raw_sample: sample(raw.trim(), self.sample_chars),
                })
            }
        }
    }
}

/// Split a free-text response into task lines
///
/// Lines are trimmed; anything of 3 chars or fewer is noise. At most
/// `limit` lines are kept.
pub fn extract_lines(raw: &str, limit: usize) -> Vec<String> {
    debug!(raw_len = raw.len(), %limit, "extract_lines: called");
    raw.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 3)
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Drop a leading fence line (with optional language tag) and a trailing fence
fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };
    let Some(newline) = rest.find('\n') else {
        debug!("strip_fences: fence without newline, leaving as is");
        return text;
    };
    let body = rest[newline + 1..].trim_end();
    body.strip_suffix(FENCE).unwrap_or(body).trim()
}

/// An opening bracket still waiting for its `]`
struct Open {
    at: usize,
    /// A `{` outside string literals was seen inside this bracket
    has_object: bool,
}

/// Single forward pass over `text` with a stack of open brackets
///
/// Brackets and braces inside JSON string literals are ignored. Strings are
/// only tracked inside a bracket, so quotes in surrounding prose do not
/// matter. Byte-wise scanning is safe because every delimiter is ASCII.
fn locate_array(text: &str) -> Option<&str> {
    let mut stack: Vec<Open> = Vec::new();
    let mut first_open = None;
    let mut first_object: Option<(usize, usize)> = None;
    let mut first_plain: Option<(usize, usize)> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'[' => {
                first_open.get_or_insert(i);
                stack.push(Open { at: i, has_object: false });
            }
            b'"' if !stack.is_empty() => in_string = true,
            b'{' => {
                if let Some(top) = stack.last_mut() {
                    top.has_object = true;
                }
            }
            b']' => {
                let Some(open) = stack.pop() else {
                    continue;
                };
                // Enclosing spans close later but start earlier, so they win
                let slot = if open.has_object {
                    if let Some(parent) = stack.last_mut() {
                        parent.has_object = true;
                    }
                    &mut first_object
                } else {
                    &mut first_plain
                };
                if slot.is_none_or(|(at, _)| open.at < at) {
                    *slot = Some((open.at, i));
                }
                if stack.is_empty() && first_object.is_some() {
                    break;
                }
            }
            _ => {}
        }
    }

    if let Some((open, close)) = first_object {
        debug!(open, close, "locate_array: balanced array of objects");
        return Some(&text[open..=close]);
    }

    // Only the very first bracket may be a truncated answer
    if let Some(bottom) = stack.first()
        && Some(bottom.at) == first_open
        && stack.iter().any(|o| o.has_object)
    {
        debug!(open = bottom.at, "locate_array: first array never closes");
        return Some(&text[bottom.at..]);
    }

    first_plain.map(|(open, close)| &text[open..=close])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> Result<CandidatePayload, ExtractionError> {
        TextExtractor::default().extract(raw)
    }

    #[test]
    fn test_bare_array_passes_through() {
        let raw = r#"["Review notes", "Do practice set"]"#;
        assert_eq!(extract(raw).unwrap().as_str(), raw);
    }

    #[test]
    fn test_strips_fence_with_language_tag() {
        let raw = "```json\n[{\"dateOrWeek\":\"2024-07-01\",\"focus\":\"Cells\",\"details\":\"Read ch.1\"}]\n```";
        assert_eq!(
            extract(raw).unwrap().as_str(),
            r#"[{"dateOrWeek":"2024-07-01","focus":"Cells","details":"Read ch.1"}]"#
        );
    }

    #[test]
    fn test_strips_bare_fence_and_whitespace() {
        let raw = "\n  ```\n[\"a\", \"b\"]\n```  \n";
        assert_eq!(extract(raw).unwrap().as_str(), r#"["a", "b"]"#);
    }

    #[test]
    fn test_surrounding_prose_is_dropped() {
        let raw = "Sure! Here is your plan:\n[{\"focus\": \"x\"}]\nGood luck with the exam.";
        assert_eq!(extract(raw).unwrap().as_str(), r#"[{"focus": "x"}]"#);
    }

    #[test]
    fn test_prefers_array_of_objects_over_earlier_bracket() {
        let raw = "Plan [draft]:\n[{\"focus\": \"x\"}]";
        assert_eq!(extract(raw).unwrap().as_str(), r#"[{"focus": "x"}]"#);
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let raw = r#"[{"focus": "Arrays ]", "details": "use a[i] {not} this"}] trailing ]"#;
        assert_eq!(
            extract(raw).unwrap().as_str(),
            r#"[{"focus": "Arrays ]", "details": "use a[i] {not} this"}]"#
        );
    }

    #[test]
    fn test_brackets_in_string_do_not_start_a_span() {
        let raw = r#"["see [{x}] here", "ok"]"#;
        assert_eq!(extract(raw).unwrap().as_str(), raw);
    }

    #[test]
    fn test_nested_object_array_inside_truncated_outer() {
        let raw = r#"[[{"focus": "a"}], [{"focus": "b""#;
        assert_eq!(extract(raw).unwrap().as_str(), r#"[{"focus": "a"}]"#);
    }

    #[test]
    fn test_bracket_heavy_input_is_linear() {
        let raw = format!("{}{}", "[".repeat(200_000), "]".repeat(200_000));
        let candidate = extract(&raw).unwrap();
        assert_eq!(candidate.as_str().len(), 400_000);

        let err = extract(&"[".repeat(200_000)).unwrap_err();
        assert!(matches!(err, ExtractionError::NoStructuredPayload { .. }));
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let raw = r#"["say \"hi]\"", "ok"] done"#;
        assert_eq!(extract(raw).unwrap().as_str(), r#"["say \"hi]\"", "ok"]"#);
    }

    #[test]
    fn test_brace_in_string_is_not_an_object() {
        // Plain array with a brace in a string still counts as plain
        let raw = r#"["{x}"] then [{"focus": "y"}]"#;
        assert_eq!(extract(raw).unwrap().as_str(), r#"[{"focus": "y"}]"#);
    }

    #[test]
    fn test_truncated_array_of_objects() {
        let raw = "```json\n[{\"focus\": \"a\", \"details\": \"b\"}, {\"focus\": \"c\"";
        assert_eq!(
            extract(raw).unwrap().as_str(),
            "[{\"focus\": \"a\", \"details\": \"b\"}, {\"focus\": \"c\""
        );
    }

    #[test]
    fn test_unclosed_plain_bracket_is_not_a_payload() {
        let err = extract("see [note").unwrap_err();
        assert!(
            matches!(err, ExtractionError::NoStructuredPayload { .. }),
            "expected NoStructuredPayload, got: {err}"
        );
    }

    #[test]
    fn test_no_brackets() {
        let err = extract("not json at all").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::NoStructuredPayload {
                raw_sample: "not json at all".to_string()
            }
        );
    }

    #[test]
    fn test_raw_sample_is_bounded() {
        let raw = "x".repeat(1000);
        let err = TextExtractor::new(16).extract(&raw).unwrap_err();
        let ExtractionError::NoStructuredPayload { raw_sample } = err;
        assert_eq!(raw_sample, format!("{}...", "x".repeat(16)));
    }

    #[test]
    fn test_fence_without_newline_left_alone() {
        let raw = "```[\"a\"]```";
        assert_eq!(extract(raw).unwrap().as_str(), r#"["a"]"#);
    }

    #[test]
    fn test_extract_lines() {
        let raw = "1. Read chapter one\n\n  ok \n2. Flashcards for cell parts\nhi\n3. Practice quiz\n4. Review\n5. Summarize\n6. Extra";
        let lines = extract_lines(raw, 5);
        assert_eq!(
            lines,
            vec![
                "1. Read chapter one",
                "2. Flashcards for cell parts",
                "3. Practice quiz",
                "4. Review",
                "5. Summarize",
            ]
        );
    }

    #[test]
    fn test_extract_lines_empty() {
        assert!(extract_lines("", 5).is_empty());
        assert!(extract_lines("a\nbb\nccc", 5).is_empty());
    }
}
