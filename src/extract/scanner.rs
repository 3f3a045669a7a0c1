//! Fragment scanner: locates candidate JSON substrings inside assistant
//! prose.
//!
//! The upstream text generator is uncontrolled: payloads arrive inside
//! fenced ```json blocks, as bare brace-delimited objects, or as arrays of
//! objects, freely interleaved with prose. Fenced blocks are authoritative
//! when present; otherwise a small brace-matching pass extracts balanced
//! top-level objects and arrays. A naive non-greedy regex would truncate at
//! the first nested `}`, so the fallback tracks nesting depth explicitly.
//!
//! Every candidate span is reported even when its payload fails to parse:
//! malformed fragments are dropped from classification but must still be
//! cut out of the displayed prose.

use std::ops::Range;

use regex::Regex;
use serde_json::Value;

/// One parsed fragment: the span it occupied in the original text and its
/// JSON value.
#[derive(Clone, Debug)]
pub struct ScannedFragment {
    /// Byte range of the candidate (including fence markers, when fenced).
    pub span: Range<usize>,
    /// Parsed value.
    pub value: Value,
}

/// Result of one scan pass.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    /// Successfully parsed fragments, in order of appearance.
    pub fragments: Vec<ScannedFragment>,
    /// Every candidate span found, parsed or not, in order of appearance.
    pub candidate_spans: Vec<Range<usize>>,
}

/// Scanner for JSON fragments embedded in prose.
pub struct FragmentScanner {
    fenced: Regex,
    line_comment: Regex,
    control_chars: Regex,
}

impl FragmentScanner {
    /// Create a scanner with its patterns compiled.
    ///
    /// # Errors
    /// Returns an error if any pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            fenced: Regex::new(r"(?s)```json\s*(.+?)\s*```")?,
            // The service occasionally echoes JS-style comments inside
            // payloads; strip them (and control characters) before parsing.
            line_comment: Regex::new(r"//[^\n]*\n")?,
            control_chars: Regex::new(r"[\x00-\x1F]+")?,
        })
    }

    /// Locate candidate fragments in `text`.
    ///
    /// Candidates that fail to parse are discarded silently from
    /// [`ScanOutcome::fragments`]; one malformed fragment never prevents
    /// recognizing valid siblings.
    #[must_use]
    pub fn scan(&self, text: &str) -> ScanOutcome {
        let mut candidates: Vec<(Range<usize>, &str)> = Vec::new();

        for captures in self.fenced.captures_iter(text) {
            if let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) {
                candidates.push((whole.start()..whole.end(), inner.as_str()));
            }
        }

        if candidates.is_empty() {
            for span in balanced_spans(text) {
                let raw = &text[span.clone()];
                candidates.push((span, raw));
            }
        }

        let mut outcome = ScanOutcome::default();
        for (span, raw) in candidates {
            outcome.candidate_spans.push(span.clone());

            let cleaned = self.clean_candidate(raw);
            let Ok(value) = serde_json::from_str::<Value>(&cleaned) else {
                continue;
            };
            match value {
                Value::Array(items) => {
                    // An array of objects is a candidate list; non-object
                    // elements are dropped like any other malformed sibling.
                    for item in items {
                        if item.is_object() {
                            outcome.fragments.push(ScannedFragment {
                                span: span.clone(),
                                value: item,
                            });
                        }
                    }
                }
                Value::Object(_) => outcome.fragments.push(ScannedFragment { span, value }),
                _ => {}
            }
        }

        outcome
    }

    fn clean_candidate(&self, raw: &str) -> String {
        let no_comments = self.line_comment.replace_all(raw, "");
        let no_controls = self.control_chars.replace_all(&no_comments, " ");
        no_controls.trim().to_string()
    }
}

/// Find balanced top-level `{...}` and `[...]` spans, string-aware.
fn balanced_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if depth > 0 && in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '{' | '[' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' | ']' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        spans.push(start..idx + ch.len_utf8());
                    }
                }
            }
            '"' if depth > 0 => in_string = true,
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> FragmentScanner {
        FragmentScanner::new().unwrap()
    }

    #[test]
    fn fenced_block_is_preferred() {
        let text = "Here you go: ```json {\"rewardName\":\"Free Coffee\"}``` enjoy";
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(outcome.fragments[0].value["rewardName"], "Free Coffee");
        assert_eq!(&text[outcome.fragments[0].span.clone()][..7], "```json");
    }

    #[test]
    fn bare_object_is_found_without_fences() {
        let text = "Try this {\"rewardName\":\"x\",\"pointsCost\":50} out";
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(outcome.fragments[0].value["pointsCost"], 50);
    }

    #[test]
    fn nested_objects_are_matched_to_the_outer_brace() {
        let text = r#"{"rewardName":"x","limitations":[{"type":"timeOfDay","value":{"startTime":"09:00","endTime":"11:00"}}]}"#;
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(
            outcome.fragments[0].value["limitations"][0]["value"]["endTime"],
            "11:00"
        );
    }

    #[test]
    fn braces_inside_strings_do_not_break_matching() {
        let text = r#"note {"rewardName":"curly {treat}","description":"a } in text"} end"#;
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(outcome.fragments[0].value["rewardName"], "curly {treat}");
    }

    #[test]
    fn malformed_sibling_is_dropped_but_its_span_is_kept() {
        let text = r#"{"rewardName":"good"} and {"rewardName": broken}"#;
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(outcome.fragments[0].value["rewardName"], "good");
        assert_eq!(outcome.candidate_spans.len(), 2);
    }

    #[test]
    fn array_of_objects_yields_one_fragment_per_element() {
        let text = r#"Options: [ {"rewardName":"a"}, {"rewardName":"b"} ]"#;
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 2);
        assert_eq!(outcome.fragments[0].value["rewardName"], "a");
        assert_eq!(outcome.fragments[1].value["rewardName"], "b");
        assert_eq!(outcome.candidate_spans.len(), 1);
    }

    #[test]
    fn echoed_comments_are_stripped_before_parsing() {
        let text = "```json\n{\n// best seller\n\"rewardName\":\"x\"\n}\n```";
        let outcome = scanner().scan(text);
        assert_eq!(outcome.fragments.len(), 1);
        assert_eq!(outcome.fragments[0].value["rewardName"], "x");
    }

    #[test]
    fn plain_prose_yields_no_fragments() {
        let outcome = scanner().scan("No structured data here at all.");
        assert!(outcome.fragments.is_empty());
        assert!(outcome.candidate_spans.is_empty());
    }

    #[test]
    fn scanning_is_idempotent() {
        let text = r#"one {"rewardName":"a"} two {"rewardName":"b"}"#;
        let s = scanner();
        let first: Vec<_> = s.scan(text).fragments.iter().map(|f| f.value.clone()).collect();
        let second: Vec<_> = s.scan(text).fragments.iter().map(|f| f.value.clone()).collect();
        assert_eq!(first, second);
    }
}
