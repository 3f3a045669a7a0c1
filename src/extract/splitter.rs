//! Conversation splitter: recovers clean prose around extracted fragments.
//!
//! Removing fragment spans leaves artifacts behind: empty array skeletons
//! (`[ , , ]`), orphaned fence markers, runs of blank lines, and dangling
//! commas. The splitter strips these from the prose before and after the
//! fragment block.

use std::ops::Range;

use regex::Regex;

/// Splits a turn's text into prose around its fragment spans.
pub struct Splitter {
    array_artifact: Regex,
    fence_artifact: Regex,
    blank_lines: Regex,
}

impl Splitter {
    /// Create a splitter with its patterns compiled.
    ///
    /// # Errors
    /// Returns an error if any pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            array_artifact: Regex::new(r"\[\s*(?:,\s*)*\]")?,
            fence_artifact: Regex::new(r"```(?:json)?")?,
            blank_lines: Regex::new(r"\s*\n{2,}")?,
        })
    }

    /// Split `text` around the fragment `spans`.
    ///
    /// Returns `(before_text, after_text)`. When `conversation` is present
    /// (prose the service embedded inside a fragment's JSON), it replaces
    /// the literal text preceding the fragments.
    #[must_use]
    pub fn split(
        &self,
        text: &str,
        spans: &[Range<usize>],
        conversation: Option<&str>,
    ) -> (String, String) {
        let (before_raw, after_raw) = match (spans.first(), spans.last()) {
            (Some(first), Some(last)) => (&text[..first.start], &text[last.end..]),
            _ => (text, ""),
        };

        let before = match conversation.map(str::trim) {
            Some(embedded) if !embedded.is_empty() => embedded.to_string(),
            _ => self.clean(before_raw),
        };

        (before, self.clean(after_raw))
    }

    /// Strip residual artifacts from a prose segment.
    fn clean(&self, segment: &str) -> String {
        let no_arrays = self.array_artifact.replace_all(segment, "");
        let no_fences = self.fence_artifact.replace_all(&no_arrays, "");
        let collapsed = self.blank_lines.replace_all(&no_fences, "\n");
        collapsed
            .trim()
            .trim_start_matches([',', ':'])
            .trim_end_matches(',')
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> Splitter {
        Splitter::new().unwrap()
    }

    #[test]
    fn prose_is_recovered_around_a_single_span() {
        let text = "Here's an idea: XXXX Let me know!";
        let span = text.find("XXXX").unwrap();
        let (before, after) = splitter().split(text, &[span..span + 4], None);
        assert_eq!(before, "Here's an idea:");
        assert_eq!(after, "Let me know!");
    }

    #[test]
    fn empty_array_artifacts_are_stripped() {
        let text = "Options below [ , , ] FRAG and [] that's all";
        let span = text.find("FRAG").unwrap();
        let (before, after) = splitter().split(text, &[span..span + 4], None);
        assert_eq!(before, "Options below");
        assert_eq!(after, "and  that's all");
    }

    #[test]
    fn blank_line_runs_are_collapsed() {
        let text = "First line\n\n\nSecond line FRAG";
        let span = text.find("FRAG").unwrap();
        let (before, _) = splitter().split(text, &[span..span + 4], None);
        assert_eq!(before, "First line\nSecond line");
    }

    #[test]
    fn embedded_conversation_takes_precedence_over_literal_prose() {
        let text = "ignored literal prose FRAG tail";
        let span = text.find("FRAG").unwrap();
        let (before, after) =
            splitter().split(text, &[span..span + 4], Some("  Here are two ideas!  "));
        assert_eq!(before, "Here are two ideas!");
        assert_eq!(after, "tail");
    }

    #[test]
    fn no_spans_returns_the_whole_text_as_before() {
        let (before, after) = splitter().split("Just prose.", &[], None);
        assert_eq!(before, "Just prose.");
        assert_eq!(after, "");
    }
}
