//! Content extraction: turning raw assistant text into prose plus
//! classified domain fragments.
//!
//! The pipeline is scanner → classifier → splitter, composed by
//! [`TurnParser`]. Parsing is a pure function of the input text: no state
//! survives between calls, so re-parsing the same text always yields the
//! same [`ParsedTurn`].

pub mod classifier;
pub mod scanner;
pub mod splitter;

pub use classifier::{classify, Classified, ClassifiedFragment};
pub use scanner::{FragmentScanner, ScanOutcome, ScannedFragment};
pub use splitter::Splitter;

use serde::{Deserialize, Serialize};

/// The parsed view of one turn: prose segments plus classified fragments.
///
/// Derived on demand from a turn's raw text; never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTurn {
    /// Prose preceding the first fragment.
    pub before_text: String,
    /// Prose following the last fragment.
    pub after_text: String,
    /// Classified fragments, in order of appearance.
    pub fragments: Vec<ClassifiedFragment>,
}

/// Parser composing the scanner, classifier, and splitter.
pub struct TurnParser {
    scanner: FragmentScanner,
    splitter: Splitter,
}

impl TurnParser {
    /// Create a parser with all patterns compiled.
    ///
    /// # Errors
    /// Returns an error if any pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            scanner: FragmentScanner::new()?,
            splitter: Splitter::new()?,
        })
    }

    /// Parse one turn's raw text.
    #[must_use]
    pub fn parse(&self, text: &str) -> ParsedTurn {
        let outcome = self.scanner.scan(text);

        let mut fragments = Vec::with_capacity(outcome.fragments.len());
        let mut conversation: Option<String> = None;

        for fragment in outcome.fragments {
            let classified = classify(fragment.value);
            if conversation.is_none() {
                conversation = classified.conversation;
            }
            fragments.push(classified.fragment);
        }

        // Splitting uses every candidate span, parsed or not: a malformed
        // fragment is dropped from classification but still cut from the
        // prose.
        let (before_text, after_text) =
            self.splitter
                .split(text, &outcome.candidate_spans, conversation.as_deref());

        ParsedTurn {
            before_text,
            after_text,
            fragments,
        }
    }
}
