//! Fallback policy for grounded answers
//!
//! The hosted model gives no confidence signal, so an inconclusive grounded
//! answer is recognised by marker phrases in the generated text. This will
//! misfire on a legitimate answer that happens to contain a marker; keep the
//! check here so it can be replaced wholesale.

/// Phrases that mark a grounded answer as inconclusive (matched case-insensitively)
pub const INCONCLUSIVE_MARKERS: [&str; 2] = ["based on the provided documents", "cannot answer"];

/// Prefixed to answers produced without the reference documents after a
/// grounded attempt was made
pub const FALLBACK_DISCLOSURE: &str =
    "Based on my general knowledge (as this was not in the documents): ";

/// Returned when the hosted model could not be reached
pub const APOLOGY: &str =
    "Sorry, I'm having trouble reaching the assistant right now. Please try again in a moment.";

/// Returned for an empty question without calling the model
pub const EMPTY_QUESTION_REPLY: &str = "Please type a question and I'll do my best to answer it.";

pub fn is_inconclusive(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    INCONCLUSIVE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Final text for an answer produced without the documents
pub fn disclose(answer: &str) -> String {
    format!("{FALLBACK_DISCLOSURE}{answer}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Based on the provided documents, I cannot answer this question.")]
    #[case("I CANNOT ANSWER that.")]
    #[case("based on the provided documents there is nothing about tariffs")]
    #[case("Sorry, I Cannot Answer this from the context.")]
    fn test_inconclusive_answers(#[case] answer: &str) {
        assert!(is_inconclusive(answer));
    }

    #[rstest]
    #[case("Peak load usually occurs in the early evening.")]
    #[case("")]
    #[case("The documents describe three substations.")]
    fn test_conclusive_answers(#[case] answer: &str) {
        assert!(!is_inconclusive(answer));
    }

    #[test]
    fn test_disclose_prefixes_answer() {
        let text = disclose("Transformers step voltage up or down.");
        assert!(text.starts_with(FALLBACK_DISCLOSURE));
        assert!(text.ends_with("Transformers step voltage up or down."));
    }
}
