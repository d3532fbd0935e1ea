use tailortalk_core::domain::request::Intent;

use crate::extraction::patterns::Patterns;

/// Booking markers win over inquiry markers; anything else is an inquiry.
pub(crate) fn detect_intent(text: &str, patterns: &Patterns) -> Intent {
    if patterns.booking_marker.is_match(text) {
        return Intent::Book;
    }
    if patterns.inquiry_marker.is_match(text) {
        tracing::trace!(event_name = "extraction.intent_inquiry", "inquiry marker matched");
    }
    Intent::Check
}

#[cfg(test)]
mod tests {
    use tailortalk_core::domain::request::Intent;

    use super::detect_intent;
    use crate::extraction::patterns::patterns;

    fn intent_of(text: &str) -> Intent {
        detect_intent(text, patterns().expect("patterns"))
    }

    #[test]
    fn booking_verbs_select_book() {
        assert_eq!(intent_of("book a meeting tomorrow"), Intent::Book);
        assert_eq!(intent_of("can you schedule a call"), Intent::Book);
        assert_eq!(intent_of("please set up a sync"), Intent::Book);
        assert_eq!(intent_of("reserve friday 2-3pm"), Intent::Book);
    }

    #[test]
    fn booking_wins_when_both_markers_appear() {
        assert_eq!(intent_of("if i'm free tomorrow, book 3-4pm"), Intent::Book);
    }

    #[test]
    fn inquiries_and_unmarked_text_select_check() {
        assert_eq!(intent_of("am i free tomorrow?"), Intent::Check);
        assert_eq!(intent_of("what does my day look like"), Intent::Check);
    }

    #[test]
    fn markers_match_whole_words_only() {
        assert_eq!(intent_of("i left my notebook at the office"), Intent::Check);
        assert_eq!(intent_of("the facebook page"), Intent::Check);
        assert_eq!(intent_of("i'm unavailable today"), Intent::Check);
    }
}
