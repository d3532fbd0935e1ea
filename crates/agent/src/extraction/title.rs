use crate::extraction::patterns::Patterns;

const STOP_WORDS: &[&str] = &[
    "today", "tomorrow", "tonight", "tmrw", "at", "on", "from", "between", "next", "this",
    "coming", "in", "for", "by", "to", "until", "till", "morning", "afternoon", "evening", "noon",
    "midday", "midnight", "am", "pm", "please", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday", "mon", "tue", "tues", "wed", "thu", "thur", "thurs", "fri",
    "sat", "sun", "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul",
    "aug", "sep", "sept", "oct", "nov", "dec",
];

const OBJECT_BOUNDARIES: &[&str] =
    &["with", "about", "called", "titled", "named", "for", "on", "at", "in", "from", "to"];

const DETERMINERS: &[&str] = &["a", "an", "the", "my", "our", "some", "me", "us"];

const GENERIC_OBJECTS: &[&str] =
    &["something", "anything", "it", "one", "time", "slot", "meeting", "appointment"];

/// Title from, in order: a `with`/`about` phrase, an explicit name, or the
/// object of the booking verb.
pub(crate) fn extract_title(text: &str, patterns: &Patterns) -> Option<String> {
    with_about_title(text, patterns)
        .or_else(|| named_title(text, patterns))
        .or_else(|| booking_object_title(text, patterns))
}

fn named_title(text: &str, patterns: &Patterns) -> Option<String> {
    let captures = patterns.called.captures(text)?;
    if let Some(quoted) = captures.get(1).or_else(|| captures.get(2)) {
        let quoted = quoted.as_str().trim();
        return (!quoted.is_empty()).then(|| title_case(quoted));
    }
    phrase(captures.get(3)?.as_str(), &[])
}

/// First `with`/`about` marker whose phrase is usable; later markers get a
/// chance when an earlier one is followed by a time or number.
fn with_about_title(text: &str, patterns: &Patterns) -> Option<String> {
    patterns.with_about.find_iter(text).find_map(|marker| phrase(&text[marker.end()..], &[]))
}

fn booking_object_title(text: &str, patterns: &Patterns) -> Option<String> {
    let captures = patterns.booking_object.captures(text)?;
    let rest = captures.get(1)?.as_str();
    let words = rest
        .split_whitespace()
        .skip_while(|word| DETERMINERS.contains(&clean(word).as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    let object = phrase(&words, OBJECT_BOUNDARIES)?;
    if GENERIC_OBJECTS.contains(&object.to_lowercase().as_str()) {
        return None;
    }
    Some(object)
}

/// Collects words up to the first stop word, digit-bearing token or
/// sentence punctuation.
fn phrase(rest: &str, boundaries: &[&str]) -> Option<String> {
    let mut words = Vec::new();
    for raw in rest.split_whitespace() {
        let word = clean(raw);
        if word.is_empty()
            || word.chars().any(|ch| ch.is_ascii_digit())
            || STOP_WORDS.contains(&word.as_str())
            || boundaries.contains(&word.as_str())
        {
            break;
        }
        words.push(word);
        if raw.ends_with([',', '.', '?', '!', ';']) {
            break;
        }
    }
    if words.is_empty() {
        return None;
    }
    Some(title_case(&words.join(" ")))
}

fn clean(word: &str) -> String {
    word.trim_matches(|ch: char| !(ch.is_alphanumeric() || ch == '\'' || ch == '-')).to_string()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
