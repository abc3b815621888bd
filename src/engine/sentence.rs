pub const MASK: &str = "_______";

/// Leading tokens treated as grammatical-gender markers.
pub const GENDER_MARKERS: [&str; 3] = ["der", "die", "das"];

/// Drops a leading gender marker: `"der Zug"` becomes `"Zug"`. A bare marker is kept.
pub fn strip_gender_marker(term: &str) -> &str {
    let trimmed = term.trim();
    let Some((first, rest)) = trimmed.split_once(char::is_whitespace) else {
        return trimmed;
    };
    let rest = rest.trim_start();
    if !rest.is_empty()
        && GENDER_MARKERS
            .iter()
            .any(|marker| first.eq_ignore_ascii_case(marker))
    {
        rest
    } else {
        trimmed
    }
}

pub fn contains_term(sentence: &str, term: &str) -> bool {
    !term.is_empty() && find_ignore_case(sentence, term, 0).is_some()
}

/// Replaces every case-insensitive occurrence of `term` with [`MASK`].
pub fn mask_sentence(sentence: &str, term: &str) -> String {
    if term.is_empty() {
        return sentence.to_string();
    }

    let mut out = String::with_capacity(sentence.len());
    let mut cursor = 0;
    while let Some((start, end)) = find_ignore_case(sentence, term, cursor) {
        out.push_str(&sentence[cursor..start]);
        out.push_str(MASK);
        cursor = end;
    }
    out.push_str(&sentence[cursor..]);
    out
}

/// Masks the target's own sentence, or `None` when the sentence does not literally
/// contain the stripped term.
pub fn masked_for(term: &str, sentence: &str) -> Option<String> {
    let stem = strip_gender_marker(term);
    contains_term(sentence, stem).then(|| mask_sentence(sentence, stem))
}

// Byte range of the first match at or after `from`, comparing char by char.
fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    for (offset, _) in haystack[from..].char_indices() {
        let start = from + offset;
        if let Some(len) = match_len(&haystack[start..], needle) {
            return Some((start, start + len));
        }
    }
    None
}

fn match_len(haystack: &str, needle: &str) -> Option<usize> {
    let mut hay = haystack.char_indices();
    for expected in needle.chars() {
        let (_, actual) = hay.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
    }
    Some(hay.next().map_or(haystack.len(), |(idx, _)| idx))
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
