//! "Did you mean" lookup for mistyped script names

const MAX_DISTANCE: usize = 2;

/// Find the candidate closest to `input`.
///
/// Tries an exact match, then a candidate that `input` is a prefix of, then the
/// nearest candidate within a small edit distance.
#[must_use]
pub fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    if input.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().copied().find(|c| *c == input) {
        return Some(exact);
    }

    if let Some(prefixed) = candidates.iter().copied().find(|c| c.starts_with(input)) {
        return Some(prefixed);
    }

    candidates
        .iter()
        .map(|c| (levenshtein(input, c), *c))
        .filter(|(dist, _)| *dist <= MAX_DISTANCE)
        .min_by_key(|(dist, _)| *dist)
        .map(|(_, c)| c)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
