//! # Error Suggestions
//!
//! Helpers for building "did you mean" hints attached to library errors.
//! Errors should tell users what went wrong AND how to fix it, so unknown
//! role names and unresolved variables carry the closest known name when one
//! is near enough.
//!
//! ## Usage
//!
//! ```rust
//! use confgen::suggestions::did_you_mean;
//!
//! let hint = did_you_mean("webserer", ["webserver", "database"]);
//! assert_eq!(hint.as_deref(), Some("Did you mean 'webserver'?"));
//! ```

/// Build a "Did you mean 'x'?" hint for `input` from `candidates`.
///
/// Returns `None` when nothing is close enough to be a likely typo.
pub fn did_you_mean<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let candidates: Vec<&str> = candidates.into_iter().collect();
    find_similar(input, &candidates).map(|s| format!("Did you mean '{s}'?"))
}

/// Hint listing what is available when no close match exists.
pub fn available<'a, I>(what: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = candidates.into_iter().collect();
    if names.is_empty() {
        None
    } else {
        Some(format!("Available {what}: {}", names.join(", ")))
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() && candidate != input {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("port", "port"), 0);
        assert_eq!(edit_distance("prot", "port"), 2);
        assert_eq!(edit_distance("webserer", "webserver"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("database", "webserver"), 7);
    }

    #[test]
    fn test_did_you_mean_suggests_closest() {
        let hint = did_you_mean("db.hots", ["db.host", "db.port", "name"]);
        assert_eq!(hint.as_deref(), Some("Did you mean 'db.host'?"));
    }

    #[test]
    fn test_did_you_mean_no_suggestion_for_very_different() {
        assert_eq!(did_you_mean("foobar", ["webserver", "database"]), None);
        assert_eq!(did_you_mean("x", ["y"]), None);
    }

    #[test]
    fn test_available_lists_candidates() {
        assert_eq!(
            available("roles", ["base", "web"]).as_deref(),
            Some("Available roles: base, web")
        );
        assert_eq!(available("roles", std::iter::empty()), None);
    }
}
