/// Find the colony whose name appears in `directive_name`.
///
/// A hit only counts when the colony name is not followed by another
/// alphanumeric character, so `E11S1` does not match inside `E11S12-abc`.
/// Candidates are tried in the order given and the first hit wins.
pub fn name_affinity<'a, I>(directive_name: &str, colony_names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    colony_names
        .into_iter()
        .find(|colony| !colony.is_empty() && contains_bounded(directive_name, colony))
}

fn contains_bounded(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, matched)| {
        haystack[start + matched.len()..]
            .chars()
            .next()
            .is_none_or(|next| !next.is_ascii_alphanumeric())
    })
}

/// Whether a candidate path beats the best one seen so far.
/// Both comparisons are strict so ties keep the earlier candidate.
pub fn is_closer(path_length: u32, max_path_length: u32, best: Option<u32>) -> bool {
    path_length < max_path_length && best.is_none_or(|current| path_length < current)
}
