//! "Did you mean" suggestions for unknown command and namespace names

use strsim::normalized_levenshtein;

/// Minimum similarity ratio (0..1) for a name to be suggested
pub const SIMILARITY_THRESHOLD: f64 = 0.4;

/// Rank `candidates` by how closely they resemble `name`, most similar first.
///
/// A name containing a space is only compared with candidates that contain
/// one too, so `db ini` is matched against namespaced commands only.
pub fn find_similar_names<'a, I>(name: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let namespaced = name.contains(' ');

    let mut scored: Vec<(f64, usize, &str)> = candidates
        .into_iter()
        .filter(|candidate| !namespaced || candidate.contains(' '))
        .filter_map(|candidate| {
            let ratio = normalized_levenshtein(name, candidate);
            let index = candidate.find(name);
            (ratio > SIMILARITY_THRESHOLD || index.is_some())
                .then_some((ratio, index.unwrap_or(usize::MAX), candidate))
        })
        .filter(|(ratio, _, _)| *ratio > SIMILARITY_THRESHOLD)
        .collect();

    scored.sort_by(|(ra, ia, _), (rb, ib, _)| {
        (1.0 - ra)
            .total_cmp(&(1.0 - rb))
            .then_with(|| ia.cmp(ib))
    });

    let mut names: Vec<String> = Vec::with_capacity(scored.len());
    for (_, _, candidate) in scored {
        if !names.iter().any(|n| n == candidate) {
            names.push(candidate.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typo_is_suggested() {
        let found = find_similar_names("hlp", ["help", "list", "greet"]);
        assert_eq!(found, vec!["help"]);
    }

    #[test]
    fn test_unrelated_names_are_dropped() {
        assert!(find_similar_names("zzzz", ["help", "list"]).is_empty());
    }

    #[test]
    fn test_closest_first() {
        let found = find_similar_names("migrat", ["migrations", "migrate", "list"]);
        assert_eq!(found.first().map(String::as_str), Some("migrate"));
        assert!(found.contains(&"migrations".to_string()));
    }

    #[test]
    fn test_namespaced_name_only_matches_namespaced_candidates() {
        let found = find_similar_names("db ini", ["db init", "dbinit", "init"]);
        assert_eq!(found, vec!["db init"]);
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let found = find_similar_names("lst", ["list", "list"]);
        assert_eq!(found, vec!["list"]);
    }
}
