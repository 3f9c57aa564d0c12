use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};

use crate::store::{Entry, ListStore, Record};

/// Case-insensitive substring match on the record name. An empty query
/// matches everything.
pub fn name_matches<T: Record>(query: &str) -> impl Fn(&T) -> bool {
    let query = query.to_lowercase();
    move |record: &T| record.name().to_lowercase().contains(&query)
}

pub fn search_by_name<'a, T: Record>(store: &'a ListStore<T>, query: &str) -> Vec<&'a Entry<T>> {
    store.filtered_by(name_matches(query))
}

/// Fuzzy search on names, best match first. Equal scores keep store order.
pub fn fuzzy_search<'a, T: Record>(store: &'a ListStore<T>, pattern: &str) -> Vec<&'a Entry<T>> {
    if pattern.trim().is_empty() {
        return store.read_all().iter().collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<_> = store
        .read_all()
        .iter()
        .filter_map(|entry| {
            matcher
                .fuzzy_match(entry.record.name(), pattern)
                .map(|score| (score, entry))
        })
        .collect();
    // stable sort
    scored.sort_by(|(a, _), (b, _)| b.cmp(a));
    scored.into_iter().map(|(_, entry)| entry).collect()
}
