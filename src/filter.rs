//! Derivation of the visible subset of a record collection. Filtering is a
//! pure function of the base records, the selected category, and the search
//! term; nothing here caches or mutates its inputs.

use crate::models::Record;

/// The two independent predicates a record view can apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    category: Option<String>,
    search: String,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.set_category(Some(category.into()));
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Select a category, or pass `None` for "no category filter". An empty
    /// string counts as no filter.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category.filter(|value| !value.is_empty());
    }

    pub fn clear_category(&mut self) {
        self.category = None;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn is_active(&self) -> bool {
        self.category.is_some() || !self.search.is_empty()
    }

    /// Exact, case-sensitive match on the category.
    pub fn matches_category(&self, record: &Record) -> bool {
        match &self.category {
            Some(category) => record.category == *category,
            None => true,
        }
    }

    /// Case-insensitive substring match against `first last`.
    pub fn matches_search(&self, record: &Record) -> bool {
        if self.search.is_empty() {
            return true;
        }
        record
            .full_name()
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matches_category(record) && self.matches_search(record)
    }

    /// Records satisfying both predicates, in base-collection order.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Free-function form of `RecordFilter::apply`.
pub fn filter_records<'a>(
    records: &'a [Record],
    category: Option<&str>,
    search: &str,
) -> Vec<&'a Record> {
    let mut filter = RecordFilter::new().with_search(search);
    filter.set_category(category.map(str::to_string));
    filter.apply(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn record(id: u64, first: &str, last: &str, group: &str) -> Record {
        Record {
            id: RecordId::new(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            category: group.to_string(),
        }
    }

    fn base() -> Vec<Record> {
        vec![record(1, "Ann", "Lee", "A"), record(2, "Bo", "Ray", "B")]
    }

    fn ids(records: &[&Record]) -> Vec<u64> {
        records.iter().filter_map(|record| record.id.number()).collect()
    }

    #[test]
    fn category_only() {
        let base = base();
        assert_eq!(ids(&filter_records(&base, Some("A"), "")), vec![1]);
    }

    #[test]
    fn search_is_case_insensitive_on_last_name() {
        let base = base();
        assert_eq!(ids(&filter_records(&base, None, "ray")), vec![2]);
    }

    #[test]
    fn search_spans_the_space_between_names() {
        let base = base();
        assert_eq!(ids(&filter_records(&base, None, "n l")), vec![1]);
    }

    #[test]
    fn category_match_is_case_sensitive() {
        let base = base();
        assert!(filter_records(&base, Some("a"), "").is_empty());
    }

    #[test]
    fn no_match_yields_empty_output() {
        let base = base();
        assert!(filter_records(&base, Some("A"), "ray").is_empty());
        assert!(filter_records(&[], None, "").is_empty());
    }

    #[test]
    fn clearing_the_category_restores_search_only_results() {
        let base = vec![
            record(1, "Ann", "Lee", "A"),
            record(2, "Anna", "Ray", "B"),
            record(3, "Bo", "Ray", "C"),
        ];
        let mut filter = RecordFilter::new().with_category("C").with_search("an");
        assert!(filter.apply(&base).is_empty());

        filter.clear_category();
        assert_eq!(ids(&filter.apply(&base)), vec![1, 2]);
    }

    #[test]
    fn empty_category_means_no_filter() {
        let mut filter = RecordFilter::new().with_category("B");
        filter.set_category(Some(String::new()));
        assert_eq!(filter.category(), None);
        assert!(!filter.is_active());
    }
}
