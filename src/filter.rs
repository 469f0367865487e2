//! Filter Engine
//!
//! Composable narrowing passes over the flat collection. Stages run in a fixed order:
//! stable sort, name search, status, parent scope, store membership. Every stage can be
//! skipped by leaving its filter at the default.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::{CategoryRecord, StoreId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentScope {
    #[default]
    All,
    /// `parent_id` absent
    RootOnly,
    /// `parent_id` present
    ChildrenOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep snapshot order
    #[default]
    Manual,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Caller-owned filter state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryFilter {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub status: StatusFilter,
    pub parent_scope: ParentScope,
    pub store: Option<StoreId>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl CategoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_parent_scope(mut self, scope: ParentScope) -> Self {
        self.parent_scope = scope;
        self
    }

    pub fn with_store(mut self, store: StoreId) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sorted_by(mut self, sort: SortKey, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    /// Comparator for the configured sort key, `None` for snapshot order
    pub fn comparator(&self) -> Option<impl Fn(&CategoryRecord, &CategoryRecord) -> Ordering> {
        let key = self.sort;
        let direction = self.direction;
        if key == SortKey::Manual {
            return None;
        }
        Some(move |a: &CategoryRecord, b: &CategoryRecord| {
            let ordering = match key {
                SortKey::Manual => Ordering::Equal,
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortKey::CreatedAt => a.audit.created_at.cmp(&b.audit.created_at),
                SortKey::UpdatedAt => a.audit.updated_at.cmp(&b.audit.updated_at),
            };
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
    }
}

/// Run every stage using the filter's own sort key
pub fn apply(records: &[CategoryRecord], filter: &CategoryFilter) -> Vec<CategoryRecord> {
    let mut result = records.to_vec();
    if let Some(compare) = filter.comparator() {
        sort_stable(&mut result, compare);
    }
    narrow(result, filter)
}

/// Run every stage with a caller-supplied comparator in place of the filter's sort key
pub fn apply_with<F>(records: &[CategoryRecord], filter: &CategoryFilter, compare: F) -> Vec<CategoryRecord>
where
    F: FnMut(&CategoryRecord, &CategoryRecord) -> Ordering,
{
    let mut result = records.to_vec();
    sort_stable(&mut result, compare);
    narrow(result, filter)
}

fn narrow(records: Vec<CategoryRecord>, filter: &CategoryFilter) -> Vec<CategoryRecord> {
    let records = by_name(records, filter.search.as_deref());
    let records = by_status(records, filter.status);
    let records = by_parent_scope(records, filter.parent_scope);
    by_store(records, filter.store.as_ref())
}

/// Elements comparing equal keep their original relative order
pub fn sort_stable<F>(records: &mut [CategoryRecord], compare: F)
where
    F: FnMut(&CategoryRecord, &CategoryRecord) -> Ordering,
{
    records.sort_by(compare);
}

pub fn by_name(records: Vec<CategoryRecord>, search: Option<&str>) -> Vec<CategoryRecord> {
    let needle = match search.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_lowercase(),
        _ => return records,
    };
    records
        .into_iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn by_status(records: Vec<CategoryRecord>, status: StatusFilter) -> Vec<CategoryRecord> {
    match status {
        StatusFilter::All => records,
        StatusFilter::Active => records.into_iter().filter(|r| r.is_active).collect(),
        StatusFilter::Inactive => records.into_iter().filter(|r| !r.is_active).collect(),
    }
}

pub fn by_parent_scope(records: Vec<CategoryRecord>, scope: ParentScope) -> Vec<CategoryRecord> {
    match scope {
        ParentScope::All => records,
        ParentScope::RootOnly => records.into_iter().filter(|r| r.parent_id.is_none()).collect(),
        ParentScope::ChildrenOnly => records.into_iter().filter(|r| r.parent_id.is_some()).collect(),
    }
}

pub fn by_store(records: Vec<CategoryRecord>, store: Option<&StoreId>) -> Vec<CategoryRecord> {
    match store {
        None => records,
        Some(store) => records.into_iter().filter(|r| r.stores.contains(store)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CategoryId;

    fn make(name: &str, parent: Option<CategoryId>) -> CategoryRecord {
        let mut record = CategoryRecord::new(CategoryId::new(), name, "tester");
        record.parent_id = parent;
        record
    }

    fn names(records: &[CategoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    fn abc() -> Vec<CategoryRecord> {
        let a = make("A", None);
        let b = make("B", Some(a.id));
        let c = make("C", Some(b.id));
        vec![a, b, c]
    }

    #[test]
    fn test_parent_scope() {
        let records = abc();
        let roots = apply(&records, &CategoryFilter::all().with_parent_scope(ParentScope::RootOnly));
        assert_eq!(names(&roots), vec!["A"]);
        let children = apply(&records, &CategoryFilter::all().with_parent_scope(ParentScope::ChildrenOnly));
        assert_eq!(names(&children), vec!["B", "C"]);
        assert_eq!(roots.len() + children.len(), records.len());
    }

    #[test]
    fn test_default_filter_is_identity() {
        let records = abc();
        assert_eq!(apply(&records, &CategoryFilter::all()), records);
    }

    #[test]
    fn test_name_search_is_case_insensitive() {
        let records = vec![make("Fresh Produce", None), make("Frozen", None), make("Bakery", None)];
        let found = apply(&records, &CategoryFilter::all().with_search("FR"));
        assert_eq!(names(&found), vec!["Fresh Produce", "Frozen"]);
        assert_eq!(apply(&records, &CategoryFilter::all().with_search("  ")).len(), 3);
    }

    #[test]
    fn test_status_filter() {
        let mut records = abc();
        records[1].is_active = false;
        let active = apply(&records, &CategoryFilter::all().with_status(StatusFilter::Active));
        assert_eq!(names(&active), vec!["A", "C"]);
        let inactive = apply(&records, &CategoryFilter::all().with_status(StatusFilter::Inactive));
        assert_eq!(names(&inactive), vec!["B"]);
    }

    #[test]
    fn test_store_filter() {
        let mut records = abc();
        records[0].stores.insert(StoreId::new("s1"));
        records[2].stores.insert(StoreId::new("s1"));
        records[2].stores.insert(StoreId::new("s2"));
        let in_s1 = apply(&records, &CategoryFilter::all().with_store(StoreId::new("s1")));
        assert_eq!(names(&in_s1), vec!["A", "C"]);
        let in_s3 = apply(&records, &CategoryFilter::all().with_store(StoreId::new("s3")));
        assert!(in_s3.is_empty());
    }

    #[test]
    fn test_sort_is_stable() {
        let records = vec![
            make("banana", None),
            make("Apple", None),
            make("apple", None),
            make("APPLE", None),
            make("cherry", None),
        ];
        let sorted = apply(&records, &CategoryFilter::all().sorted_by(SortKey::Name, SortDirection::Asc));
        assert_eq!(names(&sorted), vec!["Apple", "apple", "APPLE", "banana", "cherry"]);

        let sorted = apply(&records, &CategoryFilter::all().sorted_by(SortKey::Name, SortDirection::Desc));
        assert_eq!(names(&sorted), vec!["cherry", "banana", "Apple", "apple", "APPLE"]);
    }

    #[test]
    fn test_custom_comparator_runs_before_narrowing() {
        let records = vec![make("Bb", None), make("Ccc", None), make("Aa", None), make("Dddd", None)];
        let filter = CategoryFilter::all().with_search("a");
        let found = apply_with(&records, &filter, |a, b| b.name.len().cmp(&a.name.len()));
        assert_eq!(names(&found), vec!["Aa"]);

        let all = apply_with(&records, &CategoryFilter::all(), |a, b| a.name.len().cmp(&b.name.len()));
        assert_eq!(names(&all), vec!["Bb", "Aa", "Ccc", "Dddd"]);
    }

    #[test]
    fn test_filter_deserializes_with_defaults() {
        let filter: CategoryFilter = serde_json::from_str(r#"{"status":"inactive","parent_scope":"root_only"}"#).unwrap();
        assert_eq!(filter.status, StatusFilter::Inactive);
        assert_eq!(filter.parent_scope, ParentScope::RootOnly);
        assert_eq!(filter.sort, SortKey::Manual);
        assert!(filter.search.is_none());
    }
}
