//! Merge, rank and paginate per-source results into one page.
//!
//! Every source is asked for everything up to the end of the requested page
//! (`limit = (page + 1) * size`, `offset = 0`), so the merged list always
//! contains the requested window and pagination happens here, after the
//! global sort.
//!
//! ## Ordering
//!
//! [`MergeOrder`] picks between the caller's sort key and an order the
//! caller remembers (favorites, history). All comparators are total and the
//! sort is stable, so equal keys keep source-then-position order and the
//! same inputs always produce the same page.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::model::{ItemKey, PageSpec, ResourceSummary, SortKey};
use crate::normalize::NormalizedResult;

/// How merged items are ordered and paginated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// The page's sort key, then skip/take over the merged list.
    #[default]
    External,
    /// Position in the caller's list. Items not in the list go last.
    Remembered(Vec<ItemKey>),
    /// Position in the caller's list, the page's sort key as tie-break.
    RememberedThenExternal(Vec<ItemKey>),
}

impl MergeOrder {
    /// Favorites keep the order they were added in when the caller asks for
    /// `NEWEST`, and follow the sort key otherwise.
    pub fn favorites(keys: Vec<ItemKey>, page: &PageSpec) -> Self {
        match page.sort {
            Some(SortKey::Newest) => Self::Remembered(keys),
            _ => Self::External,
        }
    }

    /// History keeps the visit order; the sort key only breaks ties.
    pub fn history(keys: Vec<ItemKey>) -> Self {
        Self::RememberedThenExternal(keys)
    }

    fn remembered(&self) -> Option<&[ItemKey]> {
        match self {
            Self::External => None,
            Self::Remembered(keys) | Self::RememberedThenExternal(keys) => Some(keys),
        }
    }
}

/// One page of the merged result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePage {
    pub items: Vec<ResourceSummary>,
    /// Sum of the totals every source declared, saturating at `u64::MAX`.
    pub total_elements: u64,
    pub page_number: u32,
    pub page_size: u32,
}

impl AggregatePage {
    pub fn empty(page: &PageSpec) -> Self {
        Self {
            items: Vec::new(),
            total_elements: 0,
            page_number: page.page_number,
            page_size: page.page_size,
        }
    }
}

pub fn merge(results: Vec<NormalizedResult>, page: &PageSpec, order: &MergeOrder) -> AggregatePage {
    // Totals are whatever each source declares; clamp instead of overflowing.
    let total_elements = results
        .iter()
        .map(|r| r.total_elements)
        .fold(0u64, u64::saturating_add);
    let mut items: Vec<ResourceSummary> = results.into_iter().flat_map(|r| r.items).collect();

    match order {
        MergeOrder::External => items.sort_by(|a, b| compare(page.sort, a, b)),
        MergeOrder::Remembered(keys) => {
            let rank = Ranking::new(keys);
            items.sort_by_key(|item| rank.of(item));
        }
        MergeOrder::RememberedThenExternal(keys) => {
            let rank = Ranking::new(keys);
            items.sort_by(|a, b| {
                rank.of(a)
                    .cmp(&rank.of(b))
                    .then_with(|| compare(page.sort, a, b))
            });
        }
    }

    // A remembered list is already one page of the caller's store.
    let skip = match order.remembered() {
        Some(_) => 0,
        None => page.offset(),
    };
    let items = items
        .into_iter()
        .skip(skip)
        .take(page.page_size as usize)
        .collect();

    AggregatePage {
        items,
        total_elements,
        page_number: page.page_number,
        page_size: page.page_size,
    }
}

/// External order for `sort`. `None` behaves like [`SortKey::Newest`].
pub fn compare(sort: Option<SortKey>, a: &ResourceSummary, b: &ResourceSummary) -> Ordering {
    match sort.unwrap_or(SortKey::Newest) {
        SortKey::Alphabetic => a.name.cmp(&b.name),
        // Ascending, as upstream ranking has always been consumed.
        SortKey::MostViewed => missing_last(a.relevance, b.relevance, |x, y| x.total_cmp(y)),
        SortKey::Newest => missing_last(a.publish_date, b.publish_date, |x, y| y.cmp(x)),
        SortKey::Oldest => missing_last(a.publish_date, b.publish_date, |x, y| x.cmp(y)),
    }
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Position lookup for a remembered key list.
struct Ranking<'a> {
    positions: HashMap<(&'a str, &'a str), usize>,
}

impl<'a> Ranking<'a> {
    fn new(keys: &'a [ItemKey]) -> Self {
        let mut positions = HashMap::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            positions
                .entry((key.source_id.as_str(), key.item_id.as_str()))
                .or_insert(index);
        }
        Self { positions }
    }

    fn of(&self, item: &ResourceSummary) -> usize {
        let source_id = item.publisher_id.as_deref().unwrap_or_default();
        self.positions
            .get(&(source_id, item.id.as_str()))
            .copied()
            .unwrap_or(usize::MAX)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn item(source: &str, id: &str, name: &str, date: Option<(i32, u32, u32)>) -> ResourceSummary {
        ResourceSummary {
            id: id.into(),
            name: name.into(),
            publisher_id: Some(source.into()),
            publish_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..ResourceSummary::default()
        }
    }

    fn result(source: &str, total: u64, items: Vec<ResourceSummary>) -> NormalizedResult {
        NormalizedResult {
            source_id: source.into(),
            source_name: source.to_uppercase(),
            total_elements: total,
            items,
        }
    }

    fn ids(page: &AggregatePage) -> Vec<&str> {
        page.items.iter().map(|i| i.id.as_str()).collect()
    }

    fn sample() -> Vec<NormalizedResult> {
        vec![
            result(
                "a",
                2,
                vec![
                    item("a", "a1", "Zahlen", Some((2024, 1, 1))),
                    item("a", "a2", "Algebra", None),
                ],
            ),
            result(
                "b",
                2,
                vec![
                    item("b", "b1", "Bruchrechnung", Some((2025, 6, 1))),
                    item("b", "b2", "Chemie", Some((2020, 3, 3))),
                ],
            ),
        ]
    }

    // -- external order ------------------------------------------------------

    #[test]
    fn newest_first_with_undated_last() {
        let page = merge(sample(), &PageSpec::default().sorted(SortKey::Newest), &MergeOrder::External);
        assert_eq!(ids(&page), vec!["b1", "a1", "b2", "a2"]);
    }

    #[test]
    fn no_sort_key_means_newest() {
        let page = merge(sample(), &PageSpec::default(), &MergeOrder::External);
        assert_eq!(ids(&page), vec!["b1", "a1", "b2", "a2"]);
    }

    #[test]
    fn oldest_first_with_undated_last() {
        let page = merge(sample(), &PageSpec::default().sorted(SortKey::Oldest), &MergeOrder::External);
        assert_eq!(ids(&page), vec!["b2", "a1", "b1", "a2"]);
    }

    #[test]
    fn alphabetic_by_name() {
        let page = merge(
            sample(),
            &PageSpec::default().sorted(SortKey::Alphabetic),
            &MergeOrder::External,
        );
        assert_eq!(ids(&page), vec!["a2", "b1", "b2", "a1"]);
    }

    #[test]
    fn most_viewed_is_ascending_relevance() {
        let mut results = sample();
        results[0].items[0].relevance = Some(0.9);
        results[0].items[1].relevance = Some(0.1);
        results[1].items[0].relevance = Some(0.5);

        let page = merge(
            results,
            &PageSpec::default().sorted(SortKey::MostViewed),
            &MergeOrder::External,
        );
        assert_eq!(ids(&page), vec!["a2", "b1", "a1", "b2"]);
    }

    #[test]
    fn equal_keys_keep_source_order() {
        let results = vec![
            result("a", 1, vec![item("a", "a1", "Same", None)]),
            result("b", 1, vec![item("b", "b1", "Same", None)]),
        ];
        let page = merge(results, &PageSpec::default(), &MergeOrder::External);
        assert_eq!(ids(&page), vec!["a1", "b1"]);
    }

    // -- pagination ----------------------------------------------------------

    #[test]
    fn three_sources_of_fifty() {
        let results: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|s| {
                let items = (0..20)
                    .map(|i| item(s, &format!("{s}{i}"), "x", Some((2020, 1, 1 + i % 28))))
                    .collect();
                result(s, 50, items)
            })
            .collect();

        let page = merge(results, &PageSpec::new(0, 20), &MergeOrder::External);

        assert_eq!(page.total_elements, 150);
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.page_number, 0);
    }

    #[test]
    fn later_pages_skip_earlier_items() {
        let page = merge(
            sample(),
            &PageSpec::new(1, 3).sorted(SortKey::Newest),
            &MergeOrder::External,
        );
        assert_eq!(ids(&page), vec!["a2"]);
        assert_eq!(page.total_elements, 4);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = merge(sample(), &PageSpec::new(5, 20), &MergeOrder::External);
        assert!(page.items.is_empty());
        assert_eq!(page.total_elements, 4);
    }

    #[test]
    fn empty_input_gives_empty_page() {
        let page = merge(Vec::new(), &PageSpec::new(2, 10), &MergeOrder::External);
        assert_eq!(page, AggregatePage::empty(&PageSpec::new(2, 10)));
    }

    // -- remembered order ----------------------------------------------------

    #[test]
    fn remembered_order_follows_caller_list() {
        let keys = vec![
            ItemKey::new("b", "b2"),
            ItemKey::new("a", "a1"),
            ItemKey::new("b", "b1"),
        ];
        let page = merge(
            sample(),
            &PageSpec::new(3, 20),
            &MergeOrder::Remembered(keys),
        );

        // No local skip, unknown ids last.
        assert_eq!(ids(&page), vec!["b2", "a1", "b1", "a2"]);
    }

    #[test]
    fn same_item_id_in_two_sources_is_two_items() {
        let results = vec![
            result("a", 1, vec![item("a", "42", "A", None)]),
            result("b", 1, vec![item("b", "42", "B", None)]),
        ];
        let keys = vec![ItemKey::new("b", "42"), ItemKey::new("a", "42")];
        let page = merge(results, &PageSpec::default(), &MergeOrder::Remembered(keys));

        let names: Vec<_> = page.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn history_breaks_ties_with_sort_key() {
        let keys = vec![ItemKey::new("a", "a1")];
        let page = merge(
            sample(),
            &PageSpec::default().sorted(SortKey::Alphabetic),
            &MergeOrder::history(keys),
        );
        assert_eq!(ids(&page), vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn favorites_use_remembered_order_only_for_newest() {
        let keys = vec![ItemKey::new("a", "a1")];
        assert_eq!(
            MergeOrder::favorites(keys.clone(), &PageSpec::default().sorted(SortKey::Newest)),
            MergeOrder::Remembered(keys.clone())
        );
        assert_eq!(
            MergeOrder::favorites(keys.clone(), &PageSpec::default().sorted(SortKey::Alphabetic)),
            MergeOrder::External
        );
        assert_eq!(
            MergeOrder::favorites(keys, &PageSpec::default()),
            MergeOrder::External
        );
    }

    // -- properties ----------------------------------------------------------

    fn arb_item() -> impl Strategy<Value = ResourceSummary> {
        (
            "[a-z]{1,3}",
            "[A-Za-z]{0,6}",
            prop::option::of((2000i32..2030, 1u32..13, 1u32..29)),
        )
            .prop_map(|(id, name, date)| item("s", &id, &name, date))
    }

    fn arb_results() -> impl Strategy<Value = Vec<NormalizedResult>> {
        prop::collection::vec(
            (prop::collection::vec(arb_item(), 0..15), 0u64..100),
            0..4,
        )
        .prop_map(|sources| {
            sources
                .into_iter()
                .enumerate()
                .map(|(i, (items, total))| result(&format!("s{i}"), total, items))
                .collect()
        })
    }

    #[test]
    fn huge_declared_totals_saturate() {
        let results = vec![result("a", u64::MAX, vec![]), result("b", u64::MAX, vec![])];
        let page = merge(results, &PageSpec::default(), &MergeOrder::External);
        assert_eq!(page.total_elements, u64::MAX);
        assert!(page.items.is_empty());
    }

    proptest! {
        #[test]
        fn newest_is_non_increasing_with_nulls_last(results in arb_results()) {
            let page = merge(results, &PageSpec::new(0, 100).sorted(SortKey::Newest), &MergeOrder::External);
            for pair in page.items.windows(2) {
                match (pair[0].publish_date, pair[1].publish_date) {
                    (Some(a), Some(b)) => prop_assert!(a >= b),
                    (None, Some(_)) => prop_assert!(false, "undated item before dated one"),
                    _ => {}
                }
            }
        }

        #[test]
        fn oldest_is_non_decreasing_with_nulls_last(results in arb_results()) {
            let page = merge(results, &PageSpec::new(0, 100).sorted(SortKey::Oldest), &MergeOrder::External);
            for pair in page.items.windows(2) {
                match (pair[0].publish_date, pair[1].publish_date) {
                    (Some(a), Some(b)) => prop_assert!(a <= b),
                    (None, Some(_)) => prop_assert!(false, "undated item before dated one"),
                    _ => {}
                }
            }
        }

        #[test]
        fn alphabetic_is_sorted_by_name(results in arb_results()) {
            let page = merge(results, &PageSpec::new(0, 100).sorted(SortKey::Alphabetic), &MergeOrder::External);
            prop_assert!(page.items.windows(2).all(|p| p[0].name <= p[1].name));
        }

        #[test]
        fn page_is_bounded_and_total_is_summed(
            results in arb_results(),
            page_number in 0u32..4,
            page_size in 1u32..10,
        ) {
            let expected_total: u64 = results.iter().map(|r| r.total_elements).sum();
            let available: usize = results.iter().map(|r| r.items.len()).sum();
            let page_spec = PageSpec::new(page_number, page_size);

            let page = merge(results, &page_spec, &MergeOrder::External);

            prop_assert_eq!(page.total_elements, expected_total);
            prop_assert!(page.items.len() <= page_size as usize);
            prop_assert_eq!(
                page.items.len(),
                available.saturating_sub(page_spec.offset()).min(page_size as usize)
            );
        }

        #[test]
        fn merge_is_deterministic(results in arb_results()) {
            let page_spec = PageSpec::new(0, 50).sorted(SortKey::Newest);
            let first = merge(results.clone(), &page_spec, &MergeOrder::External);
            let second = merge(results, &page_spec, &MergeOrder::External);
            prop_assert_eq!(first, second);
        }
    }
}
