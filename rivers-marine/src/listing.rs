//! Page-numbered slices of a listing

use serde::Serialize;

/// Page size of the vessel and post listings
pub const LISTING_PER_PAGE: u32 = 9;

/// A page of a listing with the totals of the whole listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }
}

/// Slice `items` to 1-based `page` of `per_page` items
///
/// Page 0 reads as page 1. A page past the end is empty but keeps the totals.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Paginated<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let total_pages = total.div_ceil(u64::from(per_page));

    let skip = (page as usize - 1).saturating_mul(per_page as usize);
    let items = items.into_iter().skip(skip).take(per_page as usize).collect();

    Paginated {
        items,
        page,
        total,
        total_pages,
    }
}

/// The `page` query parameter; missing, malformed or 0 reads as 1
pub fn page_from_query<I, K, V>(pairs: I) -> u32
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .find(|(key, _)| key.as_ref() == "page")
        .and_then(|(_, value)| value.as_ref().trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices_pages() {
        let items: Vec<u32> = (1..=20).collect();

        let first = paginate(items.clone(), 1, LISTING_PER_PAGE);
        assert_eq!(first.items, (1..=9).collect::<Vec<_>>());
        assert_eq!((first.total, first.total_pages), (20, 3));
        assert!(first.has_next());

        let last = paginate(items.clone(), 3, LISTING_PER_PAGE);
        assert_eq!(last.items, vec![19, 20]);
        assert!(!last.has_next());

        let past_end = paginate(items, 7, LISTING_PER_PAGE);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 20);
    }

    #[test]
    fn test_paginate_edges() {
        let empty = paginate(Vec::<u32>::new(), 1, LISTING_PER_PAGE);
        assert_eq!((empty.total, empty.total_pages), (0, 0));

        let zero = paginate(vec![1, 2, 3], 0, 2);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.items, vec![1, 2]);

        let exact = paginate((0..9).collect::<Vec<u32>>(), 1, 9);
        assert_eq!(exact.total_pages, 1);
    }

    #[test]
    fn test_page_from_query() {
        assert_eq!(page_from_query([("type", "barge"), ("page", "3")]), 3);
        assert_eq!(page_from_query([("page", "0")]), 1);
        assert_eq!(page_from_query([("page", "two")]), 1);
        assert_eq!(page_from_query(Vec::<(String, String)>::new()), 1);
    }
}
