use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// Local pagination over an already-fetched list.
///
/// Pages are 0-indexed and applied by slicing the in-memory list; nothing is
/// pushed down to the query. When only a page size is given the page resets
/// to 0, matching how the dashboards behave when the size selector changes.
/// When neither parameter is given the whole list is a single page.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl PageParams {
    /// Default page size, matching the dashboards' initial rows-per-page.
    pub const DEFAULT_PER_PAGE: usize = 5;
    /// Maximum allowed page size.
    pub const MAX_PER_PAGE: usize = 200;

    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self { page, per_page }
    }

    /// Effective (page, per_page) once defaults and the cap are applied, or
    /// None when the request carries no pagination at all.
    pub fn effective(&self) -> Option<(usize, usize)> {
        match (self.page, self.per_page) {
            (None, None) => None,
            (page, per_page) => {
                let per_page = per_page.unwrap_or(Self::DEFAULT_PER_PAGE).clamp(1, Self::MAX_PER_PAGE);
                Some((page.unwrap_or(0), per_page))
            }
        }
    }

    /// Slice `items` down to the requested page: `page * per_page` onward,
    /// at most `per_page` entries. A page past the end is empty.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match self.effective() {
            None => items,
            Some((page, per_page)) => {
                let start = page.saturating_mul(per_page).min(items.len());
                let end = start.saturating_add(per_page).min(items.len());
                &items[start..end]
            }
        }
    }
}

/// Paginated response wrapper with metadata
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    /// Page number (0-indexed)
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> PaginatedResponse<T> {
    /// Apply `params` to the full in-memory list.
    pub fn paginate(items: Vec<T>, params: &PageParams) -> Self {
        let total_items = items.len();
        match params.effective() {
            None => Self {
                page: 0,
                per_page: total_items.max(1),
                total_items,
                total_pages: 1,
                data: items,
            },
            Some((page, per_page)) => {
                let total_pages = total_items.div_ceil(per_page).max(1);
                let data: Vec<T> = {
                    let start = page.saturating_mul(per_page).min(total_items);
                    let end = start.saturating_add(per_page).min(total_items);
                    items.into_iter().take(end).skip(start).collect()
                };
                Self {
                    data,
                    page,
                    per_page,
                    total_items,
                    total_pages,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn twelve_items_page_size_five_page_two_yields_last_two() {
        let items: Vec<u32> = (1..=12).collect();
        let params = PageParams::new(Some(2), Some(5));
        assert_eq!(params.slice(&items), &[11, 12]);
    }

    #[test]
    fn page_defaults_to_zero_when_only_size_given() {
        let items: Vec<u32> = (1..=12).collect();
        let params = PageParams::new(None, Some(5));
        assert_eq!(params.slice(&items), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn no_params_returns_everything() {
        let items: Vec<u32> = (1..=12).collect();
        let params = PageParams::default();
        assert_eq!(params.slice(&items).len(), 12);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items: Vec<u32> = (1..=12).collect();
        let params = PageParams::new(Some(9), Some(5));
        assert!(params.slice(&items).is_empty());
    }

    #[test]
    fn paginate_reports_metadata() {
        let items: Vec<u32> = (1..=12).collect();
        let response = PaginatedResponse::paginate(items, &PageParams::new(Some(2), Some(5)));
        assert_eq!(response.data, vec![11, 12]);
        assert_eq!(response.page, 2);
        assert_eq!(response.per_page, 5);
        assert_eq!(response.total_items, 12);
        assert_eq!(response.total_pages, 3);
    }

    proptest! {
        #[test]
        fn slice_never_exceeds_page_size(len in 0usize..300, page in 0usize..40, per_page in 1usize..50) {
            let items: Vec<usize> = (0..len).collect();
            let params = PageParams::new(Some(page), Some(per_page));
            let slice = params.slice(&items);
            prop_assert!(slice.len() <= per_page);
        }

        #[test]
        fn pages_tile_the_list_without_gaps(len in 0usize..300, per_page in 1usize..50) {
            let items: Vec<usize> = (0..len).collect();
            let mut seen = Vec::new();
            let total_pages = len.div_ceil(per_page).max(1);
            for page in 0..total_pages {
                seen.extend_from_slice(PageParams::new(Some(page), Some(per_page)).slice(&items));
            }
            prop_assert_eq!(seen, items);
        }
    }
}
