use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: usize = 15;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }
}

/// One page of an already-ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: usize,
    pub per_page: usize,
    pub total: usize,
    pub last_page: usize,
}

impl<T> Page<T> {
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len();
        let per_page = request.per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let data = items
            .into_iter()
            .skip((request.page.max(1) - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Self {
            data,
            current_page: request.page.max(1),
            per_page,
            total,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
        let request = PageRequest::new(Some(0), Some(500));
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn paginates_last_partial_page() {
        let page = Page::paginate((1..=32).collect::<Vec<_>>(), PageRequest::new(Some(3), None));
        assert_eq!(page.data, vec![31, 32]);
        assert_eq!(page.total, 32);
        assert_eq!(page.last_page, 3);
    }

    #[test]
    fn pages_past_the_end_are_empty() {
        let page = Page::paginate(vec![1, 2, 3], PageRequest::new(Some(usize::MAX), Some(15)));
        assert!(page.data.is_empty());
        assert_eq!(page.current_page, usize::MAX);
        assert_eq!(page.total, 3);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn empty_results_still_have_one_page() {
        let page = Page::paginate(Vec::<u8>::new(), PageRequest::default());
        assert!(page.data.is_empty());
        assert_eq!(page.last_page, 1);
    }
}
