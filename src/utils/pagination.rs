use crate::store::Window;

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

/// 1-based page window taken from `?page=&per_page=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub per_page: u64,
}

impl Page {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Rows to fetch for this page. Pages past `u64::MAX` rows stay past the end.
    pub fn window(&self) -> Window {
        Window {
            offset: (self.page - 1).saturating_mul(self.per_page),
            limit: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamps() {
        assert_eq!(Page::new(None, None), Page { page: 1, per_page: 10 });
        assert_eq!(Page::new(Some(0), Some(1000)).per_page, 100);
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, per_page: 1 });
        assert_eq!(
            Page::new(Some(3), Some(20)).window(),
            Window { offset: 40, limit: 20 }
        );
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let window = Page::new(Some(u64::MAX), Some(100)).window();
        assert_eq!(window, Window { offset: u64::MAX, limit: 100 });
    }
}
