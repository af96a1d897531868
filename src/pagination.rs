use serde::Deserialize;

const MAX_LIMIT: i64 = 100;
/// Keeps `(page - 1) * limit` inside `i64` for every accepted limit.
const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl PageQuery {
    pub fn resolve(&self, default_limit: i64) -> Page {
        Page {
            page: self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = PageQuery::default().resolve(20);
        assert_eq!(p, Page { page: 1, limit: 20 });
        assert_eq!(p.offset(), 0);

        let p = PageQuery { page: Some(3), limit: Some(10) }.resolve(20);
        assert_eq!(p.offset(), 20);

        let p = PageQuery { page: Some(0), limit: Some(10_000) }.resolve(20);
        assert_eq!(p, Page { page: 1, limit: MAX_LIMIT });

        let p = PageQuery { page: Some(-4), limit: Some(0) }.resolve(20);
        assert_eq!(p, Page { page: 1, limit: 1 });
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let p = PageQuery { page: Some(i64::MAX), limit: Some(100) }.resolve(20);
        assert_eq!(p.page, MAX_PAGE);
        assert!(p.offset() > 0);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);
    }
}
