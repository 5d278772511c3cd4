use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 250;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query-string parameters accepted by every list endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueryFilter {
    /// 1-based page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page size, capped at 250
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortOrder>,
    /// Include archived rows (honoured for admins only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_archived: Option<bool>,
}

impl QueryFilter {
    pub fn page(&self) -> u64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }

    pub fn sort_by(&self) -> SortOrder {
        self.sort_by.unwrap_or_default()
    }

    /// Saturates at `i64::MAX`, the largest offset SQL backends accept; such
    /// pages are simply empty.
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }
}

/// Pagination envelope flattened into every list response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_filter() {
        let filter = QueryFilter::default();
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(filter.offset(), 0);
        assert_eq!(filter.sort_by(), SortOrder::Asc);
    }

    #[test]
    fn limit_is_capped() {
        let filter = QueryFilter {
            page: Some(3),
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.limit(), MAX_PAGE_LIMIT);
        assert_eq!(filter.offset(), 2 * MAX_PAGE_LIMIT);
    }

    #[test]
    fn zero_page_is_treated_as_first() {
        let filter = QueryFilter {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.page(), 1);
    }

    #[test]
    fn huge_pages_do_not_overflow() {
        let filter = QueryFilter {
            page: Some(u64::MAX),
            limit: Some(MAX_PAGE_LIMIT),
            ..Default::default()
        };
        assert_eq!(filter.offset(), i64::MAX as u64);
    }
}
