use serde::Deserialize;
use utoipa::ToSchema;

use crate::entity::tickets::TicketStatus;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

// Query strings do not survive `#[serde(flatten)]` with numeric fields, so the
// paging keys are repeated here instead of flattening `Pagination`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TicketListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<TicketStatus>,
    pub sort_order: Option<SortOrder>,
}

impl TicketListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
