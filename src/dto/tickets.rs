use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::tickets::TicketStatus,
    error::AppResult,
    models::TicketView,
    validation::{Validate, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub technician_id: Uuid,
    pub description: Option<String>,
    pub service_ids: Vec<Uuid>,
}

impl Validate for CreateTicketRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.check(
            !self.service_ids.is_empty(),
            "serviceIds",
            "Select at least one service",
        );
        v.finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddTicketServiceRequest {
    pub service_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TicketList {
    #[schema(value_type = Vec<TicketView>)]
    pub items: Vec<TicketView>,
}
