use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{AvailableTechnician, Technician},
    validation::{Validate, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTechnicianRequest {
    pub name: String,
    pub email: String,
    pub available_hours: Option<Vec<String>>,
}

impl Validate for CreateTechnicianRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.name("name", &self.name).email("email", &self.email);
        if let Some(hours) = &self.available_hours {
            v.hours("availableHours", hours);
        }
        v.finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTechnicianRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub available_hours: Option<Vec<String>>,
}

impl Validate for UpdateTechnicianRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.name("name", name);
        }
        if let Some(email) = &self.email {
            v.email("email", email);
        }
        if let Some(hours) = &self.available_hours {
            v.hours("availableHours", hours);
        }
        v.finish()
    }
}

/// A technician editing itself may not change its e-mail.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTechnicianProfileRequest {
    pub name: Option<String>,
    pub available_hours: Option<Vec<String>>,
}

impl Validate for UpdateTechnicianProfileRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.name("name", name);
        }
        if let Some(hours) = &self.available_hours {
            v.hours("availableHours", hours);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TechnicianList {
    #[schema(value_type = Vec<Technician>)]
    pub items: Vec<Technician>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AvailableTechnicianList {
    #[schema(value_type = Vec<AvailableTechnician>)]
    pub items: Vec<AvailableTechnician>,
}
