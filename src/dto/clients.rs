use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::Client,
    validation::{Validate, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterClientRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterClientRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.name("name", &self.name).email("email", &self.email).min_len(
            "password",
            &self.password,
            6,
            "Password must have at least 6 characters",
        );
        v.finish()
    }
}

/// Used both by a client editing itself and by an admin editing a client.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Validate for UpdateClientRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.name("name", name);
        }
        if let Some(email) = &self.email {
            v.email("email", email);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ClientList {
    #[schema(value_type = Vec<Client>)]
    pub items: Vec<Client>,
}
