use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::Service,
    validation::{Validate, Validator},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

impl Validate for CreateServiceRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.name("name", &self.name).price("price", self.price);
        v.finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateServiceRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.name("name", name);
        }
        if let Some(price) = self.price {
            v.price("price", price);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ServiceList {
    #[schema(value_type = Vec<Service>)]
    pub items: Vec<Service>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn price_must_be_positive() {
        let req = CreateServiceRequest {
            name: "Network setup".into(),
            description: None,
            price: Decimal::ZERO,
        };
        match req.validate() {
            Err(AppError::Validation(errors)) => assert!(errors.contains_key("price")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn price_must_fit_the_stored_precision() {
        for price in [Decimal::new(1, 3), Decimal::new(100_000_000, 0)] {
            let req = CreateServiceRequest {
                name: "Network setup".into(),
                description: None,
                price,
            };
            let rejected = matches!(
                req.validate(),
                Err(AppError::Validation(ref e)) if e.contains_key("price")
            );
            assert!(rejected, "{price} should be rejected");
        }
    }

    #[test]
    fn update_rejects_sub_cent_price() {
        let req = UpdateServiceRequest {
            price: Some(Decimal::new(1, 3)),
            ..Default::default()
        };
        match req.validate() {
            Err(AppError::Validation(errors)) => assert!(errors.contains_key("price")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let req = UpdateServiceRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }
}
