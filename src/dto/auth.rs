use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::users::Role,
    error::AppResult,
    models::UserSummary,
    validation::{Validate, Validator},
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.email("email", &self.email);
        v.min_len("password", &self.password, 6, "Password must have at least 6 characters");
        v.finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.min_len(
            "currentPassword",
            &self.current_password,
            6,
            "Current password must have at least 6 characters",
        );
        v.min_len(
            "newPassword",
            &self.new_password,
            6,
            "New password must have at least 6 characters",
        );
        v.min_len(
            "confirmPassword",
            &self.confirm_password,
            6,
            "Confirmation must have at least 6 characters",
        );
        v.check(
            self.new_password == self.confirm_password,
            "confirmPassword",
            "Passwords do not match",
        );
        v.finish()
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}
