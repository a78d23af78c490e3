use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult, FieldErrors};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static HOUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid hour regex")
});

/// Request payloads that check their own shape before reaching the database.
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_hour(value: &str) -> bool {
    HOUR_RE.is_match(value)
}

/// Catalog prices are stored as `NUMERIC(10,2)`.
pub fn is_valid_price(value: Decimal) -> bool {
    value > Decimal::ZERO
        && value.normalize().scale() <= 2
        && value < Decimal::new(100_000_000, 0)
}

/// Collects per-field messages and turns them into a single `Validation` error.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        }
        self
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize, message: &str) -> &mut Self {
        self.check(value.trim().chars().count() >= min, field, message)
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "Invalid e-mail")
    }

    pub fn name(&mut self, field: &str, value: &str) -> &mut Self {
        self.min_len(field, value, 2, "Name must have at least 2 characters")
    }

    pub fn hours(&mut self, field: &str, hours: &[String]) -> &mut Self {
        let ok = hours.iter().all(|h| is_valid_hour(h));
        self.check(ok, field, "Invalid hour format, expected HH:MM")
    }

    pub fn price(&mut self, field: &str, value: Decimal) -> &mut Self {
        self.check(
            is_valid_price(value),
            field,
            "Price must be greater than zero, below 100000000 and have at most 2 decimal places",
        )
    }

    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}
