use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

/// A subscription plan accounts can be placed on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Plan {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Price in cents
    pub price: i32,
    /// Billing period, e.g. `720h`
    pub period: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanList {
    pub plans: Vec<Plan>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanCreationInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i32,
    pub period: String,
}

fn check_period(period: &str) -> Result<(), ValidationError> {
    validation::required("period", period)?;
    let valid = period
        .strip_suffix('h')
        .is_some_and(|hours| !hours.is_empty() && hours.bytes().all(|b| b.is_ascii_digit()));
    if !valid {
        return Err(ValidationError::Invalid {
            field: "period",
            reason: "must be a whole number of hours, e.g. 720h",
        });
    }
    Ok(())
}

fn check_price(price: i32) -> Result<(), ValidationError> {
    if price < 0 {
        return Err(ValidationError::Invalid {
            field: "price",
            reason: "must not be negative",
        });
    }
    Ok(())
}

impl Validate for PlanCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        check_price(self.price)?;
        check_period(&self.period)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanUpdateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl Validate for PlanUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if *self == PlanUpdateInput::default() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(name) = &self.name {
            validation::required("name", name)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(period) = &self.period {
            check_period(period)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_must_be_hours() {
        assert!(check_period("720h").is_ok());
        assert!(check_period("30d").is_err());
        assert!(check_period("h").is_err());
    }
}
