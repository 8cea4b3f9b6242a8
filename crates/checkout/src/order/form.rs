//! Order contact and delivery form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

const MAX_NAME_LEN: usize = 255;
const MIN_PHONE_LEN: usize = 5;
const MAX_PHONE_LEN: usize = 20;
const MAX_ADDRESS_LEN: usize = 1024;
const MAX_COMMENT_LEN: usize = 1000;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyingType {
    /// Collected from the shop.
    #[default]
    SelfPickup,
    /// Shipped to `address`.
    Delivery,
}

/// The order form as submitted, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub buying_type: BuyingType,
    /// `YYYY-MM-DD`.
    pub delivery_date: String,
    pub comment: Option<String>,
}

/// Validated order fields, snapshotted into the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub buying_type: BuyingType,
    pub delivery_date: NaiveDate,
    pub comment: Option<String>,
}

impl OrderForm {
    /// Checks every field against `today` and returns the trimmed values,
    /// or all failing fields at once.
    pub fn validate(&self, today: NaiveDate) -> Result<OrderDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = required_text(&mut errors, "first_name", &self.first_name, MAX_NAME_LEN);
        let last_name = required_text(&mut errors, "last_name", &self.last_name, MAX_NAME_LEN);

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.add("phone", "phone is required");
        } else if !(MIN_PHONE_LEN..=MAX_PHONE_LEN).contains(&phone.chars().count()) {
            errors.add(
                "phone",
                format!("must be {MIN_PHONE_LEN} to {MAX_PHONE_LEN} characters"),
            );
        } else if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
        {
            errors.add("phone", "may only contain digits, spaces and + - ( )");
        }

        let address = optional_text(self.address.as_deref());
        match (&address, self.buying_type) {
            (None, BuyingType::Delivery) => {
                errors.add("address", "address is required for delivery")
            }
            (Some(a), _) if a.chars().count() > MAX_ADDRESS_LEN => errors.add(
                "address",
                format!("must be at most {MAX_ADDRESS_LEN} characters"),
            ),
            _ => {}
        }

        let delivery_date = match NaiveDate::parse_from_str(self.delivery_date.trim(), DATE_FORMAT)
        {
            Ok(date) if date < today => {
                errors.add("delivery_date", "must not be in the past");
                None
            }
            Ok(date) => Some(date),
            Err(_) if self.delivery_date.trim().is_empty() => {
                errors.add("delivery_date", "delivery date is required");
                None
            }
            Err(_) => {
                errors.add("delivery_date", "must be a date in YYYY-MM-DD format");
                None
            }
        };

        let comment = optional_text(self.comment.as_deref());
        if let Some(c) = &comment
            && c.chars().count() > MAX_COMMENT_LEN
        {
            errors.add(
                "comment",
                format!("must be at most {MAX_COMMENT_LEN} characters"),
            );
        }

        errors.into_result()?;
        match delivery_date {
            Some(delivery_date) => Ok(OrderDetails {
                first_name,
                last_name,
                phone: phone.to_string(),
                address,
                buying_type: self.buying_type,
                delivery_date,
                comment,
            }),
            None => Err(ValidationErrors::single(
                "delivery_date",
                "delivery date is required",
            )),
        }
    }
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{field} is required"));
    } else if value.chars().count() > max {
        errors.add(field, format!("must be at most {max} characters"));
    }
    value.to_string()
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
