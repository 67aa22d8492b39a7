use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Upi,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPayment {
    #[schema(example = 12)]
    pub id: u64,
    pub driver_id: u64,
    pub driver_name: String,
    #[schema(example = 3000.0)]
    pub amount: f64,
    #[schema(value_type = String, format = "date")]
    pub payment_date: NaiveDate,
    #[schema(example = "upi")]
    pub payment_method: String,
    pub notes: Option<String>,
    /// 1-12, taken from `payment_date`.
    pub month: u8,
    pub year: u16,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Per driver and calendar month; unique on (driver, month, year).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySalarySummary {
    pub id: u64,
    pub driver_id: u64,
    pub driver_name: String,
    pub month: u8,
    pub year: u16,
    pub total_earnings_this_month: f64,
    pub total_salary_this_month: f64,
    pub total_paid_this_month: f64,
    pub remaining_salary_this_month: f64,
    pub payments_this_month: u32,
    #[schema(value_type = String, format = "date-time")]
    pub last_updated: NaiveDateTime,
}
