use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    /// Signed effect on the cash balance.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            TransactionType::Deposit => amount,
            TransactionType::Withdrawal => -amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashierTransaction {
    pub id: u64,
    #[serde(rename = "type")]
    #[schema(example = "deposit")]
    pub transaction_type: String,
    pub amount: f64,
    pub description: String,
    pub cashier_name: String,
    pub owner_authenticated: bool,
    #[schema(value_type = String, format = "date")]
    pub transaction_date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Name recorded on withdrawals made automatically for trip shortfalls.
pub const SYSTEM_CASHIER: &str = "System";
