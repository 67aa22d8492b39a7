use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 1,
        "name": "Preetam",
        "commissionPercentage": 35.0,
        "totalEarnings": 48250.0,
        "totalSalaryPaid": 9100.0,
        "pendingSalary": 2650.5,
        "isActive": true,
        "createdAt": "2026-01-01T09:00:00",
        "updatedAt": "2026-02-01T18:30:00"
    })
)]
pub struct Driver {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Preetam")]
    pub name: String,

    /// Share of net trip earnings paid to the driver, in percent.
    #[schema(example = 35.0)]
    pub commission_percentage: f64,

    /// Gross trip earnings recorded for this driver.
    pub total_earnings: f64,

    pub total_salary_paid: f64,

    /// Never negative.
    pub pending_salary: f64,

    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// Roster inserted by `POST /api/init` into an empty database.
pub const DEFAULT_DRIVERS: [(&str, f64); 4] = [
    ("Vivek Bali", 30.0),
    ("Preetam", 35.0),
    ("Chhotelal", 35.0),
    ("Vikash Yadav", 35.0),
];

/// Commission percentages outside (0, 100] are rejected.
pub fn valid_commission(percentage: f64) -> bool {
    percentage.is_finite() && percentage > 0.0 && percentage <= 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_bounds() {
        assert!(valid_commission(35.0));
        assert!(valid_commission(100.0));
        assert!(!valid_commission(0.0));
        assert!(!valid_commission(100.5));
        assert!(!valid_commission(f64::NAN));
    }
}
