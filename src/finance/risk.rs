use serde::Serialize;
use utoipa::ToSchema;

/// Pending salary above this is flagged.
pub const PENDING_SALARY_ALERT: f64 = 5_000.0;
pub const PENDING_SALARY_HIGH: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// `High` when `high` holds, otherwise `Medium`.
    pub fn escalate(high: bool) -> Self {
        if high { Severity::High } else { Severity::Medium }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    HighPendingSalary,
    LowProfitability,
    HighOnlinePayment,
    HighFuelCost,
    InactiveDriver,
    LowProfitMargin,
    HighFuelCosts,
    InactiveDrivers,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub kind: RiskKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub message: String,
    /// Recommended follow-up, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl RiskFactor {
    pub fn new(kind: RiskKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            driver: None,
            amount: None,
            message: message.into(),
            action: None,
        }
    }

    pub fn driver(mut self, name: &str) -> Self {
        self.driver = Some(name.to_string());
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }
}

/// `Some` when pending salary crosses the alert line.
pub fn pending_salary_severity(pending: f64) -> Option<Severity> {
    (pending > PENDING_SALARY_ALERT).then(|| Severity::escalate(pending > PENDING_SALARY_HIGH))
}
