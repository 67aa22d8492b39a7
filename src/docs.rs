use crate::api::{
    cashier::CreateCashierTransaction,
    dashboard::{DashboardResponse, DriverDashboard, OverallStats},
    driver::{CreateDriver, UpdateDriver},
    monthly_salary::SummaryRange,
    salary_payment::CreateSalaryPayment,
    trip::{CreateTrip, PreviewTrip},
};
use crate::finance::{
    analytics::{BusinessMetrics, DriverAnalytics, TrendPoint},
    ledger::DriverSummary,
    owner::{Activity, ActivityKind, DriverStatus, OwnerDriverSummary, OwnerMetrics},
    period::{AnalyticsPeriod, DateRange, OwnerPeriod},
    reconciliation::{FuelExpense, TripCalculation, TripInputs},
    risk::{RiskFactor, RiskKind, Severity},
};
use crate::model::{
    cashier::{CashierTransaction, TransactionType},
    driver::Driver,
    platform::{Platform, PlatformAmounts},
    salary::{MonthlySalarySummary, PaymentMethod, SalaryPayment},
    trip::{CommissionDetails, FuelEntry, NegativeCashHandling, PlatformDetail, PlatformDetails, TripView},
};
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fleet Ledger API",
        version = "1.0.0",
        description = r#"
## Fleet back office

Records driver trips across ride platforms (Uber, InDrive, Yatri, Rapido and offline bookings),
reconciles cash against online payments, computes commission salaries and serves owner analytics.

### 🔹 Key Features
- **Drivers**: roster, commission rates, running salary balances
- **Trips**: per-platform earnings and cash, platform commissions, fuel entries
- **Salary**: payouts against pending salary and monthly rollups
- **Cashier**: cash box deposits, withdrawals and running balance
- **Analytics**: business metrics, owner dashboard and risk alerts

### 🔐 Security
`/api/business-analytics` and `/api/owner-dashboard` need the owner token from `POST /auth/login`.

### 📦 Response Format
- camelCase JSON
- Errors are `{"error": "<message>"}`
- List endpoints take `page` and `limit`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::api::health::health,

        crate::api::driver::list_drivers,
        crate::api::driver::create_driver,
        crate::api::driver::get_driver,
        crate::api::driver::update_driver,
        crate::api::init::init_system,

        crate::api::trip::list_trips,
        crate::api::trip::create_trip,
        crate::api::trip::get_trip,
        crate::api::trip::preview_trip,

        crate::api::salary_payment::list_payments,
        crate::api::salary_payment::create_payment,
        crate::api::monthly_salary::monthly_salary,
        crate::api::monthly_salary::list_summaries,

        crate::api::cashier::list_transactions,
        crate::api::cashier::create_transaction,

        crate::api::dashboard::dashboard,
        crate::api::analytics::business_analytics,
        crate::api::analytics::owner_dashboard
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Driver,
            CreateDriver,
            UpdateDriver,
            Platform,
            PlatformAmounts,
            CreateTrip,
            PreviewTrip,
            TripInputs,
            FuelExpense,
            TripCalculation,
            NegativeCashHandling,
            TripView,
            FuelEntry,
            PlatformDetail,
            PlatformDetails,
            CommissionDetails,
            PaymentMethod,
            SalaryPayment,
            CreateSalaryPayment,
            MonthlySalarySummary,
            SummaryRange,
            TransactionType,
            CashierTransaction,
            CreateCashierTransaction,
            DriverSummary,
            DriverDashboard,
            OverallStats,
            DashboardResponse,
            AnalyticsPeriod,
            OwnerPeriod,
            DateRange,
            DriverAnalytics,
            TrendPoint,
            BusinessMetrics,
            OwnerMetrics,
            OwnerDriverSummary,
            DriverStatus,
            Activity,
            ActivityKind,
            RiskFactor,
            RiskKind,
            Severity
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Owner login"),
        (name = "Health", description = "Liveness"),
        (name = "Drivers", description = "Driver roster"),
        (name = "Trips", description = "Trip recording and reconciliation"),
        (name = "Salary", description = "Salary payments and monthly rollups"),
        (name = "Cashier", description = "Cash box ledger"),
        (name = "Dashboard", description = "Driver dashboard"),
        (name = "Analytics", description = "Owner-only analytics"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/trips",
            "/api/trips/preview",
            "/api/monthly-salary",
            "/api/owner-dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn trip_form_schemas_are_documented() {
        let components = ApiDoc::openapi().components.unwrap();
        for name in ["TripInputs", "FuelExpense", "CreateTrip", "PreviewTrip"] {
            assert!(components.schemas.contains_key(name), "{name} missing");
        }
    }
}
