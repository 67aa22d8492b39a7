use actix_web::{HttpResponse, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use super::trip::trip_views;
use crate::{
    error::{ApiError, ApiResult, db_error},
    finance::{
        ledger::{DriverSummary, driver_summary},
        monthly::month_bounds,
        report::DriverReport,
    },
    model::{driver::Driver, salary::SalaryPayment, trip::TripView},
    utils::db_utils::{
        Filter, SqlValue, active_drivers, cash_balance, count, find_driver, load_payments,
        load_trips,
    },
};

const RECENT_TRIPS: usize = 10;
const RECENT_PAYMENTS: u32 = 5;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// One driver instead of every active driver.
    pub driver_id: Option<u64>,
    #[param(value_type = Option<String>, format = "date")]
    pub date_from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub date_to: Option<NaiveDate>,
}

impl DashboardQuery {
    /// Adds the date window on `column` to `filter`.
    fn window(&self, filter: Filter, column: Column) -> Filter {
        let (from, to) = match column {
            Column::TripDate => ("trip_date >= ", "trip_date <= "),
            Column::PaymentDate => ("payment_date >= ", "payment_date <= "),
        };
        filter
            .and_opt(from, self.date_from.map(SqlValue::Date))
            .and_opt(to, self.date_to.map(SqlValue::Date))
    }

    /// Shown in the report header only when both ends are given.
    fn report_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_from.zip(self.date_to)
    }
}

#[derive(Clone, Copy)]
enum Column {
    TripDate,
    PaymentDate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverDashboard {
    #[serde(flatten)]
    pub summary: DriverSummary,
    pub recent_trips: Vec<TripView>,
    pub recent_payments: Vec<SalaryPayment>,
    /// Ready to paste into a chat message.
    pub whatsapp_summary: String,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_drivers: usize,
    pub total_earnings: f64,
    pub total_pending_salary: f64,
    pub total_trips_today: i64,
    pub total_trips_this_month: i64,
    pub cash_balance: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub drivers: Vec<DriverDashboard>,
    pub overall_stats: OverallStats,
}

async fn latest_payments(pool: &MySqlPool, driver_id: u64) -> Result<Vec<SalaryPayment>, sqlx::Error> {
    sqlx::query_as::<_, SalaryPayment>(
        r#"
        SELECT * FROM salary_payments
        WHERE driver_id = ?
        ORDER BY payment_date DESC, created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(driver_id)
    .bind(RECENT_PAYMENTS)
    .fetch_all(pool)
    .await
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Per-driver cards and overall stats", body = DashboardResponse),
        (status = 404, description = "Driver not found")
    ),
    tag = "Dashboard"
)]
#[instrument(skip(pool))]
pub async fn dashboard(
    pool: web::Data<MySqlPool>,
    query: web::Query<DashboardQuery>,
) -> ApiResult<HttpResponse> {
    let pool = pool.get_ref();
    let failed = || db_error("Failed to fetch dashboard data");

    let active = active_drivers(pool).await.map_err(failed())?;
    let targets: Vec<Driver> = match query.driver_id {
        Some(id) => vec![
            find_driver(pool, id)
                .await
                .map_err(failed())?
                .ok_or_else(|| ApiError::not_found("Driver not found"))?,
        ],
        None => active.clone(),
    };

    let ids: Vec<u64> = targets.iter().map(|d| d.id).collect();
    let by_driver = Filter::new().and("driver_id IN ", SqlValue::List(ids));
    let trips = if targets.is_empty() {
        Vec::new()
    } else {
        load_trips(pool, &query.window(by_driver.clone(), Column::TripDate))
            .await
            .map_err(failed())?
    };
    let payments = if targets.is_empty() {
        Vec::new()
    } else {
        load_payments(pool, &query.window(by_driver, Column::PaymentDate))
            .await
            .map_err(failed())?
    };

    let mut stats = OverallStats {
        total_drivers: active.len(),
        ..Default::default()
    };
    let mut cards = Vec::with_capacity(targets.len());

    for driver in &targets {
        let own_trips: Vec<_> = trips
            .iter()
            .filter(|t| t.driver_id == driver.id)
            .cloned()
            .collect();
        let summary = driver_summary(driver, &own_trips, &payments);
        let whatsapp_summary = DriverReport {
            summary: &summary,
            trips: &own_trips,
            range: query.report_range(),
        }
        .to_string();

        stats.total_earnings += summary.total_earnings;
        stats.total_pending_salary += summary.pending_salary;

        let recent_trips = trip_views(pool, own_trips.into_iter().take(RECENT_TRIPS).collect())
            .await
            .map_err(failed())?;
        let recent_payments = latest_payments(pool, driver.id).await.map_err(failed())?;

        cards.push(DriverDashboard {
            summary,
            recent_trips,
            recent_payments,
            whatsapp_summary,
        });
    }

    let today = Local::now().date_naive();
    stats.total_trips_today = count(
        pool,
        "trips",
        &Filter::new().and("trip_date = ", SqlValue::Date(today)),
    )
    .await
    .map_err(failed())?;

    if let Some((first, last)) = month_bounds(today.year(), today.month()) {
        let this_month = Filter::new()
            .and("trip_date >= ", SqlValue::Date(first))
            .and("trip_date <= ", SqlValue::Date(last));
        stats.total_trips_this_month = count(pool, "trips", &this_month).await.map_err(failed())?;
    }

    stats.cash_balance = cash_balance(pool).await.map_err(failed())?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        drivers: cards,
        overall_stats: stats,
    }))
}
