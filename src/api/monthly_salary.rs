use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiResult, db_error},
    finance::monthly::{bucket_of, month_bounds, month_index, monthly_figures},
    model::salary::MonthlySalarySummary,
    utils::db_utils::{Filter, SqlValue, find_driver, load_payments, load_trips},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MonthlySalaryQuery {
    /// Required.
    pub driver_id: Option<u64>,
    /// 1-12, defaults to the current month.
    pub month: Option<u8>,
    /// Defaults to the current year.
    pub year: Option<u16>,
}

fn valid_month(month: u8) -> Result<u8, String> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err("Month must be between 1 and 12".into())
    }
}

impl MonthlySalaryQuery {
    fn resolve(&self, today: NaiveDate) -> Result<(u64, u8, u16), String> {
        let driver_id = self.driver_id.ok_or("Driver ID is required")?;
        let (this_month, this_year) = bucket_of(today);
        let month = valid_month(self.month.unwrap_or(this_month))?;
        Ok((driver_id, month, self.year.unwrap_or(this_year)))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRange {
    /// Limit to these driver ids.
    pub drivers: Option<Vec<u64>>,
    pub start_month: Option<u8>,
    pub start_year: Option<u16>,
    pub end_month: Option<u8>,
    pub end_year: Option<u16>,
}

impl SummaryRange {
    /// The whole range when all four bounds are given, else the current month.
    fn filter(&self, today: NaiveDate) -> Result<Filter, String> {
        let filter = match self.drivers.as_deref() {
            Some(ids) if !ids.is_empty() => {
                Filter::new().and("driver_id IN ", SqlValue::List(ids.to_vec()))
            }
            _ => Filter::new(),
        };

        match (self.start_month, self.start_year, self.end_month, self.end_year) {
            (Some(sm), Some(sy), Some(em), Some(ey)) => {
                let start = month_index(sy, valid_month(sm)?);
                let end = month_index(ey, valid_month(em)?);
                if start > end {
                    return Err("Start month must not be after end month".into());
                }
                Ok(filter
                    .and("(year * 12 + month) >= ", SqlValue::U64(u64::from(start)))
                    .and("(year * 12 + month) <= ", SqlValue::U64(u64::from(end))))
            }
            _ => {
                let (month, year) = bucket_of(today);
                Ok(filter
                    .and("month = ", SqlValue::U64(u64::from(month)))
                    .and("year = ", SqlValue::U64(u64::from(year))))
            }
        }
    }
}

/// Recomputes one driver's month from trips and payments and stores it.
#[utoipa::path(
    get,
    path = "/api/monthly-salary",
    params(MonthlySalaryQuery),
    responses(
        (status = 200, description = "Summary, payment history and computed figures", body = Object),
        (status = 400, description = "Driver id missing or bad month"),
        (status = 404, description = "Driver not found")
    ),
    tag = "Salary"
)]
#[instrument(skip(pool))]
pub async fn monthly_salary(
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthlySalaryQuery>,
) -> ApiResult<HttpResponse> {
    let (driver_id, month, year) = query
        .resolve(Local::now().date_naive())
        .map_err(ApiError::BadRequest)?;
    let (first, last) = month_bounds(i32::from(year), u32::from(month))
        .ok_or_else(|| ApiError::bad_request("Month must be between 1 and 12"))?;

    let pool = pool.get_ref();
    let failed = || db_error("Failed to fetch monthly salary data");

    let driver = find_driver(pool, driver_id)
        .await
        .map_err(failed())?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;

    let trips = load_trips(
        pool,
        &Filter::new()
            .and("driver_id = ", SqlValue::U64(driver_id))
            .and("trip_date >= ", SqlValue::Date(first))
            .and("trip_date <= ", SqlValue::Date(last)),
    )
    .await
    .map_err(failed())?;

    let payment_history = load_payments(
        pool,
        &Filter::new()
            .and("driver_id = ", SqlValue::U64(driver_id))
            .and("month = ", SqlValue::U64(u64::from(month)))
            .and("year = ", SqlValue::U64(u64::from(year))),
    )
    .await
    .map_err(failed())?;

    let figures = monthly_figures(driver.commission_percentage, &trips, &payment_history);

    sqlx::query(
        r#"
        INSERT INTO monthly_salary_summaries (
            driver_id, driver_name, month, year,
            total_earnings_this_month, total_salary_this_month, total_paid_this_month,
            remaining_salary_this_month, payments_this_month, last_updated
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NOW())
        ON DUPLICATE KEY UPDATE
            driver_name = VALUES(driver_name),
            total_earnings_this_month = VALUES(total_earnings_this_month),
            total_salary_this_month = VALUES(total_salary_this_month),
            total_paid_this_month = VALUES(total_paid_this_month),
            remaining_salary_this_month = VALUES(remaining_salary_this_month),
            payments_this_month = VALUES(payments_this_month),
            last_updated = NOW()
        "#,
    )
    .bind(driver.id)
    .bind(&driver.name)
    .bind(month)
    .bind(year)
    .bind(figures.total_earnings)
    .bind(figures.total_salary)
    .bind(figures.total_paid)
    .bind(figures.remaining_salary)
    .bind(figures.payments_count)
    .execute(pool)
    .await
    .map_err(db_error("Failed to update monthly summary"))?;

    let summary = sqlx::query_as::<_, MonthlySalarySummary>(
        "SELECT * FROM monthly_salary_summaries WHERE driver_id = ? AND month = ? AND year = ?",
    )
    .bind(driver.id)
    .bind(month)
    .bind(year)
    .fetch_one(pool)
    .await
    .map_err(failed())?;

    info!(driver_id, month, year, remaining = figures.remaining_salary, "Monthly summary refreshed");
    Ok(HttpResponse::Ok().json(json!({
        "monthlySummary": summary,
        "paymentHistory": payment_history,
        "calculatedData": {
            "totalEarningsThisMonth": figures.total_earnings,
            "totalSalaryThisMonth": figures.total_salary,
            "totalPaidThisMonth": figures.total_paid,
            "remainingSalaryThisMonth": figures.remaining_salary,
            "paymentsThisMonth": figures.payments_count,
            "commissionPercentage": driver.commission_percentage,
        },
    })))
}

/// Stored summaries in a month range, newest month first.
#[utoipa::path(
    post,
    path = "/api/monthly-salary",
    request_body = SummaryRange,
    responses(
        (status = 200, description = "Summaries in range", body = Object, example = json!({"summaries": []})),
        (status = 400, description = "Bad month or inverted range")
    ),
    tag = "Salary"
)]
#[instrument(skip(pool, payload))]
pub async fn list_summaries(
    pool: web::Data<MySqlPool>,
    payload: web::Json<SummaryRange>,
) -> ApiResult<HttpResponse> {
    let filter = payload
        .filter(Local::now().date_naive())
        .map_err(ApiError::BadRequest)?;

    let mut qb = filter.select("*", "monthly_salary_summaries");
    qb.push(" ORDER BY year DESC, month DESC, driver_name");

    let summaries = qb
        .build_query_as::<MonthlySalarySummary>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch monthly summaries"))?;

    Ok(HttpResponse::Ok().json(json!({ "summaries": summaries })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::lazy_pool;
    use actix_web::{App, http::StatusCode, test as atest};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn query_defaults_to_current_month() {
        let query = MonthlySalaryQuery {
            driver_id: Some(3),
            month: None,
            year: None,
        };
        assert_eq!(query.resolve(today()).unwrap(), (3, 3, 2026));

        let missing = MonthlySalaryQuery {
            driver_id: None,
            month: Some(2),
            year: Some(2026),
        };
        assert_eq!(missing.resolve(today()).unwrap_err(), "Driver ID is required");
    }

    #[test]
    fn cross_year_range_uses_month_index() {
        let range = SummaryRange {
            drivers: Some(vec![1, 2]),
            start_month: Some(11),
            start_year: Some(2025),
            end_month: Some(2),
            end_year: Some(2026),
        };
        let qb = range.filter(today()).unwrap().select("*", "monthly_salary_summaries");
        assert_eq!(
            qb.sql(),
            "SELECT * FROM monthly_salary_summaries WHERE driver_id IN (?, ?) \
             AND (year * 12 + month) >= ? AND (year * 12 + month) <= ?"
        );
    }

    #[test]
    fn partial_range_falls_back_to_current_month() {
        let range = SummaryRange {
            start_month: Some(1),
            ..Default::default()
        };
        let qb = range.filter(today()).unwrap().select("*", "monthly_salary_summaries");
        assert_eq!(
            qb.sql(),
            "SELECT * FROM monthly_salary_summaries WHERE month = ? AND year = ?"
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let range = SummaryRange {
            start_month: Some(5),
            start_year: Some(2026),
            end_month: Some(4),
            end_year: Some(2026),
            ..Default::default()
        };
        assert!(range.filter(today()).is_err());
    }

    #[actix_web::test]
    async fn get_without_driver_is_bad_request() {
        let app = atest::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .route("/monthly-salary", web::get().to(monthly_salary)),
        )
        .await;
        let req = atest::TestRequest::get()
            .uri("/monthly-salary?month=3&year=2026")
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "Driver ID is required");
    }
}
