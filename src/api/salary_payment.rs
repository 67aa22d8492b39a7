use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiResult, db_error},
    finance::monthly::bucket_of,
    model::{
        driver::Driver,
        salary::{PaymentMethod, SalaryPayment},
    },
    utils::{
        db_utils::{Filter, SqlValue, count},
        pagination::Page,
    },
};

const REQUIRED: &str = "Driver ID, amount, payment date, and payment method are required";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalaryPayment {
    #[schema(example = 2)]
    pub driver_id: Option<u64>,
    #[schema(example = 3000.0)]
    pub amount: Option<f64>,
    #[schema(value_type = Option<String>, format = "date", example = "2026-03-31")]
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

struct ValidPayment {
    driver_id: u64,
    amount: f64,
    date: NaiveDate,
    method: PaymentMethod,
}

impl CreateSalaryPayment {
    fn validate(&self) -> Result<ValidPayment, String> {
        match (self.driver_id, self.amount, self.payment_date, self.payment_method) {
            (Some(driver_id), Some(amount), Some(date), Some(method))
                if amount.is_finite() && amount > 0.0 =>
            {
                Ok(ValidPayment {
                    driver_id,
                    amount,
                    date,
                    method,
                })
            }
            _ => Err(REQUIRED.into()),
        }
    }
}

impl ValidPayment {
    fn within_pending(&self, pending_salary: f64) -> Result<(), String> {
        if self.amount > pending_salary {
            return Err(format!(
                "Payment amount (₹{}) exceeds pending salary (₹{})",
                self.amount, pending_salary
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaymentQuery {
    pub driver_id: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Pays out part of a driver's pending salary.
#[utoipa::path(
    post,
    path = "/api/salary-payments",
    request_body = CreateSalaryPayment,
    responses(
        (status = 201, description = "Payment recorded", body = Object),
        (status = 400, description = "Missing field or amount above pending salary"),
        (status = 404, description = "Driver not found")
    ),
    tag = "Salary"
)]
#[instrument(skip(pool, payload))]
pub async fn create_payment(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSalaryPayment>,
) -> ApiResult<HttpResponse> {
    let valid = payload.validate().map_err(ApiError::BadRequest)?;

    let (month, year) = bucket_of(valid.date);
    let mut tx = pool
        .begin()
        .await
        .map_err(db_error("Failed to create salary payment"))?;

    // Row lock so concurrent payments see each other's deductions.
    let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = ? FOR UPDATE")
        .bind(valid.driver_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to create salary payment"))?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;

    valid
        .within_pending(driver.pending_salary)
        .map_err(ApiError::BadRequest)?;

    let payment_id = sqlx::query(
        r#"
        INSERT INTO salary_payments
            (driver_id, driver_name, amount, payment_date, payment_method, notes, month, year)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(driver.id)
    .bind(&driver.name)
    .bind(valid.amount)
    .bind(valid.date)
    .bind(valid.method.as_ref())
    .bind(payload.notes.as_deref())
    .bind(month)
    .bind(year)
    .execute(&mut *tx)
    .await
    .map_err(db_error("Failed to create salary payment"))?
    .last_insert_id();

    sqlx::query(
        r#"
        UPDATE drivers
        SET total_salary_paid = total_salary_paid + ?,
            pending_salary = GREATEST(pending_salary - ?, 0)
        WHERE id = ?
        "#,
    )
    .bind(valid.amount)
    .bind(valid.amount)
    .bind(driver.id)
    .execute(&mut *tx)
    .await
    .map_err(db_error("Failed to update driver salary"))?;

    sqlx::query(
        r#"
        INSERT INTO monthly_salary_summaries
            (driver_id, driver_name, month, year, total_paid_this_month, payments_this_month, last_updated)
        VALUES (?, ?, ?, ?, ?, 1, NOW())
        ON DUPLICATE KEY UPDATE
            total_paid_this_month = total_paid_this_month + VALUES(total_paid_this_month),
            payments_this_month = payments_this_month + 1,
            last_updated = NOW()
        "#,
    )
    .bind(driver.id)
    .bind(&driver.name)
    .bind(month)
    .bind(year)
    .bind(valid.amount)
    .execute(&mut *tx)
    .await
    .map_err(db_error("Failed to update monthly summary"))?;

    tx.commit()
        .await
        .map_err(db_error("Failed to create salary payment"))?;

    let payment = sqlx::query_as::<_, SalaryPayment>("SELECT * FROM salary_payments WHERE id = ?")
        .bind(payment_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch salary payment"))?;

    info!(payment_id, driver_id = driver.id, amount = valid.amount, "Salary paid");
    Ok(HttpResponse::Created().json(json!({ "payment": payment })))
}

#[utoipa::path(
    get,
    path = "/api/salary-payments",
    params(PaymentQuery),
    responses(
        (status = 200, description = "Payments, newest first", body = Object, example = json!({
            "payments": [], "totalPayments": 0, "currentPage": 1, "totalPages": 0
        }))
    ),
    tag = "Salary"
)]
#[instrument(skip(pool))]
pub async fn list_payments(
    pool: web::Data<MySqlPool>,
    query: web::Query<PaymentQuery>,
) -> ApiResult<HttpResponse> {
    let page = Page::from_query(query.page, query.limit)?;
    let filter = Filter::new().and_opt("driver_id = ", query.driver_id.map(SqlValue::U64));

    let total = count(pool.get_ref(), "salary_payments", &filter)
        .await
        .map_err(db_error("Failed to fetch salary payments"))?;

    let mut qb = filter.select("*", "salary_payments");
    qb.push(" ORDER BY payment_date DESC, created_at DESC, id DESC LIMIT ")
        .push_bind(u64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(page.offset());

    let payments = qb
        .build_query_as::<SalaryPayment>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch salary payments"))?;

    Ok(HttpResponse::Ok().json(json!({
        "payments": payments,
        "totalPayments": total,
        "currentPage": page.page,
        "totalPages": page.total_pages(total),
    })))
}
