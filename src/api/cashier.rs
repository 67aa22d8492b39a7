use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiResult, db_error},
    model::cashier::{CashierTransaction, TransactionType},
    utils::{
        db_utils::{Filter, SqlValue, adjust_cash_balance, cash_balance, count},
        pagination::Page,
    },
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCashierTransaction {
    #[serde(rename = "type")]
    #[schema(example = "deposit")]
    pub transaction_type: Option<String>,
    #[schema(example = 5000.0)]
    pub amount: Option<f64>,
    #[schema(example = "Evening collection")]
    pub description: Option<String>,
    #[schema(example = "Suresh")]
    pub cashier_name: Option<String>,
    pub owner_authenticated: Option<bool>,
    #[schema(value_type = Option<String>, format = "date", example = "2026-03-14")]
    pub transaction_date: Option<NaiveDate>,
}

struct ValidTransaction<'a> {
    kind: TransactionType,
    amount: f64,
    description: &'a str,
    cashier_name: &'a str,
    owner_authenticated: bool,
    date: NaiveDate,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CreateCashierTransaction {
    fn validate(&self) -> Result<ValidTransaction<'_>, String> {
        let (
            Some(kind),
            Some(amount),
            Some(description),
            Some(cashier_name),
            Some(owner_authenticated),
            Some(date),
        ) = (
            present(&self.transaction_type),
            self.amount,
            present(&self.description),
            present(&self.cashier_name),
            self.owner_authenticated,
            self.transaction_date,
        )
        else {
            return Err("All fields are required".into());
        };

        let kind = TransactionType::from_str(kind).map_err(|_| {
            r#"Transaction type must be either "deposit" or "withdrawal""#.to_string()
        })?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err("Amount must be greater than 0".into());
        }

        Ok(ValidTransaction {
            kind,
            amount,
            description,
            cashier_name,
            owner_authenticated,
            date,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CashierQuery {
    /// `deposit` or `withdrawal`; anything else lists both.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Deposit into or withdraw from the cash box.
#[utoipa::path(
    post,
    path = "/api/cashier",
    request_body = CreateCashierTransaction,
    responses(
        (status = 201, description = "Transaction recorded", body = Object, example = json!({
            "transaction": {}, "newBalance": 12500.0
        })),
        (status = 400, description = "Missing field, bad type or insufficient balance")
    ),
    tag = "Cashier"
)]
#[instrument(skip(pool, payload))]
pub async fn create_transaction(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCashierTransaction>,
) -> ApiResult<HttpResponse> {
    let valid = payload.validate().map_err(ApiError::BadRequest)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(db_error("Failed to create cashier transaction"))?;

    let balance = sqlx::query_scalar::<_, f64>(
        "SELECT current_balance FROM cash_balance WHERE id = 1 FOR UPDATE",
    )
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error("Failed to read cash balance"))?
    .unwrap_or(0.0);

    if valid.kind == TransactionType::Withdrawal && valid.amount > balance {
        return Err(ApiError::bad_request(format!(
            "Insufficient balance. Current balance: ₹{balance}"
        )));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO cashier_transactions
            (transaction_type, amount, description, cashier_name, owner_authenticated, transaction_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(valid.kind.as_ref())
    .bind(valid.amount)
    .bind(valid.description)
    .bind(valid.cashier_name)
    .bind(valid.owner_authenticated)
    .bind(valid.date)
    .execute(&mut *tx)
    .await
    .map_err(db_error("Failed to create cashier transaction"))?
    .last_insert_id();

    adjust_cash_balance(&mut tx, valid.kind.signed(valid.amount))
        .await
        .map_err(db_error("Failed to update cash balance"))?;

    tx.commit()
        .await
        .map_err(db_error("Failed to create cashier transaction"))?;

    let transaction =
        sqlx::query_as::<_, CashierTransaction>("SELECT * FROM cashier_transactions WHERE id = ?")
            .bind(id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(db_error("Failed to fetch cashier transaction"))?;
    let new_balance = cash_balance(pool.get_ref())
        .await
        .map_err(db_error("Failed to read cash balance"))?;

    info!(id, kind = %valid.kind, amount = valid.amount, new_balance, "Cashier transaction recorded");
    Ok(HttpResponse::Created().json(json!({
        "transaction": transaction,
        "newBalance": new_balance,
    })))
}

#[utoipa::path(
    get,
    path = "/api/cashier",
    params(CashierQuery),
    responses(
        (status = 200, description = "Ledger page and running balance", body = Object, example = json!({
            "transactions": [], "totalTransactions": 0, "currentPage": 1, "totalPages": 0, "currentBalance": 0.0
        }))
    ),
    tag = "Cashier"
)]
#[instrument(skip(pool))]
pub async fn list_transactions(
    pool: web::Data<MySqlPool>,
    query: web::Query<CashierQuery>,
) -> ApiResult<HttpResponse> {
    let page = Page::from_query(query.page, query.limit)?;

    let kind = query
        .transaction_type
        .as_deref()
        .and_then(|t| TransactionType::from_str(t).ok());
    let filter = Filter::new().and_opt(
        "transaction_type = ",
        kind.map(|k| SqlValue::Str(k.to_string())),
    );

    let total = count(pool.get_ref(), "cashier_transactions", &filter)
        .await
        .map_err(db_error("Failed to fetch cashier transactions"))?;

    let mut qb = filter.select("*", "cashier_transactions");
    qb.push(" ORDER BY transaction_date DESC, created_at DESC, id DESC LIMIT ")
        .push_bind(u64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(page.offset());

    let transactions = qb
        .build_query_as::<CashierTransaction>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch cashier transactions"))?;

    let current_balance = cash_balance(pool.get_ref())
        .await
        .map_err(db_error("Failed to read cash balance"))?;

    Ok(HttpResponse::Ok().json(json!({
        "transactions": transactions,
        "totalTransactions": total,
        "currentPage": page.page,
        "totalPages": page.total_pages(total),
        "currentBalance": current_balance,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::lazy_pool;
    use actix_web::{App, http::StatusCode, test as atest};

    fn complete() -> CreateCashierTransaction {
        CreateCashierTransaction {
            transaction_type: Some("withdrawal".into()),
            amount: Some(500.0),
            description: Some("Fuel advance".into()),
            cashier_name: Some("Suresh".into()),
            owner_authenticated: Some(false),
            transaction_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        }
    }

    fn error_of(tx: &CreateCashierTransaction) -> String {
        match tx.validate() {
            Ok(_) => panic!("expected a validation error"),
            Err(e) => e,
        }
    }

    #[test]
    fn every_field_is_required() {
        let blank_name = CreateCashierTransaction {
            cashier_name: Some("  ".into()),
            ..complete()
        };
        assert_eq!(error_of(&blank_name), "All fields are required");

        let no_flag = CreateCashierTransaction {
            owner_authenticated: None,
            ..complete()
        };
        assert_eq!(error_of(&no_flag), "All fields are required");
    }

    #[test]
    fn type_and_amount_are_checked() {
        let transfer = CreateCashierTransaction {
            transaction_type: Some("transfer".into()),
            ..complete()
        };
        assert!(error_of(&transfer).starts_with("Transaction type must be"));

        let negative = CreateCashierTransaction {
            amount: Some(-1.0),
            ..complete()
        };
        assert_eq!(error_of(&negative), "Amount must be greater than 0");

        let valid = complete();
        let valid = valid.validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(valid.kind, TransactionType::Withdrawal);
        assert_eq!(valid.kind.signed(valid.amount), -500.0);
    }

    #[actix_web::test]
    async fn incomplete_body_is_bad_request() {
        let app = atest::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .route("/cashier", web::post().to(create_transaction)),
        )
        .await;
        let req = atest::TestRequest::post()
            .uri("/cashier")
            .set_json(json!({"type": "deposit", "amount": 100}))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "All fields are required");
    }
}
