use chrono::NaiveDate;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};

use crate::model::{
    driver::Driver,
    salary::SalaryPayment,
    trip::{FuelEntry, Trip},
};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
    /// Expands to `(?, ?, ...)`.
    List(Vec<u64>),
}

/// ===============================
/// WHERE clause container
/// ===============================
/// Each condition is a SQL fragment ending just before its bound value,
/// e.g. `"trip_date >= "`.
#[derive(Debug, Default, Clone)]
pub struct Filter {
    conditions: Vec<(&'static str, SqlValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: &'static str, value: SqlValue) -> Self {
        self.conditions.push((condition, value));
        self
    }

    pub fn and_opt(self, condition: &'static str, value: Option<SqlValue>) -> Self {
        match value {
            Some(value) => self.and(condition, value),
            None => self,
        }
    }

    /// Appends ` WHERE ... AND ...` with every value bound.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, MySql>) {
        for (index, (condition, value)) in self.conditions.iter().enumerate() {
            qb.push(if index == 0 { " WHERE " } else { " AND " });
            qb.push(*condition);
            match value {
                SqlValue::U64(v) => {
                    qb.push_bind(*v);
                }
                SqlValue::Str(v) => {
                    qb.push_bind(v.clone());
                }
                SqlValue::Date(v) => {
                    qb.push_bind(*v);
                }
                SqlValue::List(ids) => {
                    qb.push("(");
                    let mut separated = qb.separated(", ");
                    for id in ids {
                        separated.push_bind(*id);
                    }
                    separated.push_unseparated(")");
                }
            }
        }
    }

    /// `SELECT {columns} FROM {table}` plus this filter.
    pub fn select(&self, columns: &str, table: &str) -> QueryBuilder<'static, MySql> {
        let mut qb = QueryBuilder::new(format!("SELECT {columns} FROM {table}"));
        self.push_to(&mut qb);
        qb
    }
}

/// ===============================
/// Shared loaders
/// ===============================
pub async fn find_driver(pool: &MySqlPool, driver_id: u64) -> Result<Option<Driver>, sqlx::Error> {
    sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = ?")
        .bind(driver_id)
        .fetch_optional(pool)
        .await
}

pub async fn active_drivers(pool: &MySqlPool) -> Result<Vec<Driver>, sqlx::Error> {
    sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE is_active = TRUE ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Newest first.
pub async fn load_trips(pool: &MySqlPool, filter: &Filter) -> Result<Vec<Trip>, sqlx::Error> {
    let mut qb = filter.select("*", "trips");
    qb.push(" ORDER BY trip_date DESC, created_at DESC, id DESC");
    qb.build_query_as::<Trip>().fetch_all(pool).await
}

/// Newest first.
pub async fn load_payments(
    pool: &MySqlPool,
    filter: &Filter,
) -> Result<Vec<SalaryPayment>, sqlx::Error> {
    let mut qb = filter.select("*", "salary_payments");
    qb.push(" ORDER BY payment_date DESC, created_at DESC, id DESC");
    qb.build_query_as::<SalaryPayment>().fetch_all(pool).await
}

/// Fuel entries for `trip_ids`, in entry order.
pub async fn load_fuel_entries(
    pool: &MySqlPool,
    trip_ids: &[u64],
) -> Result<Vec<FuelEntry>, sqlx::Error> {
    if trip_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = Filter::new()
        .and("trip_id IN ", SqlValue::List(trip_ids.to_vec()))
        .select("*", "trip_fuel_entries");
    qb.push(" ORDER BY trip_id, position");
    qb.build_query_as::<FuelEntry>().fetch_all(pool).await
}

pub async fn count(pool: &MySqlPool, table: &str, filter: &Filter) -> Result<i64, sqlx::Error> {
    filter
        .select("COUNT(*)", table)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
}

pub async fn cash_balance(pool: &MySqlPool) -> Result<f64, sqlx::Error> {
    let balance = sqlx::query_scalar::<_, f64>("SELECT current_balance FROM cash_balance WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(balance.unwrap_or(0.0))
}

/// Adds `delta` to the running balance inside the caller's transaction.
/// The balance may go negative.
pub async fn adjust_cash_balance(conn: &mut MySqlConnection, delta: f64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cash_balance (id, current_balance, last_updated)
        VALUES (1, ?, NOW())
        ON DUPLICATE KEY UPDATE
            current_balance = current_balance + VALUES(current_balance),
            last_updated = NOW()
        "#,
    )
    .bind(delta)
    .execute(conn)
    .await?;
    Ok(())
}
