use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiResult, db_error},
    finance::reconciliation::{TripCalculation, TripInputs, calculate_trip},
    model::{
        cashier::{SYSTEM_CASHIER, TransactionType},
        driver::{Driver, valid_commission},
        platform::Platform,
        trip::{NegativeCashHandling, Trip, TripView},
    },
    utils::{
        db_utils::{Filter, SqlValue, adjust_cash_balance, count, find_driver, load_fuel_entries},
        pagination::Page,
    },
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrip {
    #[schema(example = 2)]
    pub driver_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date", example = "2026-03-14")]
    pub trip_date: Option<NaiveDate>,
    pub start_km: Option<f64>,
    pub end_km: Option<f64>,
    /// Derived from the odometer readings when omitted.
    pub total_km: Option<f64>,
    /// Defaults to `multiple`.
    pub platform: Option<Platform>,
    #[serde(default)]
    pub cash_given_to_cashier: bool,
    #[serde(default, alias = "negativeHandlingOption")]
    pub negative_handling: Option<NegativeCashHandling>,
    #[serde(default)]
    pub amount_from_cashier: f64,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub inputs: TripInputs,
}

/// Checked odometer readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Odometer {
    start: Option<f64>,
    end: Option<f64>,
    total: Option<f64>,
}

impl CreateTrip {
    fn validate(&self) -> Result<(u64, NaiveDate, Odometer), String> {
        let (Some(driver_id), Some(trip_date)) = (self.driver_id, self.trip_date) else {
            return Err("Driver ID and trip date are required".into());
        };
        self.inputs.validate()?;

        if !self.amount_from_cashier.is_finite() || self.amount_from_cashier < 0.0 {
            return Err("amountFromCashier must be a non-negative amount".into());
        }
        for (field, km) in [
            ("startKm", self.start_km),
            ("endKm", self.end_km),
            ("totalKm", self.total_km),
        ] {
            if matches!(km, Some(v) if !v.is_finite() || v < 0.0) {
                return Err(format!("{field} must be a non-negative number"));
            }
        }

        let total = match (self.start_km, self.end_km) {
            (Some(start), Some(end)) if end < start => {
                return Err("End km cannot be less than start km".into());
            }
            (Some(start), Some(end)) => self.total_km.or(Some(end - start)),
            _ => self.total_km,
        };

        Ok((
            driver_id,
            trip_date,
            Odometer {
                start: self.start_km,
                end: self.end_km,
                total,
            },
        ))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TripQuery {
    pub driver_id: Option<u64>,
    pub platform: Option<Platform>,
    /// Trips on this exact day.
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTrip {
    /// Used as-is when given; otherwise taken from the driver.
    pub commission_percentage: Option<f64>,
    pub driver_id: Option<u64>,
    #[serde(flatten)]
    pub inputs: TripInputs,
}

/// Attaches fuel entries to each trip, keeping the trips' order.
pub(crate) async fn trip_views(pool: &MySqlPool, trips: Vec<Trip>) -> Result<Vec<TripView>, sqlx::Error> {
    let ids: Vec<u64> = trips.iter().map(|t| t.id).collect();
    let mut fuel: HashMap<u64, Vec<_>> = HashMap::new();
    for entry in load_fuel_entries(pool, &ids).await? {
        fuel.entry(entry.trip_id).or_default().push(entry);
    }

    Ok(trips
        .into_iter()
        .map(|trip| {
            let entries = fuel.remove(&trip.id).unwrap_or_default();
            TripView::new(trip, entries)
        })
        .collect())
}

async fn insert_trip(
    conn: &mut MySqlConnection,
    driver: &Driver,
    trip_date: NaiveDate,
    odometer: Odometer,
    payload: &CreateTrip,
    calc: &TripCalculation,
    handling: NegativeCashHandling,
) -> Result<u64, sqlx::Error> {
    let inputs = &payload.inputs;
    let platform = payload.platform.unwrap_or(Platform::Multiple);

    let trip_id = sqlx::query(
        r#"
        INSERT INTO trips (
            driver_id, driver_name, platform, trip_date,
            uber_earnings, uber_cash, uber_commission,
            indrive_earnings, indrive_cash,
            yatri_earnings, yatri_cash, yatri_trips, yatri_commission,
            rapido_earnings, rapido_cash,
            offline_earnings, offline_cash,
            trip_amount, commission_amount, fuel_cost, other_expenses,
            cash_collected, online_payment, net_amount, driver_salary, cash_in_driver_hand,
            start_km, end_km, total_km,
            driver_took_salary, cash_given_to_cashier, cash_to_cashier,
            negative_handling, amount_from_cashier, notes
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(driver.id)
    .bind(&driver.name)
    .bind(platform.as_ref())
    .bind(trip_date)
    .bind(inputs.uber_earnings)
    .bind(inputs.uber_cash)
    .bind(calc.uber_commission)
    .bind(inputs.indrive_earnings)
    .bind(inputs.indrive_cash)
    .bind(inputs.yatri_earnings)
    .bind(inputs.yatri_cash)
    .bind(inputs.yatri_trips)
    .bind(calc.yatri_commission)
    .bind(inputs.rapido_earnings)
    .bind(inputs.rapido_cash)
    .bind(inputs.offline_earnings)
    .bind(inputs.offline_cash)
    .bind(calc.total_earnings)
    .bind(calc.total_commission)
    .bind(calc.fuel_cost)
    .bind(inputs.other_expenses)
    .bind(calc.total_cash)
    .bind(inputs.online_payment)
    .bind(calc.net_earnings)
    .bind(calc.driver_salary)
    .bind(calc.cash_in_driver_hand)
    .bind(odometer.start)
    .bind(odometer.end)
    .bind(odometer.total)
    .bind(inputs.driver_took_salary)
    .bind(payload.cash_given_to_cashier)
    .bind(inputs.cash_to_cashier)
    .bind(handling.as_ref())
    .bind(payload.amount_from_cashier)
    .bind(payload.notes.as_deref())
    .execute(&mut *conn)
    .await?
    .last_insert_id();

    for (position, fuel) in inputs.fuel_expenses.iter().enumerate() {
        sqlx::query(
            "INSERT INTO trip_fuel_entries (trip_id, position, amount, description) VALUES (?, ?, ?, ?)",
        )
        .bind(trip_id)
        .bind(position as u32)
        .bind(fuel.amount)
        .bind(&fuel.description)
        .execute(&mut *conn)
        .await?;
    }

    Ok(trip_id)
}

/// Records a trip and applies it to the driver's running totals.
#[utoipa::path(
    post,
    path = "/api/trips",
    request_body = CreateTrip,
    responses(
        (status = 201, description = "Trip recorded", body = Object),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Driver not found")
    ),
    tag = "Trips"
)]
#[instrument(skip(pool, payload))]
pub async fn create_trip(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTrip>,
) -> ApiResult<HttpResponse> {
    let (driver_id, trip_date, odometer) = payload.validate().map_err(ApiError::BadRequest)?;

    let driver = find_driver(pool.get_ref(), driver_id)
        .await
        .map_err(db_error("Failed to create trip"))?
        .ok_or_else(|| ApiError::not_found("Driver not found"))?;

    let calc = calculate_trip(&payload.inputs, driver.commission_percentage);
    let handling = payload.negative_handling.unwrap_or_default();
    let delta = calc.driver_delta(payload.inputs.driver_took_salary, handling);
    debug!(?calc, ?handling, "Trip reconciled");

    let mut tx = pool.begin().await.map_err(db_error("Failed to create trip"))?;

    let trip_id = insert_trip(&mut tx, &driver, trip_date, odometer, &payload, &calc, handling)
        .await
        .map_err(db_error("Failed to create trip"))?;

    if handling == NegativeCashHandling::Cashier && payload.amount_from_cashier > 0.0 {
        let withdrawal = TransactionType::Withdrawal;
        sqlx::query(
            r#"
            INSERT INTO cashier_transactions
                (transaction_type, amount, description, cashier_name, owner_authenticated, transaction_date)
            VALUES (?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(withdrawal.as_ref())
        .bind(payload.amount_from_cashier)
        .bind(format!("Cash deficit covered for trip - Driver: {}", driver.name))
        .bind(SYSTEM_CASHIER)
        .bind(trip_date)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to record cashier withdrawal"))?;

        adjust_cash_balance(&mut tx, withdrawal.signed(payload.amount_from_cashier))
            .await
            .map_err(db_error("Failed to update cash balance"))?;
    }

    sqlx::query(
        r#"
        UPDATE drivers
        SET total_earnings = total_earnings + ?,
            total_salary_paid = total_salary_paid + ?,
            pending_salary = pending_salary + ?
        WHERE id = ?
        "#,
    )
    .bind(delta.earnings)
    .bind(delta.salary_paid)
    .bind(delta.pending_salary)
    .bind(driver.id)
    .execute(&mut *tx)
    .await
    .map_err(db_error("Failed to update driver totals"))?;

    tx.commit().await.map_err(db_error("Failed to create trip"))?;

    let trip = fetch_trip(pool.get_ref(), trip_id).await?;
    info!(trip_id, driver_id, "Trip created");
    Ok(HttpResponse::Created().json(json!({ "trip": trip })))
}

async fn fetch_trip(pool: &MySqlPool, id: u64) -> ApiResult<TripView> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error("Failed to fetch trip"))?
        .ok_or_else(|| ApiError::not_found("Trip not found"))?;

    trip_views(pool, vec![trip])
        .await
        .map_err(db_error("Failed to fetch trip"))?
        .pop()
        .ok_or_else(|| ApiError::not_found("Trip not found"))
}

#[utoipa::path(
    get,
    path = "/api/trips",
    params(TripQuery),
    responses(
        (status = 200, description = "Trips, newest first", body = Object, example = json!({
            "trips": [], "totalTrips": 0, "currentPage": 1, "totalPages": 0
        })),
        (status = 400, description = "Bad page or limit")
    ),
    tag = "Trips"
)]
#[instrument(skip(pool))]
pub async fn list_trips(
    pool: web::Data<MySqlPool>,
    query: web::Query<TripQuery>,
) -> ApiResult<HttpResponse> {
    let page = Page::from_query(query.page, query.limit)?;

    let filter = Filter::new()
        .and_opt("driver_id = ", query.driver_id.map(SqlValue::U64))
        .and_opt(
            "platform = ",
            query.platform.map(|p| SqlValue::Str(p.to_string())),
        )
        .and_opt("trip_date = ", query.date.map(SqlValue::Date));

    let total = count(pool.get_ref(), "trips", &filter)
        .await
        .map_err(db_error("Failed to fetch trips"))?;

    let mut qb = filter.select("*", "trips");
    qb.push(" ORDER BY trip_date DESC, created_at DESC, id DESC LIMIT ")
        .push_bind(u64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(page.offset());

    let trips = qb
        .build_query_as::<Trip>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error("Failed to fetch trips"))?;

    let trips = trip_views(pool.get_ref(), trips)
        .await
        .map_err(db_error("Failed to fetch trips"))?;

    Ok(HttpResponse::Ok().json(json!({
        "trips": trips,
        "totalTrips": total,
        "currentPage": page.page,
        "totalPages": page.total_pages(total),
    })))
}

#[utoipa::path(
    get,
    path = "/api/trips/{id}",
    params(("id" = u64, Path, description = "Trip id")),
    responses(
        (status = 200, description = "Trip with fuel entries", body = Object),
        (status = 404, description = "Trip not found")
    ),
    tag = "Trips"
)]
#[instrument(skip(pool))]
pub async fn get_trip(pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let trip = fetch_trip(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "trip": trip })))
}

/// Live figures for the trip form. Nothing is written.
#[utoipa::path(
    post,
    path = "/api/trips/preview",
    request_body = PreviewTrip,
    responses(
        (status = 200, description = "Reconciled figures", body = Object),
        (status = 400, description = "Invalid amounts or no commission source"),
        (status = 404, description = "Driver not found")
    ),
    tag = "Trips"
)]
#[instrument(skip(pool, payload))]
pub async fn preview_trip(
    pool: web::Data<MySqlPool>,
    payload: web::Json<PreviewTrip>,
) -> ApiResult<HttpResponse> {
    payload.inputs.validate().map_err(ApiError::BadRequest)?;

    let pct = match (payload.commission_percentage, payload.driver_id) {
        (Some(pct), _) => pct,
        (None, Some(driver_id)) => {
            find_driver(pool.get_ref(), driver_id)
                .await
                .map_err(db_error("Failed to fetch driver"))?
                .ok_or_else(|| ApiError::not_found("Driver not found"))?
                .commission_percentage
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "Commission percentage or driver ID is required",
            ));
        }
    };
    if !valid_commission(pct) {
        return Err(ApiError::bad_request(
            "Commission percentage must be between 0 and 100",
        ));
    }

    let calc = calculate_trip(&payload.inputs, pct);
    Ok(HttpResponse::Ok().json(json!({
        "calculation": calc,
        "shortfall": calc.shortfall(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::lazy_pool;
    use actix_web::{App, http::StatusCode, test as atest};

    fn parse(body: serde_json::Value) -> CreateTrip {
        serde_json::from_value(body).unwrap()
    }

    macro_rules! trip_app {
        () => {
            atest::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .route("/trips", web::post().to(create_trip))
                    .route("/trips/preview", web::post().to(preview_trip)),
            )
            .await
        };
    }

    #[test]
    fn form_fields_and_legacy_alias_deserialize() {
        let trip = parse(json!({
            "driverId": 2,
            "tripDate": "2026-03-14",
            "uberEarnings": 900,
            "negativeHandlingOption": "cashier",
            "amountFromCashier": 150
        }));
        assert_eq!(trip.driver_id, Some(2));
        assert_eq!(trip.inputs.uber_earnings, 900.0);
        assert_eq!(trip.negative_handling, Some(NegativeCashHandling::Cashier));
        assert_eq!(trip.platform, None);
    }

    #[test]
    fn driver_and_date_are_required() {
        let trip = parse(json!({"driverId": 2}));
        assert_eq!(
            trip.validate().unwrap_err(),
            "Driver ID and trip date are required"
        );
    }

    #[test]
    fn odometer_total_is_derived() {
        let trip = parse(json!({
            "driverId": 2, "tripDate": "2026-03-14", "startKm": 1200, "endKm": 1350.5
        }));
        let (_, _, odometer) = trip.validate().unwrap();
        assert_eq!(odometer.total, Some(150.5));

        let explicit = parse(json!({
            "driverId": 2, "tripDate": "2026-03-14", "startKm": 1200, "endKm": 1350, "totalKm": 140
        }));
        assert_eq!(explicit.validate().unwrap().2.total, Some(140.0));
    }

    #[test]
    fn odometer_must_not_run_backwards() {
        let trip = parse(json!({
            "driverId": 2, "tripDate": "2026-03-14", "startKm": 1350, "endKm": 1200
        }));
        assert_eq!(
            trip.validate().unwrap_err(),
            "End km cannot be less than start km"
        );
    }

    #[actix_web::test]
    async fn create_rejects_negative_amounts_before_touching_db() {
        let app = trip_app!();
        let req = atest::TestRequest::post()
            .uri("/trips")
            .set_json(json!({"driverId": 1, "tripDate": "2026-03-14", "fuelExpenses": [{"amount": -5}]}))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "fuelExpenses must be a non-negative amount");
    }

    #[actix_web::test]
    async fn preview_with_explicit_commission() {
        let app = trip_app!();
        let req = atest::TestRequest::post()
            .uri("/trips/preview")
            .set_json(json!({
                "commissionPercentage": 30,
                "uberEarnings": 1117,
                "uberCash": 500,
                "hasUberCommission": true,
                "driverTookSalary": true
            }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["calculation"]["netEarnings"], 1000.0);
        assert_eq!(body["calculation"]["driverSalary"], 300.0);
        assert_eq!(body["calculation"]["cashInDriverHand"], 200.0);
        assert_eq!(body["shortfall"], 0.0);
    }

    #[actix_web::test]
    async fn preview_needs_a_commission_source() {
        let app = trip_app!();
        let req = atest::TestRequest::post()
            .uri("/trips/preview")
            .set_json(json!({"uberEarnings": 100}))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
