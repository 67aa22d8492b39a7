use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::platform::{Platform, PlatformAmounts};

/// What the submitter chose to do when cash in the driver's hand came out
/// negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
    AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NegativeCashHandling {
    /// Shortfall is added to the salary the driver took.
    Salary,
    /// Shortfall is covered by a cashier withdrawal.
    Cashier,
    #[default]
    None,
}

/// A row of `trips`. Immutable once written.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Trip {
    pub id: u64,
    pub driver_id: u64,
    pub driver_name: String,
    pub platform: String,
    pub trip_date: NaiveDate,

    pub uber_earnings: f64,
    pub uber_cash: f64,
    pub uber_commission: f64,
    pub indrive_earnings: f64,
    pub indrive_cash: f64,
    pub yatri_earnings: f64,
    pub yatri_cash: f64,
    pub yatri_trips: u32,
    pub yatri_commission: f64,
    pub rapido_earnings: f64,
    pub rapido_cash: f64,
    pub offline_earnings: f64,
    pub offline_cash: f64,

    pub trip_amount: f64,
    pub commission_amount: f64,
    pub fuel_cost: f64,
    pub other_expenses: f64,
    pub cash_collected: f64,
    pub online_payment: f64,
    pub net_amount: f64,
    pub driver_salary: f64,
    pub cash_in_driver_hand: f64,

    pub start_km: Option<f64>,
    pub end_km: Option<f64>,
    pub total_km: Option<f64>,

    pub driver_took_salary: bool,
    pub cash_given_to_cashier: bool,
    pub cash_to_cashier: f64,
    pub negative_handling: String,
    pub amount_from_cashier: f64,
    pub notes: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Trip {
    pub fn platform(&self) -> Option<Platform> {
        Platform::from_str(&self.platform).ok()
    }

    /// Gross minus platform commission.
    pub fn net_earnings(&self) -> f64 {
        self.trip_amount - self.commission_amount
    }

    pub fn earnings_by_platform(&self) -> PlatformAmounts {
        PlatformAmounts {
            uber: self.uber_earnings,
            indrive: self.indrive_earnings,
            yatri: self.yatri_earnings,
            rapido: self.rapido_earnings,
            offline: self.offline_earnings,
        }
    }

    /// Per-platform earnings less the commission charged by that platform.
    pub fn net_by_platform(&self) -> PlatformAmounts {
        let mut net = self.earnings_by_platform();
        net.uber -= self.uber_commission;
        net.yatri -= self.yatri_commission;
        net
    }

    /// Adds this trip's net earnings into `breakdown`: split by platform for
    /// `multiple` trips, attributed whole otherwise. Unknown labels are skipped.
    pub fn add_net_to(&self, breakdown: &mut PlatformAmounts) {
        match self.platform() {
            Some(Platform::Multiple) => breakdown.merge(&self.net_by_platform()),
            Some(platform) => breakdown.add(platform, self.net_earnings()),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FuelEntry {
    #[serde(skip)]
    pub trip_id: u64,
    pub id: u64,
    pub position: u32,
    #[schema(example = 500.0)]
    pub amount: f64,
    #[schema(example = "CNG refill")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDetail {
    pub earnings: f64,
    pub cash: f64,
    pub commission: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trips: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlatformDetails {
    pub uber: PlatformDetail,
    pub indrive: PlatformDetail,
    pub yatri: PlatformDetail,
    pub rapido: PlatformDetail,
    pub offline: PlatformDetail,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommissionDetails {
    pub uber: f64,
    pub yatri: f64,
    pub total: f64,
}

/// Trip as the front end reads it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub id: u64,
    pub driver_id: u64,
    pub driver_name: String,
    pub platform: String,
    #[schema(value_type = String, format = "date")]
    pub trip_date: NaiveDate,
    pub trip_amount: f64,
    pub commission_amount: f64,
    pub fuel_cost: f64,
    pub other_expenses: f64,
    pub cash_collected: f64,
    pub online_payment: f64,
    pub net_amount: f64,
    pub cash_in_hand: f64,
    pub cash_in_driver_hand: f64,
    pub driver_salary: f64,
    pub start_km: Option<f64>,
    pub end_km: Option<f64>,
    pub total_km: Option<f64>,
    pub driver_took_salary: bool,
    pub cash_given_to_cashier: bool,
    pub cash_to_cashier: f64,
    pub negative_handling: String,
    pub amount_from_cashier: f64,
    pub notes: Option<String>,
    pub platform_details: PlatformDetails,
    pub commission_details: CommissionDetails,
    pub fuel_entries: Vec<FuelEntry>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl TripView {
    pub fn new(trip: Trip, fuel_entries: Vec<FuelEntry>) -> Self {
        let detail = |earnings: f64, cash: f64, commission: f64| PlatformDetail {
            earnings,
            cash,
            commission,
            trips: None,
        };

        let platform_details = PlatformDetails {
            uber: detail(trip.uber_earnings, trip.uber_cash, trip.uber_commission),
            indrive: detail(trip.indrive_earnings, trip.indrive_cash, 0.0),
            yatri: PlatformDetail {
                trips: Some(trip.yatri_trips),
                ..detail(trip.yatri_earnings, trip.yatri_cash, trip.yatri_commission)
            },
            rapido: detail(trip.rapido_earnings, trip.rapido_cash, 0.0),
            offline: detail(trip.offline_earnings, trip.offline_cash, 0.0),
        };

        let commission_details = CommissionDetails {
            uber: trip.uber_commission,
            yatri: trip.yatri_commission,
            total: trip.commission_amount,
        };

        Self {
            id: trip.id,
            driver_id: trip.driver_id,
            driver_name: trip.driver_name,
            platform: trip.platform,
            trip_date: trip.trip_date,
            trip_amount: trip.trip_amount,
            commission_amount: trip.commission_amount,
            fuel_cost: trip.fuel_cost,
            other_expenses: trip.other_expenses,
            cash_collected: trip.cash_collected,
            online_payment: trip.online_payment,
            net_amount: trip.net_amount,
            cash_in_hand: trip.cash_in_driver_hand,
            cash_in_driver_hand: trip.cash_in_driver_hand,
            driver_salary: trip.driver_salary,
            start_km: trip.start_km,
            end_km: trip.end_km,
            total_km: trip.total_km,
            driver_took_salary: trip.driver_took_salary,
            cash_given_to_cashier: trip.cash_given_to_cashier,
            cash_to_cashier: trip.cash_to_cashier,
            negative_handling: trip.negative_handling,
            amount_from_cashier: trip.amount_from_cashier,
            notes: trip.notes,
            platform_details,
            commission_details,
            fuel_entries,
            created_at: trip.created_at,
        }
    }
}
