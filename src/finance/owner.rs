//! Owner dashboard: fleet-wide money position, per-driver status and an
//! activity feed for the selected window.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use super::ledger::DriverLedger;
use super::risk::{RiskFactor, RiskKind, Severity, pending_salary_severity};
use crate::model::{
    cashier::{CashierTransaction, TransactionType},
    driver::Driver,
    platform::PlatformAmounts,
    salary::SalaryPayment,
    trip::Trip,
};

const LOW_MARGIN: f64 = 10.0;
const VERY_LOW_MARGIN: f64 = 5.0;
const FUEL_RATIO_ALERT: f64 = 30.0;
const FUEL_RATIO_HIGH: f64 = 40.0;

const RECENT_TRIPS: usize = 10;
const RECENT_SALARIES: usize = 5;
const RECENT_CASHIER: usize = 5;
const RECENT_TOTAL: usize = 15;

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    /// Pending salary needs attention.
    Alert,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDriverSummary {
    pub driver_id: u64,
    pub name: String,
    pub total_earnings: f64,
    pub pending_salary: f64,
    pub total_trips: usize,
    pub efficiency: f64,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_trip_date: Option<NaiveDate>,
    pub status: DriverStatus,
}

impl OwnerDriverSummary {
    fn new(driver: &Driver, ledger: &DriverLedger) -> Self {
        let pending_salary = ledger.pending_salary();
        let status = if pending_salary_severity(pending_salary).is_some() {
            DriverStatus::Alert
        } else if ledger.trips > 0 {
            DriverStatus::Active
        } else {
            DriverStatus::Inactive
        };
        Self {
            driver_id: driver.id,
            name: driver.name.clone(),
            total_earnings: ledger.earnings,
            pending_salary,
            total_trips: ledger.trips,
            efficiency: ledger.efficiency(),
            last_trip_date: ledger.last_trip_date,
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Trip,
    Salary,
    /// Cashier deposit.
    Collection,
    /// Cashier withdrawal.
    Expense,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub amount: f64,
    pub description: String,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerMetrics {
    pub total_revenue: f64,
    /// Fuel and other running costs.
    pub total_expenses: f64,
    pub net_profit: f64,
    pub profit_margin: f64,

    pub total_cash_in_hand: f64,
    pub cashier_balance: f64,
    pub total_cash_flow: f64,
    pub pending_collections: f64,

    pub total_pending_salaries: f64,
    pub total_drivers: usize,
    pub active_drivers: usize,
    pub total_trips_today: usize,

    pub total_fuel_costs: f64,
    pub total_commissions: f64,
    pub average_revenue_per_trip: f64,
    pub fuel_cost_ratio: f64,

    pub top_performing_driver: String,
    /// `none` when no platform earned anything.
    pub most_profitable_platform: String,
    pub daily_target: f64,
    pub target_achievement: f64,

    pub platform_revenue: PlatformAmounts,
    pub driver_summaries: Vec<OwnerDriverSummary>,
    pub risk_factors: Vec<RiskFactor>,
    pub recent_transactions: Vec<Activity>,
}

/// Everything in the window the owner dashboard reads.
pub struct OwnerInputs<'a> {
    /// Active drivers.
    pub drivers: &'a [Driver],
    /// Newest first.
    pub trips: &'a [Trip],
    pub payments: &'a [SalaryPayment],
    /// Newest first.
    pub cashier: &'a [CashierTransaction],
    pub cash_balance: f64,
    pub daily_target: f64,
}

pub fn owner_metrics(inputs: &OwnerInputs<'_>) -> OwnerMetrics {
    let trips = inputs.trips;

    let mut revenue = 0.0;
    let mut expenses = 0.0;
    let mut fuel = 0.0;
    let mut commissions = 0.0;
    let mut cash_in_hand = 0.0;
    let mut platform_revenue = PlatformAmounts::default();
    for trip in trips {
        revenue += trip.net_earnings();
        expenses += trip.fuel_cost + trip.other_expenses;
        fuel += trip.fuel_cost;
        commissions += trip.commission_amount;
        cash_in_hand += trip.cash_in_driver_hand;
        trip.add_net_to(&mut platform_revenue);
    }

    let mut driver_summaries: Vec<OwnerDriverSummary> = inputs
        .drivers
        .iter()
        .map(|d| OwnerDriverSummary::new(d, &DriverLedger::for_driver(d, trips, inputs.payments)))
        .collect();
    let pending: f64 = driver_summaries.iter().map(|d| d.pending_salary).sum();

    let net_profit = revenue - expenses - pending;
    let profit_margin = percent_of(net_profit, revenue);
    let fuel_cost_ratio = percent_of(fuel, revenue);

    let top_performing_driver = driver_summaries
        .iter()
        .fold(None::<&OwnerDriverSummary>, |best, d| match best {
            Some(b) if b.total_earnings >= d.total_earnings => Some(b),
            _ => Some(d),
        })
        .map(|d| d.name.clone())
        .unwrap_or_default();

    let most_profitable_platform = platform_revenue
        .top()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".to_string());

    // Drivers on alert are not counted as active.
    let active_drivers = driver_summaries
        .iter()
        .filter(|d| d.status == DriverStatus::Active)
        .count();
    let risk_factors = risk_factors(&driver_summaries, profit_margin, fuel, fuel_cost_ratio);

    driver_summaries.sort_by(|a, b| b.total_earnings.total_cmp(&a.total_earnings));

    OwnerMetrics {
        total_revenue: revenue,
        total_expenses: expenses,
        net_profit,
        profit_margin,
        total_cash_in_hand: cash_in_hand,
        cashier_balance: inputs.cash_balance,
        total_cash_flow: cash_in_hand + inputs.cash_balance,
        pending_collections: cash_in_hand,
        total_pending_salaries: pending,
        total_drivers: inputs.drivers.len(),
        active_drivers,
        total_trips_today: trips.len(),
        total_fuel_costs: fuel,
        total_commissions: commissions,
        average_revenue_per_trip: if trips.is_empty() {
            0.0
        } else {
            revenue / trips.len() as f64
        },
        fuel_cost_ratio,
        top_performing_driver,
        most_profitable_platform,
        daily_target: inputs.daily_target,
        target_achievement: percent_of(revenue, inputs.daily_target),
        platform_revenue,
        driver_summaries,
        risk_factors,
        recent_transactions: recent_activity(inputs),
    }
}

fn risk_factors(
    drivers: &[OwnerDriverSummary],
    profit_margin: f64,
    fuel: f64,
    fuel_cost_ratio: f64,
) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    for d in drivers {
        if let Some(severity) = pending_salary_severity(d.pending_salary) {
            risks.push(
                RiskFactor::new(
                    RiskKind::HighPendingSalary,
                    severity,
                    format!("{} has high pending salary", d.name),
                )
                .driver(&d.name)
                .amount(d.pending_salary)
                .action("Process salary payment immediately"),
            );
        }
    }

    // An empty window has a margin of 0 and still raises the alarm.
    if profit_margin < LOW_MARGIN {
        risks.push(
            RiskFactor::new(
                RiskKind::LowProfitMargin,
                Severity::escalate(profit_margin < VERY_LOW_MARGIN),
                format!("Low profit margin: {profit_margin:.1}%"),
            )
            .action("Review expenses and optimize operations"),
        );
    }

    if fuel_cost_ratio > FUEL_RATIO_ALERT {
        risks.push(
            RiskFactor::new(
                RiskKind::HighFuelCosts,
                Severity::escalate(fuel_cost_ratio > FUEL_RATIO_HIGH),
                format!("High fuel cost ratio: {fuel_cost_ratio:.1}%"),
            )
            .amount(fuel)
            .action("Optimize routes and fuel efficiency"),
        );
    }

    let inactive = drivers
        .iter()
        .filter(|d| d.status == DriverStatus::Inactive)
        .count();
    if inactive > 0 {
        risks.push(
            RiskFactor::new(
                RiskKind::InactiveDrivers,
                Severity::Low,
                format!("{inactive} driver(s) inactive"),
            )
            .action("Follow up with inactive drivers"),
        );
    }

    risks
}

fn recent_activity(inputs: &OwnerInputs<'_>) -> Vec<Activity> {
    let mut payments: Vec<&SalaryPayment> = inputs.payments.iter().collect();
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let trips = inputs.trips.iter().take(RECENT_TRIPS).map(|t| Activity {
        kind: ActivityKind::Trip,
        amount: t.trip_amount,
        description: format!("Trip completed by {}", t.driver_name),
        timestamp: t.created_at,
        driver: Some(t.driver_name.clone()),
    });
    let salaries = payments.into_iter().take(RECENT_SALARIES).map(|p| Activity {
        kind: ActivityKind::Salary,
        amount: p.amount,
        description: "Salary payment".to_string(),
        timestamp: p.created_at,
        driver: Some(p.driver_name.clone()),
    });
    let cashier = inputs.cashier.iter().take(RECENT_CASHIER).map(|c| Activity {
        kind: match c.transaction_type.parse::<TransactionType>() {
            Ok(TransactionType::Deposit) => ActivityKind::Collection,
            _ => ActivityKind::Expense,
        },
        amount: c.amount,
        description: c.description.clone(),
        timestamp: c.created_at,
        driver: None,
    });

    let mut feed: Vec<Activity> = trips.chain(salaries).chain(cashier).collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(RECENT_TOTAL);
    feed
}
