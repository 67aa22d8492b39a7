//! Business analytics across the active fleet for a reporting window.

use serde::Serialize;
use utoipa::ToSchema;

use super::ledger::DriverLedger;
use super::report::format_rupees;
use super::risk::{RiskFactor, RiskKind, Severity, pending_salary_severity};
use crate::model::{
    driver::Driver, platform::PlatformAmounts, salary::SalaryPayment, trip::Trip,
};

const LOW_PROFITABILITY: f64 = 10.0;
const VERY_LOW_PROFITABILITY: f64 = 5.0;
/// Profitability is only judged once a driver has more trips than this.
const PROFITABILITY_MIN_TRIPS: usize = 5;
const ONLINE_PAYMENT_ALERT: f64 = 5_000.0;
const ONLINE_PAYMENT_HIGH: f64 = 15_000.0;
const FUEL_RATIO_ALERT: f64 = 25.0;
const FUEL_RATIO_HIGH: f64 = 35.0;
const TOP_PERFORMERS: usize = 3;

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverAnalytics {
    pub driver_id: u64,
    pub name: String,
    pub commission_percentage: f64,
    pub total_trips: usize,
    pub total_earnings: f64,
    pub total_expenses: f64,
    pub total_fuel_cost: f64,
    pub total_online_payments: f64,
    pub total_cash_collected: f64,
    pub total_salary_earned: f64,
    pub total_salary_paid: f64,
    pub pending_salary: f64,
    pub average_earnings_per_trip: f64,
    pub platform_breakdown: PlatformAmounts,
    pub efficiency_score: f64,
    /// Share of earnings left after expenses and salary, in percent.
    pub profitability: f64,
}

impl DriverAnalytics {
    fn new(driver: &Driver, ledger: &DriverLedger) -> Self {
        let profitability = percent_of(
            ledger.earnings - ledger.expenses() - ledger.salary_earned,
            ledger.earnings,
        );
        Self {
            driver_id: driver.id,
            name: driver.name.clone(),
            commission_percentage: driver.commission_percentage,
            total_trips: ledger.trips,
            total_earnings: ledger.earnings,
            total_expenses: ledger.expenses(),
            total_fuel_cost: ledger.fuel,
            total_online_payments: ledger.online_payments,
            total_cash_collected: ledger.cash_collected,
            total_salary_earned: ledger.salary_earned,
            total_salary_paid: ledger.salary_paid(),
            pending_salary: ledger.pending_salary(),
            average_earnings_per_trip: ledger.average_per_trip(),
            platform_breakdown: ledger.platform,
            efficiency_score: ledger.efficiency(),
            profitability,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrendPoint {
    pub month: String,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    pub total_revenue: f64,
    /// Running costs plus salary paid.
    pub total_expenses: f64,
    pub total_fuel_costs: f64,
    pub total_pending_salaries: f64,
    pub total_online_payments: f64,
    pub total_cash_collected: f64,
    pub total_active_drivers: usize,
    pub total_trips: usize,
    pub average_revenue_per_trip: f64,
    pub profit_margin: f64,
    pub cash_flow_status: f64,
    pub cash_balance: f64,
    pub platform_distribution: PlatformAmounts,
    pub monthly_trend: Vec<TrendPoint>,
    pub driver_analytics: Vec<DriverAnalytics>,
    pub top_performers: Vec<DriverAnalytics>,
    pub risk_factors: Vec<RiskFactor>,
}

/// `drivers` are the active drivers; `trips` and `payments` are everything in
/// the window, including records of drivers no longer active.
pub fn business_metrics(
    drivers: &[Driver],
    trips: &[Trip],
    payments: &[SalaryPayment],
    cash_balance: f64,
) -> BusinessMetrics {
    let driver_analytics: Vec<DriverAnalytics> = drivers
        .iter()
        .map(|d| DriverAnalytics::new(d, &DriverLedger::for_driver(d, trips, payments)))
        .collect();

    let mut revenue = 0.0;
    let mut expenses = 0.0;
    let mut fuel = 0.0;
    let mut pending = 0.0;
    let mut online = 0.0;
    let mut cash = 0.0;
    let mut platform_distribution = PlatformAmounts::default();
    for d in &driver_analytics {
        revenue += d.total_earnings;
        expenses += d.total_expenses + d.total_salary_paid;
        fuel += d.total_fuel_cost;
        pending += d.pending_salary;
        online += d.total_online_payments;
        cash += d.total_cash_collected;
        platform_distribution.merge(&d.platform_breakdown);
    }

    let total_trips = trips.len();
    let average_revenue_per_trip = if total_trips > 0 {
        revenue / total_trips as f64
    } else {
        0.0
    };

    let mut top_performers = driver_analytics.clone();
    top_performers.sort_by(|a, b| b.total_earnings.total_cmp(&a.total_earnings));
    top_performers.truncate(TOP_PERFORMERS);

    let risk_factors = risk_factors(&driver_analytics, revenue, fuel);

    BusinessMetrics {
        total_revenue: revenue,
        total_expenses: expenses,
        total_fuel_costs: fuel,
        total_pending_salaries: pending,
        total_online_payments: online,
        total_cash_collected: cash,
        total_active_drivers: drivers.len(),
        total_trips,
        average_revenue_per_trip,
        profit_margin: percent_of(revenue - expenses, revenue),
        cash_flow_status: revenue - expenses - pending,
        cash_balance,
        platform_distribution,
        monthly_trend: vec![TrendPoint {
            month: "Current".to_string(),
            revenue,
            expenses,
            profit: revenue - expenses,
        }],
        driver_analytics,
        top_performers,
        risk_factors,
    }
}

fn risk_factors(drivers: &[DriverAnalytics], revenue: f64, fuel: f64) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    for d in drivers {
        if let Some(severity) = pending_salary_severity(d.pending_salary) {
            risks.push(
                RiskFactor::new(
                    RiskKind::HighPendingSalary,
                    severity,
                    format!(
                        "High pending salary for {}: {}",
                        d.name,
                        format_rupees(d.pending_salary)
                    ),
                )
                .driver(&d.name)
                .amount(d.pending_salary),
            );
        }
    }

    for d in drivers {
        if d.profitability < LOW_PROFITABILITY && d.total_trips > PROFITABILITY_MIN_TRIPS {
            risks.push(
                RiskFactor::new(
                    RiskKind::LowProfitability,
                    Severity::escalate(d.profitability < VERY_LOW_PROFITABILITY),
                    format!("Low profitability for {}: {:.1}%", d.name, d.profitability),
                )
                .driver(&d.name),
            );
        }
    }

    for d in drivers {
        if d.total_online_payments > ONLINE_PAYMENT_ALERT {
            risks.push(
                RiskFactor::new(
                    RiskKind::HighOnlinePayment,
                    Severity::escalate(d.total_online_payments > ONLINE_PAYMENT_HIGH),
                    format!(
                        "{} has {} in online payments - transfer to cashier needed",
                        d.name,
                        format_rupees(d.total_online_payments)
                    ),
                )
                .driver(&d.name)
                .amount(d.total_online_payments),
            );
        }
    }

    let fuel_ratio = percent_of(fuel, revenue);
    if fuel_ratio > FUEL_RATIO_ALERT {
        risks.push(
            RiskFactor::new(
                RiskKind::HighFuelCost,
                Severity::escalate(fuel_ratio > FUEL_RATIO_HIGH),
                format!("High fuel cost ratio: {fuel_ratio:.1}% of total revenue"),
            )
            .amount(fuel),
        );
    }

    for d in drivers.iter().filter(|d| d.total_trips == 0) {
        risks.push(
            RiskFactor::new(
                RiskKind::InactiveDriver,
                Severity::Low,
                format!("{} has no trips in the selected period", d.name),
            )
            .driver(&d.name),
        );
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::fixtures::{close, driver, payment, trip};
    use crate::model::platform::Platform;

    fn kinds(metrics: &BusinessMetrics) -> Vec<RiskKind> {
        metrics.risk_factors.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn totals_fold_every_active_driver() {
        let drivers = vec![driver(1, "Vivek Bali", 30.0), driver(2, "Preetam", 35.0)];
        let mut a = trip(1, Platform::Uber, 1117.0, 117.0);
        a.fuel_cost = 100.0;
        a.online_payment = 200.0;
        a.cash_collected = 800.0;
        let b = trip(2, Platform::Rapido, 2000.0, 0.0);
        let trips = vec![a, b];
        let payments = vec![payment(2, 500.0)];

        let m = business_metrics(&drivers, &trips, &payments, 2500.0);

        close(m.total_revenue, 3000.0);
        close(m.total_fuel_costs, 100.0);
        // 100 fuel for driver 1, 500 paid to driver 2
        close(m.total_expenses, 600.0);
        close(m.total_pending_salaries, 300.0 + (700.0 - 500.0));
        close(m.total_online_payments, 200.0);
        close(m.total_cash_collected, 800.0);
        assert_eq!(m.total_active_drivers, 2);
        assert_eq!(m.total_trips, 2);
        close(m.average_revenue_per_trip, 1500.0);
        close(m.profit_margin, 2400.0 / 3000.0 * 100.0);
        close(m.cash_flow_status, 3000.0 - 600.0 - 500.0);
        close(m.cash_balance, 2500.0);
        close(m.platform_distribution.total(), m.total_revenue);
        assert_eq!(m.monthly_trend.len(), 1);
        assert_eq!(m.monthly_trend[0].month, "Current");
        assert!(kinds(&m).is_empty());
    }

    #[test]
    fn profitability_accounts_for_salary_and_expenses() {
        let drivers = vec![driver(1, "Chhotelal", 35.0)];
        let mut t = trip(1, Platform::Offline, 1000.0, 0.0);
        t.fuel_cost = 150.0;
        t.other_expenses = 50.0;
        let m = business_metrics(&drivers, &[t], &[], 0.0);

        let d = &m.driver_analytics[0];
        close(d.total_expenses, 200.0);
        close(d.total_salary_earned, 350.0);
        close(d.profitability, 45.0);
        close(d.efficiency_score, 100.0);
    }

    #[test]
    fn top_performers_are_sorted_and_capped() {
        let drivers: Vec<_> = (1..=4).map(|i| driver(i, &format!("d{i}"), 30.0)).collect();
        let trips: Vec<_> = (1..=4)
            .map(|i| trip(i, Platform::Uber, 100.0 * i as f64, 0.0))
            .collect();
        let m = business_metrics(&drivers, &trips, &[], 0.0);

        let names: Vec<_> = m.top_performers.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["d4", "d3", "d2"]);
    }

    #[test]
    fn pending_salary_risk_fires_above_five_thousand() {
        let drivers = vec![driver(1, "Vikash Yadav", 50.0)];
        let at_line = vec![trip(1, Platform::Offline, 10_000.0, 0.0)];
        let m = business_metrics(&drivers, &at_line, &[], 0.0);
        assert!(!kinds(&m).contains(&RiskKind::HighPendingSalary));

        let above = vec![trip(1, Platform::Offline, 25_000.0, 0.0)];
        let m = business_metrics(&drivers, &above, &[], 0.0);
        let risk = &m.risk_factors[0];
        assert_eq!(risk.kind, RiskKind::HighPendingSalary);
        assert_eq!(risk.severity, Severity::High);
        assert_eq!(risk.driver.as_deref(), Some("Vikash Yadav"));
        assert_eq!(risk.message, "High pending salary for Vikash Yadav: ₹12,500.00");
    }

    #[test]
    fn low_profitability_needs_more_than_five_trips() {
        let drivers = vec![driver(1, "Preetam", 35.0)];
        let losing = |n: usize| -> Vec<Trip> {
            (0..n)
                .map(|_| {
                    let mut t = trip(1, Platform::Offline, 1000.0, 0.0);
                    t.fuel_cost = 610.0;
                    t
                })
                .collect()
        };

        let m = business_metrics(&drivers, &losing(5), &[], 0.0);
        assert!(!kinds(&m).contains(&RiskKind::LowProfitability));

        let m = business_metrics(&drivers, &losing(6), &[], 0.0);
        let risk = m
            .risk_factors
            .iter()
            .find(|r| r.kind == RiskKind::LowProfitability)
            .unwrap();
        assert_eq!(risk.severity, Severity::High);
        assert_eq!(risk.message, "Low profitability for Preetam: 4.0%");
    }

    #[test]
    fn online_and_fuel_risks() {
        let drivers = vec![driver(1, "Vivek Bali", 1.0)];
        let mut t = trip(1, Platform::Uber, 20_000.0, 0.0);
        t.online_payment = 15_000.5;
        t.fuel_cost = 6_000.0;
        let m = business_metrics(&drivers, &[t], &[], 0.0);

        let online = m
            .risk_factors
            .iter()
            .find(|r| r.kind == RiskKind::HighOnlinePayment)
            .unwrap();
        assert_eq!(online.severity, Severity::High);

        let fuel = m
            .risk_factors
            .iter()
            .find(|r| r.kind == RiskKind::HighFuelCost)
            .unwrap();
        assert_eq!(fuel.severity, Severity::Medium);
        assert_eq!(fuel.amount, Some(6_000.0));
        assert_eq!(fuel.message, "High fuel cost ratio: 30.0% of total revenue");
    }

    #[test]
    fn drivers_without_trips_are_flagged_inactive() {
        let drivers = vec![driver(1, "Vivek Bali", 30.0), driver(2, "Preetam", 35.0)];
        let trips = vec![trip(1, Platform::Uber, 500.0, 0.0)];
        let m = business_metrics(&drivers, &trips, &[], 0.0);

        assert_eq!(kinds(&m), [RiskKind::InactiveDriver]);
        assert_eq!(m.risk_factors[0].severity, Severity::Low);
        assert_eq!(m.risk_factors[0].driver.as_deref(), Some("Preetam"));
    }

    #[test]
    fn empty_window_has_no_division_by_zero() {
        let m = business_metrics(&[], &[], &[], 0.0);
        close(m.average_revenue_per_trip, 0.0);
        close(m.profit_margin, 0.0);
        assert!(m.risk_factors.is_empty());
    }
}
