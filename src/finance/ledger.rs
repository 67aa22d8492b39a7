//! Per-driver fold over trips and salary payments. Every dashboard builds on
//! this so earnings, salary and pending figures agree across views.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::reconciliation::salary_share;
use crate::model::{
    driver::Driver, platform::PlatformAmounts, salary::SalaryPayment, trip::Trip,
};

/// Owed minus paid, never below zero.
pub fn pending(earned: f64, paid: f64) -> f64 {
    (earned - paid).max(0.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverLedger {
    pub trips: usize,
    /// Net of platform commission.
    pub earnings: f64,
    pub salary_earned: f64,
    pub salary_paid_on_trips: f64,
    pub salary_payments: f64,
    pub fuel: f64,
    pub other_expenses: f64,
    pub online_payments: f64,
    pub cash_collected: f64,
    pub cash_in_hand: f64,
    pub platform: PlatformAmounts,
    pub last_trip_date: Option<NaiveDate>,
}

impl DriverLedger {
    /// Only trips and payments belonging to `driver_id` are counted.
    pub fn fold<'a>(
        driver_id: u64,
        commission_percentage: f64,
        trips: impl IntoIterator<Item = &'a Trip>,
        payments: impl IntoIterator<Item = &'a SalaryPayment>,
    ) -> Self {
        let mut ledger = DriverLedger::default();

        for trip in trips.into_iter().filter(|t| t.driver_id == driver_id) {
            let net = trip.net_earnings();
            ledger.trips += 1;
            ledger.earnings += net;
            ledger.salary_earned += salary_share(net, commission_percentage);
            ledger.salary_paid_on_trips += trip.driver_salary;
            ledger.fuel += trip.fuel_cost;
            ledger.other_expenses += trip.other_expenses;
            ledger.online_payments += trip.online_payment;
            ledger.cash_collected += trip.cash_collected;
            ledger.cash_in_hand += trip.cash_in_driver_hand;
            trip.add_net_to(&mut ledger.platform);
            ledger.last_trip_date = ledger.last_trip_date.max(Some(trip.trip_date));
        }

        ledger.salary_payments = payments
            .into_iter()
            .filter(|p| p.driver_id == driver_id)
            .map(|p| p.amount)
            .sum();

        ledger
    }

    pub fn for_driver<'a>(
        driver: &Driver,
        trips: impl IntoIterator<Item = &'a Trip>,
        payments: impl IntoIterator<Item = &'a SalaryPayment>,
    ) -> Self {
        Self::fold(driver.id, driver.commission_percentage, trips, payments)
    }

    pub fn salary_paid(&self) -> f64 {
        self.salary_paid_on_trips + self.salary_payments
    }

    pub fn pending_salary(&self) -> f64 {
        pending(self.salary_earned, self.salary_paid())
    }

    /// Fuel plus other running costs.
    pub fn expenses(&self) -> f64 {
        self.fuel + self.other_expenses
    }

    pub fn average_per_trip(&self) -> f64 {
        if self.trips == 0 {
            0.0
        } else {
            self.earnings / self.trips as f64
        }
    }

    /// Average net per trip against a ₹1000 benchmark, capped at 100.
    pub fn efficiency(&self) -> f64 {
        if self.trips == 0 {
            0.0
        } else {
            (self.average_per_trip() / 1000.0 * 100.0).min(100.0)
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub driver_id: u64,
    pub name: String,
    pub total_earnings: f64,
    /// Salary earned over the window.
    pub total_salary: f64,
    pub salary_paid: f64,
    pub pending_salary: f64,
    pub commission_percentage: f64,
    pub platform_breakdown: PlatformAmounts,
    pub total_trips: usize,
}

pub fn driver_summary(driver: &Driver, trips: &[Trip], payments: &[SalaryPayment]) -> DriverSummary {
    let ledger = DriverLedger::for_driver(driver, trips, payments);
    DriverSummary {
        driver_id: driver.id,
        name: driver.name.clone(),
        total_earnings: ledger.earnings,
        total_salary: ledger.salary_earned,
        salary_paid: ledger.salary_paid(),
        pending_salary: ledger.pending_salary(),
        commission_percentage: driver.commission_percentage,
        platform_breakdown: ledger.platform,
        total_trips: ledger.trips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::fixtures::{NO_PAYMENTS, close, driver, payment, trip};
    use crate::model::platform::Platform;

    #[test]
    fn pending_never_negative() {
        assert_eq!(pending(100.0, 250.0), 0.0);
        assert_eq!(pending(300.0, 250.0), 50.0);
    }

    #[test]
    fn folds_only_the_drivers_records() {
        let trips = vec![
            trip(1, Platform::Uber, 1000.0, 117.0),
            trip(2, Platform::Uber, 5000.0, 0.0),
            trip(1, Platform::Rapido, 500.0, 0.0),
        ];
        let payments = vec![payment(1, 100.0), payment(2, 900.0)];

        let ledger = DriverLedger::fold(1, 30.0, &trips, &payments);

        assert_eq!(ledger.trips, 2);
        close(ledger.earnings, 1383.0);
        close(ledger.salary_earned, 1383.0 * 0.3);
        close(ledger.salary_payments, 100.0);
        close(ledger.pending_salary(), 1383.0 * 0.3 - 100.0);
        close(ledger.platform.uber, 883.0);
        close(ledger.platform.rapido, 500.0);
    }

    #[test]
    fn salary_taken_on_trips_counts_as_paid() {
        let mut t = trip(1, Platform::Offline, 1000.0, 0.0);
        t.driver_salary = 350.0;
        t.driver_took_salary = true;

        let ledger = DriverLedger::fold(1, 35.0, [&t], NO_PAYMENTS);
        close(ledger.salary_paid(), 350.0);
        close(ledger.pending_salary(), 0.0);
    }

    #[test]
    fn overpaid_driver_has_zero_pending() {
        let trips = vec![trip(1, Platform::Uber, 1000.0, 0.0)];
        let payments = vec![payment(1, 5000.0)];
        let ledger = DriverLedger::fold(1, 30.0, &trips, &payments);
        close(ledger.pending_salary(), 0.0);
    }

    #[test]
    fn efficiency_is_capped() {
        let trips = vec![trip(1, Platform::Uber, 2500.0, 0.0)];
        let ledger = DriverLedger::fold(1, 30.0, &trips, NO_PAYMENTS);
        close(ledger.efficiency(), 100.0);

        let trips = vec![trip(1, Platform::Uber, 400.0, 0.0)];
        let ledger = DriverLedger::fold(1, 30.0, &trips, NO_PAYMENTS);
        close(ledger.efficiency(), 40.0);

        close(DriverLedger::default().efficiency(), 0.0);
    }

    #[test]
    fn tracks_latest_trip_date() {
        let mut a = trip(1, Platform::Uber, 100.0, 0.0);
        a.trip_date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut b = trip(1, Platform::Uber, 100.0, 0.0);
        b.trip_date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        let ledger = DriverLedger::fold(1, 30.0, [&b, &a], NO_PAYMENTS);
        assert_eq!(ledger.last_trip_date, NaiveDate::from_ymd_opt(2026, 3, 9));
    }

    #[test]
    fn summary_breakdown_sums_to_earnings() {
        let d = driver(4, "Chhotelal", 35.0);
        let mut multi = trip(4, Platform::Multiple, 0.0, 0.0);
        multi.uber_earnings = 600.0;
        multi.uber_commission = 117.0;
        multi.indrive_earnings = 300.0;
        multi.trip_amount = 900.0;
        multi.commission_amount = 117.0;
        let trips = vec![multi, trip(4, Platform::Yatri, 400.0, 20.0)];

        let summary = driver_summary(&d, &trips, &[]);
        assert_eq!(summary.total_trips, 2);
        close(summary.platform_breakdown.total(), summary.total_earnings);
        close(summary.total_salary, summary.total_earnings * 0.35);
    }
}
