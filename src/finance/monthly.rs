//! Calendar-month salary rollups.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ledger::pending, reconciliation::salary_share};
use crate::model::{salary::SalaryPayment, trip::Trip};

/// First and last day of a month; `None` for a month outside 1-12.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Months since year 0, so ranges spanning a new year compare correctly.
pub fn month_index(year: u16, month: u8) -> u32 {
    u32::from(year) * 12 + u32::from(month)
}

/// Bucket a payment date falls into.
pub fn bucket_of(date: NaiveDate) -> (u8, u16) {
    (date.month() as u8, date.year().clamp(0, i32::from(u16::MAX)) as u16)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFigures {
    pub total_earnings: f64,
    pub total_salary: f64,
    pub total_paid: f64,
    /// Never negative.
    pub remaining_salary: f64,
    pub payments_count: u32,
}

/// `trips` are the driver's trips dated in the month, `payments` the ones
/// bucketed in it.
pub fn monthly_figures(
    commission_percentage: f64,
    trips: &[Trip],
    payments: &[SalaryPayment],
) -> MonthlyFigures {
    let total_earnings: f64 = trips.iter().map(Trip::net_earnings).sum();
    let total_salary = salary_share(total_earnings, commission_percentage);
    let total_paid: f64 = payments.iter().map(|p| p.amount).sum();

    MonthlyFigures {
        total_earnings,
        total_salary,
        total_paid,
        remaining_salary: pending(total_salary, total_paid),
        payments_count: payments.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::fixtures::{NO_PAYMENTS, close, day, payment, trip};
    use crate::model::platform::Platform;

    #[test]
    fn bounds_cover_whole_month() {
        assert_eq!(
            month_bounds(2026, 2),
            Some((day(2026, 2, 1), day(2026, 2, 28)))
        );
        assert_eq!(
            month_bounds(2026, 12),
            Some((day(2026, 12, 1), day(2026, 12, 31)))
        );
        assert_eq!(month_bounds(2026, 13), None);
        assert_eq!(month_bounds(2026, 0), None);
    }

    #[test]
    fn month_index_orders_across_years() {
        assert!(month_index(2025, 12) < month_index(2026, 1));
        assert_eq!(month_index(2026, 3) - month_index(2025, 11), 4);
    }

    #[test]
    fn bucket_follows_payment_date() {
        assert_eq!(bucket_of(day(2026, 11, 30)), (11, 2026));
    }

    #[test]
    fn salary_from_net_earnings() {
        let trips = [
            trip(1, Platform::Uber, 1117.0, 117.0),
            trip(1, Platform::Rapido, 1000.0, 0.0),
        ];
        let figures = monthly_figures(30.0, &trips, &[payment(1, 200.0)]);
        close(figures.total_earnings, 2000.0);
        close(figures.total_salary, 600.0);
        close(figures.total_paid, 200.0);
        close(figures.remaining_salary, 400.0);
        assert_eq!(figures.payments_count, 1);
    }

    #[test]
    fn overpaid_month_leaves_nothing_remaining() {
        let trips = [trip(1, Platform::Offline, 100.0, 0.0)];
        let figures = monthly_figures(35.0, &trips, &[payment(1, 500.0)]);
        close(figures.remaining_salary, 0.0);

        let empty = monthly_figures(35.0, &[], NO_PAYMENTS);
        close(empty.total_salary, 0.0);
        assert_eq!(empty.payments_count, 0);
    }
}
