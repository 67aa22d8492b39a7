//! Shareable plain-text driver report, formatted for WhatsApp.

use std::fmt;

use chrono::NaiveDate;

use super::ledger::DriverSummary;
use super::reconciliation::salary_share;
use crate::model::{platform::Platform, trip::Trip};

const RECENT_TRIPS: usize = 5;

/// Rupee amount with Indian digit grouping, e.g. `₹12,34,567.50`.
pub fn format_rupees(amount: f64) -> String {
    let sign = if amount < -0.005 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{sign}₹{}.{fraction}", group_indian(whole))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while head.len() > 2 {
        let (rest, group) = head.split_at(head.len() - 2);
        groups.push(group);
        head = rest;
    }
    if !head.is_empty() {
        groups.push(head);
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub struct DriverReport<'a> {
    pub summary: &'a DriverSummary,
    /// Newest first.
    pub trips: &'a [Trip],
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl DriverReport<'_> {
    fn trip_label(trip: &Trip) -> String {
        match trip.platform() {
            Some(Platform::Multiple) => {
                let earnings = trip.earnings_by_platform();
                let parts: Vec<String> = Platform::EARNING
                    .iter()
                    .filter(|p| earnings.get(**p) != 0.0)
                    .map(|p| format!("{}: ₹{}", p.label(), earnings.get(*p)))
                    .collect();
                if parts.is_empty() {
                    "Multiple Platforms".to_string()
                } else {
                    parts.join(", ")
                }
            }
            Some(platform) => platform.label().to_string(),
            None => trip.platform.clone(),
        }
    }
}

impl fmt::Display for DriverReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;
        let gross: f64 = self.trips.iter().map(|t| t.trip_amount).sum();
        let commissions: f64 = self.trips.iter().map(|t| t.commission_amount).sum();
        let expenses: f64 = self.trips.iter().map(|t| t.fuel_cost + t.other_expenses).sum();
        let cash: f64 = self.trips.iter().map(|t| t.cash_collected).sum();
        let online: f64 = self.trips.iter().map(|t| t.online_payment).sum();
        let net = gross - commissions;
        let rate = s.commission_percentage;

        write!(f, "🚗 *Fleet Management Report*")?;
        if let Some((from, to)) = self.range {
            write!(f, " ({} - {})", short_date(from), short_date(to))?;
        }
        writeln!(f)?;
        writeln!(f)?;

        writeln!(f, "👤 *Driver:* {}", s.name)?;
        writeln!(f, "💼 *Commission Rate:* {rate}%")?;
        writeln!(f)?;

        writeln!(f, "📊 *Financial Summary:*")?;
        writeln!(f, "💰 Gross Earnings: ₹{gross:.2}")?;
        writeln!(f, "📉 Platform Commissions: -₹{commissions:.2}")?;
        writeln!(f, "✅ Net Earnings: ₹{net:.2}")?;
        writeln!(f, "💵 Driver Salary ({rate}%): ₹{:.2}", salary_share(net, rate))?;
        writeln!(f, "🔄 Salary Paid: ₹{:.2}", s.salary_paid)?;
        writeln!(f, "⏳ Pending Salary: ₹{:.2}", s.pending_salary)?;
        writeln!(f, "🚕 Total Trips: {}", s.total_trips)?;
        writeln!(f)?;

        let b = &s.platform_breakdown;
        writeln!(f, "🏢 *Platform Breakdown (Net Earnings):*")?;
        writeln!(f, "🟡 Uber: ₹{:.2}", b.uber)?;
        writeln!(f, "🔵 InDrive: ₹{:.2}", b.indrive)?;
        writeln!(f, "🟢 Yatri: ₹{:.2}", b.yatri)?;
        writeln!(f, "🟠 Rapido: ₹{:.2}", b.rapido)?;
        writeln!(f, "⚫ Offline: ₹{:.2}", b.offline)?;
        writeln!(f)?;

        if expenses > 0.0 || cash > 0.0 {
            writeln!(f, "💼 *Cash Flow:*")?;
            writeln!(f, "💴 Cash Collected: ₹{cash:.2}")?;
            writeln!(f, "💳 Online Payments: ₹{online:.2}")?;
            if expenses > 0.0 {
                writeln!(f, "⛽ Total Expenses: ₹{expenses:.2}")?;
            }
            writeln!(f)?;
        }

        if !self.trips.is_empty() {
            writeln!(f, "📋 *Recent Trips:*")?;
            for (index, trip) in self.trips.iter().take(RECENT_TRIPS).enumerate() {
                writeln!(
                    f,
                    "{}. {} - Total: ₹{} ({})",
                    index + 1,
                    Self::trip_label(trip),
                    trip.trip_amount,
                    short_date(trip.trip_date)
                )?;
            }
            writeln!(f)?;
        }

        write!(f, "📱 Generated by Fleet Management System")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::fixtures::{day, driver, trip};
    use crate::finance::ledger::driver_summary;

    #[test]
    fn rupees_use_indian_grouping() {
        assert_eq!(format_rupees(0.0), "₹0.00");
        assert_eq!(format_rupees(999.5), "₹999.50");
        assert_eq!(format_rupees(5_250.0), "₹5,250.00");
        assert_eq!(format_rupees(1_234_567.5), "₹12,34,567.50");
        assert_eq!(format_rupees(-12_000.0), "-₹12,000.00");
    }

    #[test]
    fn report_lists_totals_and_recent_trips() {
        let d = driver(2, "Preetam", 35.0);
        let mut multi = trip(2, Platform::Multiple, 1500.0, 117.0);
        multi.uber_earnings = 1000.0;
        multi.uber_commission = 117.0;
        multi.rapido_earnings = 500.0;
        multi.fuel_cost = 300.0;
        multi.cash_collected = 700.0;
        let trips = vec![multi];
        let summary = driver_summary(&d, &trips, &[]);

        let text = DriverReport {
            summary: &summary,
            trips: &trips,
            range: Some((day(2026, 3, 1), day(2026, 3, 31))),
        }
        .to_string();

        assert!(text.starts_with("🚗 *Fleet Management Report* (01/03/2026 - 31/03/2026)\n"));
        assert!(text.contains("💼 *Commission Rate:* 35%"));
        assert!(text.contains("💰 Gross Earnings: ₹1500.00"));
        assert!(text.contains("📉 Platform Commissions: -₹117.00"));
        assert!(text.contains("✅ Net Earnings: ₹1383.00"));
        assert!(text.contains("💵 Driver Salary (35%): ₹484.05"));
        assert!(text.contains("⛽ Total Expenses: ₹300.00"));
        assert!(text.contains("1. Uber: ₹1000, Rapido: ₹500 - Total: ₹1500 (01/03/2026)"));
        assert!(text.ends_with("📱 Generated by Fleet Management System"));
    }

    #[test]
    fn report_without_trips_skips_cash_flow() {
        let d = driver(3, "Vivek Bali", 30.0);
        let summary = driver_summary(&d, &[], &[]);
        let text = DriverReport {
            summary: &summary,
            trips: &[],
            range: None,
        }
        .to_string();

        assert!(text.starts_with("🚗 *Fleet Management Report*\n\n"));
        assert!(!text.contains("Cash Flow"));
        assert!(!text.contains("Recent Trips"));
        assert!(text.contains("🚕 Total Trips: 0"));
    }
}
