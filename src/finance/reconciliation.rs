//! Trip-level reconciliation: what the platforms took, what the driver earned
//! and how much cash is still in the driver's hand.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::trip::NegativeCashHandling;

/// Flat fee Uber deducts from a trip record when its commission applies.
pub const UBER_COMMISSION: f64 = 117.0;

/// Yatri charges per completed trip.
pub const YATRI_COMMISSION_PER_TRIP: f64 = 10.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FuelExpense {
    #[schema(example = 500.0)]
    pub amount: f64,
    #[schema(example = "CNG refill")]
    #[serde(default)]
    pub description: String,
}

/// Raw money figures from the trip form. Every field defaults to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TripInputs {
    #[schema(example = 1200.0)]
    pub uber_earnings: f64,
    pub indrive_earnings: f64,
    #[schema(example = 450.0)]
    pub yatri_earnings: f64,
    pub rapido_earnings: f64,
    pub offline_earnings: f64,

    #[schema(example = 300.0)]
    pub uber_cash: f64,
    pub indrive_cash: f64,
    #[schema(example = 450.0)]
    pub yatri_cash: f64,
    pub rapido_cash: f64,
    pub offline_cash: f64,

    pub has_uber_commission: bool,
    #[schema(example = 3)]
    pub yatri_trips: u32,

    pub fuel_expenses: Vec<FuelExpense>,
    pub other_expenses: f64,
    pub online_payment: f64,
    pub cash_to_cashier: f64,

    pub driver_took_salary: bool,
}

impl TripInputs {
    fn amounts(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [
            ("uberEarnings", self.uber_earnings),
            ("indriveEarnings", self.indrive_earnings),
            ("yatriEarnings", self.yatri_earnings),
            ("rapidoEarnings", self.rapido_earnings),
            ("offlineEarnings", self.offline_earnings),
            ("uberCash", self.uber_cash),
            ("indriveCash", self.indrive_cash),
            ("yatriCash", self.yatri_cash),
            ("rapidoCash", self.rapido_cash),
            ("offlineCash", self.offline_cash),
            ("otherExpenses", self.other_expenses),
            ("onlinePayment", self.online_payment),
            ("cashToCashier", self.cash_to_cashier),
        ]
        .into_iter()
        .chain(self.fuel_expenses.iter().map(|f| ("fuelExpenses", f.amount)))
    }

    /// Every amount must be a finite, non-negative number.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in self.amounts() {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} must be a non-negative amount"));
            }
        }
        Ok(())
    }

    pub fn total_earnings(&self) -> f64 {
        self.uber_earnings
            + self.indrive_earnings
            + self.yatri_earnings
            + self.rapido_earnings
            + self.offline_earnings
    }

    pub fn total_cash(&self) -> f64 {
        self.uber_cash + self.indrive_cash + self.yatri_cash + self.rapido_cash + self.offline_cash
    }

    pub fn fuel_cost(&self) -> f64 {
        self.fuel_expenses.iter().map(|f| f.amount).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripCalculation {
    pub total_earnings: f64,
    pub total_cash: f64,
    pub uber_commission: f64,
    pub yatri_commission: f64,
    pub total_commission: f64,
    pub fuel_cost: f64,
    pub net_earnings: f64,
    /// Salary share of this trip whether or not it was taken.
    pub earned_salary: f64,
    /// Salary handed over on the day; zero unless the driver took it.
    pub driver_salary: f64,
    /// May be negative.
    pub cash_in_driver_hand: f64,
}

/// Changes a trip applies to the driver's running totals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriverDelta {
    pub earnings: f64,
    pub salary_paid: f64,
    pub pending_salary: f64,
}

pub fn salary_share(net_earnings: f64, commission_percentage: f64) -> f64 {
    net_earnings * commission_percentage / 100.0
}

pub fn calculate_trip(inputs: &TripInputs, commission_percentage: f64) -> TripCalculation {
    let total_earnings = inputs.total_earnings();
    let total_cash = inputs.total_cash();

    let uber_commission = if inputs.has_uber_commission {
        UBER_COMMISSION
    } else {
        0.0
    };
    let yatri_commission = f64::from(inputs.yatri_trips) * YATRI_COMMISSION_PER_TRIP;
    let total_commission = uber_commission + yatri_commission;

    let fuel_cost = inputs.fuel_cost();
    let net_earnings = total_earnings - total_commission;
    let earned_salary = salary_share(net_earnings, commission_percentage);
    let driver_salary = if inputs.driver_took_salary {
        earned_salary
    } else {
        0.0
    };

    let cash_in_driver_hand = total_cash
        - inputs.online_payment
        - fuel_cost
        - inputs.other_expenses
        - driver_salary
        - inputs.cash_to_cashier;

    TripCalculation {
        total_earnings,
        total_cash,
        uber_commission,
        yatri_commission,
        total_commission,
        fuel_cost,
        net_earnings,
        earned_salary,
        driver_salary,
        cash_in_driver_hand,
    }
}

impl TripCalculation {
    /// How far cash in hand is below zero.
    pub fn shortfall(&self) -> f64 {
        (-self.cash_in_driver_hand).max(0.0)
    }

    /// Salary counted as paid to a driver who took salary, after any
    /// shortfall pushed onto it.
    pub fn adjusted_salary(&self, handling: NegativeCashHandling) -> f64 {
        match handling {
            NegativeCashHandling::Salary => self.driver_salary + self.shortfall(),
            _ => self.driver_salary,
        }
    }

    pub fn driver_delta(&self, took_salary: bool, handling: NegativeCashHandling) -> DriverDelta {
        if took_salary {
            DriverDelta {
                earnings: self.total_earnings,
                salary_paid: self.adjusted_salary(handling),
                pending_salary: 0.0,
            }
        } else {
            DriverDelta {
                earnings: self.total_earnings,
                salary_paid: 0.0,
                pending_salary: self.earned_salary,
            }
        }
    }
}
