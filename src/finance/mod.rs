pub mod analytics;
pub mod ledger;
pub mod monthly;
pub mod owner;
pub mod period;
pub mod reconciliation;
pub mod report;
pub mod risk;
