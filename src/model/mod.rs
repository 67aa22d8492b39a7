pub mod cashier;
pub mod driver;
pub mod platform;
pub mod salary;
pub mod trip;
