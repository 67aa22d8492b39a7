pub mod analytics;
pub mod cashier;
pub mod dashboard;
pub mod driver;
pub mod health;
pub mod init;
pub mod monthly_salary;
pub mod salary_payment;
pub mod trip;
