pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod payroll;
pub mod settings;
pub mod tasks;
pub mod teams;
pub mod users;
