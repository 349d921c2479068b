//! Payroll Engine library crate.
//!
//! This crate exposes the payslip calculation engine and API components
//! as reusable modules.  External applications may depend on the
//! `payroll_engine` crate and call [`calculate_payroll`] directly or embed
//! the API via `api::build_router`.

pub mod models;
pub mod error;
pub mod tax;
pub mod allowance;
pub mod pension;
pub mod engine;
pub mod calendar;
pub mod requests;
pub mod config;
pub mod api;

pub use allowance::calculate_default_allowances;
pub use calendar::{calculate_working_days, count_working_days, HolidayProvider};
pub use engine::{calculate_payroll, run_payroll};
pub use error::{PayrollError, Result};
pub use pension::calculate_pension;
pub use requests::{validate_advance_request, validate_medical_reimbursement};
pub use tax::calculate_tax;
