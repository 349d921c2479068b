//! Data models for the Payroll Engine.
//!
//! The `models` module defines the serialisable structs and enums that
//! flow through the engine: the tenant's finance settings, the salary
//! components of a single payslip, the itemized calculation produced
//! from them, and the records and run summaries built on top.

use crate::error::{PayrollError, Result};
use crate::tax::{BracketTax, TaxSchedule};
use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept when an `f64` is converted to [`Decimal`].  Binary
/// representation error lives far below this, so `1.005` stays `1.005`
/// instead of `1.00499999…`.
const FLOAT_NOISE_DP: u32 = 9;

/// Converts an amount to [`Decimal`], dropping binary noise past
/// [`FLOAT_NOISE_DP`].  `None` for NaN, infinities and out-of-range values.
pub(crate) fn to_decimal(amount: f64) -> Option<Decimal> {
    Decimal::from_f64(amount)
        .map(|d| d.round_dp_with_strategy(FLOAT_NOISE_DP, RoundingStrategy::MidpointAwayFromZero))
}

/// Converts a decimal amount to the `f64` nearest its value in cents.
pub(crate) fn cents_to_f64(amount: Decimal) -> Option<f64> {
    (amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::ONE_HUNDRED)
        .to_i64()
        .map(|cents| cents as f64 / 100.0)
}

/// Rounds a currency amount to cents, half away from zero.
///
/// Rounding happens in decimal, so a half cent that `f64` cannot store
/// exactly (`1.005`, `2.675`) still rounds up.  Values that do not fit a
/// [`Decimal`] are returned unchanged.
pub fn round_cents(amount: f64) -> f64 {
    to_decimal(amount).and_then(cents_to_f64).unwrap_or(amount)
}

/// Which amounts of a payslip are rounded to cents.
///
/// Tax is always rounded by the bracket evaluator.  `AllAmounts` also
/// rounds overtime, pension, gross, taxable income, total deductions and
/// net salary, each derived from already-rounded parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    #[default]
    TaxOnly,
    AllAmounts,
}

impl RoundingPolicy {
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            RoundingPolicy::TaxOnly => amount,
            RoundingPolicy::AllAmounts => round_cents(amount),
        }
    }
}

/// Default amount of one allowance category and the extra paid to managers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AllowanceSetting {
    #[serde(rename = "default")]
    pub default_amount: f64,
    #[serde(default)]
    pub manager_bonus: f64,
}

impl AllowanceSetting {
    pub fn amount_for(&self, is_manager: bool) -> f64 {
        if is_manager {
            self.default_amount + self.manager_bonus
        } else {
            self.default_amount
        }
    }
}

/// Allowance defaults for each category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AllowanceSettings {
    pub transport: AllowanceSetting,
    pub housing: AllowanceSetting,
    pub position: AllowanceSetting,
}

/// Tenant-wide finance configuration.
///
/// The tax schedule is validated while it is deserialized; the remaining
/// fields are checked by [`FinanceSettings::validate`], which
/// [`crate::config::load_finance_settings`] and the settings update route
/// call before a value is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSettings {
    pub tax_brackets: TaxSchedule,
    /// Employee pension contribution, percent of base salary.
    pub pension_rate: f64,
    /// Employer pension contribution, percent of base salary.
    pub employer_pension_rate: f64,
    pub allowances: AllowanceSettings,
    pub max_advance_amount: f64,
    pub max_advance_installments: u32,
    pub max_medical_reimbursement: f64,
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

impl FinanceSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("pension_rate", self.pension_rate),
            ("employer_pension_rate", self.employer_pension_rate),
        ] {
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err(PayrollError::configuration(format!(
                    "{name} {rate} is outside 0-100"
                )));
            }
        }
        for (name, cap) in [
            ("max_advance_amount", self.max_advance_amount),
            ("max_medical_reimbursement", self.max_medical_reimbursement),
        ] {
            if !cap.is_finite() || cap < 0.0 {
                return Err(PayrollError::configuration(format!(
                    "{name} must be a non-negative number, got {cap}"
                )));
            }
        }
        Ok(())
    }
}

/// Allowances paid on top of base salary for one period.  All three
/// categories count towards gross salary and taxable income but never
/// towards pension.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Allowances {
    /// Commuting allowance.
    pub transport: f64,
    /// Housing or rent allowance.
    pub housing: f64,
    /// Allowance attached to the employee's position or grade.
    pub position: f64,
}

impl Allowances {
    /// Sum of the three categories.
    pub fn total(&self) -> f64 {
        self.transport + self.housing + self.position
    }
}

/// Deductions on a payslip.  `tax` and `pension` are always recomputed by
/// the engine; `other` is supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Deductions {
    /// Income tax from the bracket schedule.
    #[serde(default)]
    pub tax: f64,
    /// Employee pension contribution.
    #[serde(default)]
    pub pension: f64,
    /// Loan repayments, penalties and similar caller-supplied deductions.
    #[serde(default)]
    pub other: f64,
}

/// Overtime worked in the period.  `amount` is filled in by the engine
/// as `hours × rate`; a value sent by the caller is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Overtime {
    pub hours: f64,
    /// Pay per overtime hour.
    pub rate: f64,
    #[serde(default)]
    pub amount: f64,
}

impl Overtime {
    pub fn new(hours: f64, rate: f64) -> Self {
        Self {
            hours,
            rate,
            amount: hours * rate,
        }
    }
}

/// Input to a single payroll computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalaryComponents {
    /// Contractual salary for the period; the only pensionable amount.
    pub base_salary: f64,
    pub allowances: Allowances,
    #[serde(default)]
    pub deductions: Deductions,
    #[serde(default)]
    pub overtime: Option<Overtime>,
}

/// Pension contributions computed from base salary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PensionContribution {
    /// Withheld from the employee before tax.
    pub employee: f64,
    /// Paid by the employer on top of gross salary; not deducted.
    pub employer: f64,
}

/// A fully itemized payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollCalculation {
    pub base_salary: f64,
    pub allowances: Allowances,
    pub deductions: Deductions,
    pub overtime: Option<Overtime>,
    pub total_allowances: f64,
    /// `hours × rate`, or 0 without overtime.
    pub overtime_amount: f64,
    /// Base salary plus allowances plus overtime.
    pub gross_salary: f64,
    /// Gross salary minus the employee pension contribution.
    pub taxable_income: f64,
    /// Tax plus employee pension plus other deductions.
    pub total_deductions: f64,
    /// Gross salary minus total deductions.
    pub net_salary: f64,
    pub pension_contribution: PensionContribution,
    /// Per-bracket split of `deductions.tax`.
    pub tax_breakdown: Vec<BracketTax>,
}

/// Workflow state of a persisted payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayrollStatus {
    Draft,
    Pending,
    Approved,
    Paid,
}

impl PayrollStatus {
    pub fn next(self) -> Option<PayrollStatus> {
        match self {
            PayrollStatus::Draft => Some(PayrollStatus::Pending),
            PayrollStatus::Pending => Some(PayrollStatus::Approved),
            PayrollStatus::Approved => Some(PayrollStatus::Paid),
            PayrollStatus::Paid => None,
        }
    }

    pub fn can_transition_to(self, target: PayrollStatus) -> bool {
        self.next() == Some(target)
    }
}

/// A payslip tagged for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub employee_id: String,
    /// First day of the payroll month.
    pub month: NaiveDate,
    pub status: PayrollStatus,
    pub calculation: PayrollCalculation,
}

/// One employee's salary fields in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSalary {
    pub employee_id: String,
    #[serde(default)]
    pub name: String,
    /// Selects the manager defaults when `allowances` is absent.
    #[serde(default)]
    pub is_manager: bool,
    pub base_salary: f64,
    /// When absent, the tenant's default allowances for the role are used.
    #[serde(default)]
    pub allowances: Option<Allowances>,
    #[serde(default)]
    pub overtime: Option<Overtime>,
    #[serde(default)]
    pub other_deductions: f64,
}

/// Input to a batch payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRunInput {
    pub month: NaiveDate,
    pub employees: Vec<EmployeeSalary>,
}

/// Sums over every record of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayRunTotals {
    pub gross: f64,
    pub net: f64,
    pub tax: f64,
    pub employee_pension: f64,
    pub employer_pension: f64,
}

/// The aggregate result of a payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRunResult {
    pub month: NaiveDate,
    pub records: Vec<PayrollRecord>,
    pub totals: PayRunTotals,
}
