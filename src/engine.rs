//! Payroll computation engine.
//!
//! The `engine` module turns [`SalaryComponents`] and the tenant's
//! [`FinanceSettings`] into an itemized [`PayrollCalculation`].  Batch
//! runs use the [`rayon`] crate to compute each employee's payslip across
//! multiple CPU cores.  Tax is delegated to the bracket schedule held in
//! the settings.

use crate::allowance::calculate_default_allowances;
use crate::error::{ensure_non_negative, PayrollError, Result};
use crate::models::{
    Deductions, EmployeeSalary, FinanceSettings, Overtime, PayRunInput, PayRunResult,
    PayRunTotals, PayrollCalculation, PayrollRecord, PayrollStatus, PensionContribution,
    SalaryComponents,
};
use crate::tax::total_tax;
use chrono::Datelike;
use rayon::prelude::*;
use tracing::{debug, info};

fn validate_components(components: &SalaryComponents) -> Result<()> {
    ensure_non_negative("base_salary", components.base_salary)?;
    ensure_non_negative("allowances.transport", components.allowances.transport)?;
    ensure_non_negative("allowances.housing", components.allowances.housing)?;
    ensure_non_negative("allowances.position", components.allowances.position)?;
    ensure_non_negative("deductions.other", components.deductions.other)?;
    if let Some(overtime) = &components.overtime {
        ensure_non_negative("overtime.hours", overtime.hours)?;
        ensure_non_negative("overtime.rate", overtime.rate)?;
    }
    Ok(())
}

/// Computes a single payslip.
///
/// Gross salary is base plus allowances plus overtime (`hours × rate`).
/// The employee pension is taken from base salary only and is deducted
/// before tax, so taxable income is gross minus that pension.  Net salary
/// is gross minus tax, pension and the caller's other deductions.
///
/// Returns [`PayrollError::InvalidInput`] when any amount is negative or
/// not finite.  Identical inputs always produce identical output.
pub fn calculate_payroll(
    components: &SalaryComponents,
    settings: &FinanceSettings,
) -> Result<PayrollCalculation> {
    validate_components(components)?;
    let policy = settings.rounding;
    let allowances = components.allowances;

    let overtime = components.overtime.map(|o| Overtime {
        amount: policy.apply(o.hours * o.rate),
        ..o
    });
    let overtime_amount = overtime.map(|o| o.amount).unwrap_or(0.0);

    let total_allowances = allowances.total();
    let gross_salary = policy.apply(
        components.base_salary
            + allowances.transport
            + allowances.housing
            + allowances.position
            + overtime_amount,
    );

    let pension = PensionContribution::for_settings(components.base_salary, settings);
    let pension = PensionContribution {
        employee: policy.apply(pension.employee),
        employer: policy.apply(pension.employer),
    };

    let taxable_income = policy.apply(gross_salary - pension.employee);
    let tax_breakdown = settings.tax_brackets.breakdown(taxable_income);
    let tax = total_tax(&tax_breakdown);

    let other = components.deductions.other;
    let total_deductions = policy.apply(tax + pension.employee + other);
    let net_salary = policy.apply(gross_salary - total_deductions);

    debug!(gross_salary, taxable_income, tax, net_salary, "calculated payroll");

    Ok(PayrollCalculation {
        base_salary: components.base_salary,
        allowances,
        deductions: Deductions {
            tax,
            pension: pension.employee,
            other,
        },
        overtime,
        total_allowances,
        overtime_amount,
        gross_salary,
        taxable_income,
        total_deductions,
        net_salary,
        pension_contribution: pension,
        tax_breakdown,
    })
}

fn employee_record(
    employee: EmployeeSalary,
    month: chrono::NaiveDate,
    settings: &FinanceSettings,
) -> Result<PayrollRecord> {
    let components = SalaryComponents {
        base_salary: employee.base_salary,
        allowances: employee
            .allowances
            .unwrap_or_else(|| calculate_default_allowances(employee.is_manager, settings)),
        deductions: Deductions {
            other: employee.other_deductions,
            ..Deductions::default()
        },
        overtime: employee.overtime,
    };
    let calculation = calculate_payroll(&components, settings).map_err(|err| match err {
        PayrollError::InvalidInput { field, reason } => PayrollError::InvalidInput {
            field: format!("employee {}: {field}", employee.employee_id),
            reason,
        },
        other => other,
    })?;
    Ok(PayrollRecord {
        employee_id: employee.employee_id,
        month,
        status: PayrollStatus::Draft,
        calculation,
    })
}

/// Runs payroll for every employee in `input`.
///
/// Records come back in input order, all in [`PayrollStatus::Draft`],
/// tagged with the first day of the run's month.  Employees without
/// explicit allowances receive the defaults for their role.  One invalid
/// employee fails the whole run.
pub fn run_payroll(input: PayRunInput, settings: &FinanceSettings) -> Result<PayRunResult> {
    let month = input.month.with_day(1).unwrap_or(input.month);

    let records: Vec<PayrollRecord> = input
        .employees
        .into_par_iter()
        .map(|employee| employee_record(employee, month, settings))
        .collect::<Result<Vec<_>>>()?;

    let totals = records
        .iter()
        .fold(PayRunTotals::default(), |mut totals, record| {
            let calc = &record.calculation;
            totals.gross += calc.gross_salary;
            totals.net += calc.net_salary;
            totals.tax += calc.deductions.tax;
            totals.employee_pension += calc.pension_contribution.employee;
            totals.employer_pension += calc.pension_contribution.employer;
            totals
        });

    info!(
        %month,
        employees = records.len(),
        gross = totals.gross,
        net = totals.net,
        "payroll run completed"
    );

    Ok(PayRunResult {
        month,
        records,
        totals,
    })
}
