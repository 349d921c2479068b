//! Validation of salary-advance and medical-reimbursement requests
//! against the tenant's caps.

use crate::error::{PayrollError, Result};
use crate::models::{cents_to_f64, to_decimal, FinanceSettings};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Repayment schedule for an approved salary advance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancePlan {
    /// The requested amount in whole cents.
    pub amount: f64,
    pub installments: u32,
    /// Deducted in each month but the last; the even share floored to cents.
    pub installment_amount: f64,
    /// Absorbs the remainder so the installments sum to `amount`.  Never
    /// smaller than `installment_amount`.
    pub final_installment: f64,
}

fn ensure_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PayrollError::invalid_input(
            field,
            format!("must be a positive amount, got {value}"),
        ));
    }
    Ok(())
}

/// Checks an advance request against `max_advance_amount` and
/// `max_advance_installments` and splits it into monthly installments.
pub fn validate_advance_request(
    amount: f64,
    installments: u32,
    settings: &FinanceSettings,
) -> Result<AdvancePlan> {
    ensure_positive("amount", amount)?;
    if installments == 0 {
        return Err(PayrollError::invalid_input(
            "installments",
            "must be at least 1",
        ));
    }
    if amount > settings.max_advance_amount {
        warn!(amount, limit = settings.max_advance_amount, "advance request over limit");
        return Err(PayrollError::limit_exceeded(
            "advance amount",
            amount,
            settings.max_advance_amount,
        ));
    }
    if installments > settings.max_advance_installments {
        warn!(
            installments,
            limit = settings.max_advance_installments,
            "advance request has too many installments"
        );
        return Err(PayrollError::limit_exceeded(
            "installment count",
            f64::from(installments),
            f64::from(settings.max_advance_installments),
        ));
    }

    split_installments(amount, installments)
}

fn split_installments(amount: f64, installments: u32) -> Result<AdvancePlan> {
    let unrepresentable =
        || PayrollError::invalid_input("amount", format!("{amount} is out of range"));
    let total = to_decimal(amount)
        .ok_or_else(unrepresentable)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let count = Decimal::from(installments);
    if total < count * Decimal::new(1, 2) {
        return Err(PayrollError::invalid_input(
            "amount",
            format!("{total} cannot be split into {installments} installments of at least 0.01"),
        ));
    }

    let installment = (total / count).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let last = total - installment * Decimal::from(installments - 1);
    Ok(AdvancePlan {
        amount: cents_to_f64(total).ok_or_else(unrepresentable)?,
        installments,
        installment_amount: cents_to_f64(installment).ok_or_else(unrepresentable)?,
        final_installment: cents_to_f64(last).ok_or_else(unrepresentable)?,
    })
}

/// Checks a medical reimbursement claim against
/// `max_medical_reimbursement` and returns the approved amount.
pub fn validate_medical_reimbursement(amount: f64, settings: &FinanceSettings) -> Result<f64> {
    ensure_positive("amount", amount)?;
    if amount > settings.max_medical_reimbursement {
        warn!(
            amount,
            limit = settings.max_medical_reimbursement,
            "reimbursement over limit"
        );
        return Err(PayrollError::limit_exceeded(
            "medical reimbursement",
            amount,
            settings.max_medical_reimbursement,
        ));
    }
    Ok(amount)
}
