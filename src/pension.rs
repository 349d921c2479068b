//! Pension contributions.

use crate::models::{FinanceSettings, PensionContribution};

/// Employee and employer contributions as percentages of base salary.
/// Allowances and overtime are never pensionable.
pub fn calculate_pension(
    base_salary: f64,
    pension_rate: f64,
    employer_pension_rate: f64,
) -> PensionContribution {
    PensionContribution {
        employee: base_salary * pension_rate / 100.0,
        employer: base_salary * employer_pension_rate / 100.0,
    }
}

impl PensionContribution {
    pub fn for_settings(base_salary: f64, settings: &FinanceSettings) -> Self {
        calculate_pension(
            base_salary,
            settings.pension_rate,
            settings.employer_pension_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_settings;

    #[test]
    fn contributions_are_percentages_of_base() {
        let pension = calculate_pension(10000.0, 7.0, 11.0);
        assert_eq!(pension.employee, 700.0);
        assert_eq!(pension.employer, 1100.0);
    }

    #[test]
    fn zero_rates_contribute_nothing() {
        let pension = calculate_pension(10000.0, 0.0, 0.0);
        assert_eq!(pension, PensionContribution::default());
    }

    #[test]
    fn reads_rates_from_settings() {
        let pension = PensionContribution::for_settings(2000.0, &sample_settings());
        assert_eq!(pension.employee, 140.0);
        assert_eq!(pension.employer, 220.0);
    }
}
