//! Progressive income tax.
//!
//! The `tax` module defines the bracket schedule a tenant configures and
//! the marginal-rate evaluator the payroll aggregator calls.  A
//! [`TaxSchedule`] can only be built from a well-formed list of brackets,
//! so the evaluator itself never has to second-guess its configuration.

use crate::error::{PayrollError, Result};
use crate::models::round_cents;
use serde::{Deserialize, Serialize};

/// Largest allowed distance between one bracket's `to` and the next
/// bracket's `from`.  Schedules are commonly written in whole currency
/// units (`0–600`, `601–1650`), which leaves a one-unit seam that is
/// still contiguous.
pub const MAX_BRACKET_GAP: f64 = 1.0;

/// Upper limit of a tax bracket.
///
/// On the wire a bounded limit is a plain number and an unbounded limit
/// is the string `"infinite"`.  `"unbounded"` and `"infinity"` are also
/// accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawLimit", into = "RawLimit")]
pub enum BracketLimit {
    Bounded(f64),
    #[default]
    Unbounded,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Amount(f64),
    Sentinel(String),
}

impl TryFrom<RawLimit> for BracketLimit {
    type Error = String;

    fn try_from(raw: RawLimit) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawLimit::Amount(amount) => Ok(BracketLimit::Bounded(amount)),
            RawLimit::Sentinel(s) => match s.to_ascii_lowercase().as_str() {
                "infinite" | "unbounded" | "infinity" => Ok(BracketLimit::Unbounded),
                other => Err(format!("unknown bracket limit {other:?}")),
            },
        }
    }
}

impl From<BracketLimit> for RawLimit {
    fn from(limit: BracketLimit) -> Self {
        match limit {
            BracketLimit::Bounded(amount) => RawLimit::Amount(amount),
            BracketLimit::Unbounded => RawLimit::Sentinel("infinite".to_string()),
        }
    }
}

/// A marginal rate applied to income falling between `from` and `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub from: f64,
    /// Omitted in JSON means unbounded.
    #[serde(default)]
    pub to: BracketLimit,
    /// Percentage, 0–100.
    pub rate: f64,
}

impl TaxBracket {
    pub fn bounded(from: f64, to: f64, rate: f64) -> Self {
        Self {
            from,
            to: BracketLimit::Bounded(to),
            rate,
        }
    }

    pub fn unbounded(from: f64, rate: f64) -> Self {
        Self {
            from,
            to: BracketLimit::Unbounded,
            rate,
        }
    }

    /// Amount of income this bracket can absorb, `None` when unbounded.
    pub fn width(&self) -> Option<f64> {
        match self.to {
            BracketLimit::Bounded(to) => Some(to - self.from),
            BracketLimit::Unbounded => None,
        }
    }
}

/// Tax owed on the slice of income that fell into one bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketTax {
    pub from: f64,
    pub to: BracketLimit,
    pub rate: f64,
    /// Portion of taxable income taxed in this bracket.
    pub taxed_amount: f64,
    /// Unrounded tax on `taxed_amount`.
    pub tax: f64,
}

/// An ordered, contiguous bracket schedule covering `[0, ∞)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct TaxSchedule {
    brackets: Vec<TaxBracket>,
}

impl TaxSchedule {
    /// Validates and wraps a bracket list.
    ///
    /// The first bracket must start at 0, every bracket but the last must
    /// be bounded, consecutive brackets may neither overlap nor leave a
    /// gap wider than [`MAX_BRACKET_GAP`], and the last bracket must be
    /// unbounded.  Rates are percentages between 0 and 100.
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self> {
        let first = brackets
            .first()
            .ok_or_else(|| PayrollError::configuration("tax bracket schedule is empty"))?;
        if first.from != 0.0 {
            return Err(PayrollError::configuration(format!(
                "first tax bracket must start at 0, starts at {}",
                first.from
            )));
        }

        let last_index = brackets.len() - 1;
        for (i, bracket) in brackets.iter().enumerate() {
            if !bracket.from.is_finite() || bracket.from < 0.0 {
                return Err(PayrollError::configuration(format!(
                    "tax bracket {i} has invalid lower bound {}",
                    bracket.from
                )));
            }
            if !bracket.rate.is_finite() || !(0.0..=100.0).contains(&bracket.rate) {
                return Err(PayrollError::configuration(format!(
                    "tax bracket {i} rate {} is outside 0-100",
                    bracket.rate
                )));
            }
            match bracket.to {
                BracketLimit::Bounded(to) if !to.is_finite() || to <= bracket.from => {
                    return Err(PayrollError::configuration(format!(
                        "tax bracket {i} upper bound {to} must be greater than {}",
                        bracket.from
                    )));
                }
                BracketLimit::Unbounded if i != last_index => {
                    return Err(PayrollError::configuration(format!(
                        "tax bracket {i} is unbounded but is not the last bracket"
                    )));
                }
                _ => {}
            }
        }

        for (i, pair) in brackets.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if let BracketLimit::Bounded(prev_to) = prev.to {
                let gap = next.from - prev_to;
                if gap < 0.0 {
                    return Err(PayrollError::configuration(format!(
                        "tax brackets {i} and {} overlap: {} starts below {prev_to}",
                        i + 1,
                        next.from
                    )));
                }
                if gap > MAX_BRACKET_GAP {
                    return Err(PayrollError::configuration(format!(
                        "tax brackets {i} and {} leave a gap between {prev_to} and {}",
                        i + 1,
                        next.from
                    )));
                }
            }
        }

        if brackets[last_index].to != BracketLimit::Unbounded {
            return Err(PayrollError::configuration(
                "last tax bracket must be unbounded",
            ));
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Rate of the unbounded top bracket.
    pub fn top_rate(&self) -> f64 {
        self.brackets.last().map(|b| b.rate).unwrap_or(0.0)
    }

    /// Splits `taxable_income` across the brackets.
    ///
    /// Walks brackets in ascending order, taking at most the bracket's
    /// width from the remaining income, until nothing remains.
    /// Non-positive income produces no lines.
    pub fn breakdown(&self, taxable_income: f64) -> Vec<BracketTax> {
        let mut remaining = taxable_income.max(0.0);
        let mut lines = Vec::new();
        for bracket in &self.brackets {
            if remaining <= 0.0 {
                break;
            }
            let portion = match bracket.width() {
                Some(width) => remaining.min(width),
                None => remaining,
            };
            lines.push(BracketTax {
                from: bracket.from,
                to: bracket.to,
                rate: bracket.rate,
                taxed_amount: portion,
                tax: portion * bracket.rate / 100.0,
            });
            remaining -= portion;
        }
        lines
    }

    /// Rate applied to the next unit of income above `taxable_income`.
    pub fn marginal_rate(&self, taxable_income: f64) -> f64 {
        let mut remaining = taxable_income.max(0.0);
        for bracket in &self.brackets {
            match bracket.width() {
                Some(width) if remaining >= width => remaining -= width,
                _ => return bracket.rate,
            }
        }
        self.top_rate()
    }
}

impl TryFrom<Vec<TaxBracket>> for TaxSchedule {
    type Error = PayrollError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self> {
        TaxSchedule::new(brackets)
    }
}

impl From<TaxSchedule> for Vec<TaxBracket> {
    fn from(schedule: TaxSchedule) -> Self {
        schedule.brackets
    }
}

/// Total tax owed on `taxable_income` under marginal rates, rounded to
/// cents.
///
/// Negative income is not a valid input; it is clamped to zero.
pub fn calculate_tax(taxable_income: f64, schedule: &TaxSchedule) -> f64 {
    total_tax(&schedule.breakdown(taxable_income))
}

/// Sums a bracket breakdown and rounds the result to cents.
pub fn total_tax(lines: &[BracketTax]) -> f64 {
    let total: f64 = lines.iter().map(|line| line.tax).sum();
    round_cents(total)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_schedule() -> TaxSchedule {
        TaxSchedule::new(vec![
            TaxBracket::bounded(0.0, 600.0, 0.0),
            TaxBracket::bounded(601.0, 1650.0, 10.0),
            TaxBracket::bounded(1651.0, 3200.0, 15.0),
            TaxBracket::bounded(3201.0, 5250.0, 20.0),
            TaxBracket::bounded(5251.0, 7800.0, 25.0),
            TaxBracket::bounded(7801.0, 10900.0, 30.0),
            TaxBracket::unbounded(10901.0, 35.0),
        ])
        .unwrap()
    }

    #[test]
    fn zero_income_owes_nothing() {
        assert_eq!(calculate_tax(0.0, &sample_schedule()), 0.0);
        assert!(sample_schedule().breakdown(0.0).is_empty());
    }

    #[test]
    fn negative_income_is_clamped() {
        assert_eq!(calculate_tax(-250.0, &sample_schedule()), 0.0);
    }

    #[test]
    fn income_inside_the_zero_rate_bracket() {
        assert_eq!(calculate_tax(600.0, &sample_schedule()), 0.0);
    }

    #[test]
    fn income_spanning_two_brackets() {
        // 600 at 0% then 400 at 10%
        assert_eq!(calculate_tax(1000.0, &sample_schedule()), 40.0);
    }

    #[test]
    fn walks_every_bracket_for_high_income() {
        let schedule = sample_schedule();
        let lines = schedule.breakdown(15800.0);
        let portions: Vec<f64> = lines.iter().map(|l| l.taxed_amount).collect();
        assert_eq!(
            portions,
            vec![600.0, 1049.0, 1549.0, 2049.0, 2549.0, 3099.0, 4905.0]
        );
        assert_eq!(lines.last().unwrap().to, BracketLimit::Unbounded);
        assert_eq!(calculate_tax(15800.0, &schedule), 4030.75);
    }

    #[test]
    fn rounds_half_up_to_cents() {
        let schedule = TaxSchedule::new(vec![TaxBracket::unbounded(0.0, 0.5)]).unwrap();
        // 1.00 at 0.5% = 0.005
        assert_eq!(calculate_tax(1.0, &schedule), 0.01);
        assert_eq!(calculate_tax(0.5, &schedule), 0.0);
        assert_eq!(calculate_tax(1234.0, &schedule), 6.17);
    }

    #[test]
    fn half_cent_tax_rounds_up_despite_binary_representation() {
        let schedule = TaxSchedule::new(vec![TaxBracket::unbounded(0.0, 10.0)]).unwrap();
        // 10.05 at 10% = 1.005, stored as 1.00499999… in f64
        assert_eq!(calculate_tax(10.05, &schedule), 1.01);
        assert_eq!(calculate_tax(26.75, &schedule), 2.68);
    }

    #[test]
    fn marginal_rate_follows_the_walk() {
        let schedule = sample_schedule();
        assert_eq!(schedule.marginal_rate(0.0), 0.0);
        assert_eq!(schedule.marginal_rate(599.0), 0.0);
        assert_eq!(schedule.marginal_rate(600.0), 10.0);
        assert_eq!(schedule.marginal_rate(15800.0), 35.0);
        assert_eq!(schedule.top_rate(), 35.0);
    }

    #[test]
    fn rejects_empty_schedule() {
        let err = TaxSchedule::new(vec![]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_schedule_not_starting_at_zero() {
        let err = TaxSchedule::new(vec![TaxBracket::unbounded(100.0, 10.0)]).unwrap_err();
        assert!(err.to_string().contains("must start at 0"));
    }

    #[test]
    fn rejects_overlapping_brackets() {
        let err = TaxSchedule::new(vec![
            TaxBracket::bounded(0.0, 1000.0, 0.0),
            TaxBracket::unbounded(900.0, 10.0),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn rejects_gaps_wider_than_one_unit() {
        let err = TaxSchedule::new(vec![
            TaxBracket::bounded(0.0, 1000.0, 0.0),
            TaxBracket::unbounded(1500.0, 10.0),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn rejects_unbounded_bracket_before_the_end() {
        let err = TaxSchedule::new(vec![
            TaxBracket::unbounded(0.0, 0.0),
            TaxBracket::unbounded(600.0, 10.0),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("not the last"));
    }

    #[test]
    fn rejects_missing_unbounded_top_bracket() {
        let err = TaxSchedule::new(vec![
            TaxBracket::bounded(0.0, 600.0, 0.0),
            TaxBracket::bounded(600.0, 1000.0, 10.0),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("must be unbounded"));
    }

    #[test]
    fn rejects_rates_outside_percentage_range() {
        assert!(TaxSchedule::new(vec![TaxBracket::unbounded(0.0, 101.0)]).is_err());
        assert!(TaxSchedule::new(vec![TaxBracket::unbounded(0.0, -1.0)]).is_err());
    }

    #[test]
    fn rejects_empty_bounded_bracket() {
        let err = TaxSchedule::new(vec![
            TaxBracket::bounded(0.0, 0.0, 0.0),
            TaxBracket::unbounded(0.0, 10.0),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("must be greater than"));
    }

    #[test]
    fn deserializes_sentinel_and_omitted_limits() {
        let schedule: TaxSchedule = serde_json::from_value(json!([
            {"from": 0, "to": 600, "rate": 0},
            {"from": 601, "to": "Infinite", "rate": 10}
        ]))
        .unwrap();
        assert_eq!(schedule.brackets()[1].to, BracketLimit::Unbounded);

        let schedule: TaxSchedule = serde_json::from_value(json!([
            {"from": 0, "to": 600, "rate": 0},
            {"from": 600, "rate": 10}
        ]))
        .unwrap();
        assert_eq!(schedule.top_rate(), 10.0);
    }

    #[test]
    fn deserializing_invalid_schedule_fails() {
        let result: std::result::Result<TaxSchedule, _> = serde_json::from_value(json!([
            {"from": 0, "to": 600, "rate": 0}
        ]));
        assert!(result.is_err());

        let result: std::result::Result<TaxSchedule, _> = serde_json::from_value(json!([
            {"from": 0, "to": "forever", "rate": 0}
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_unbounded_as_sentinel() {
        let value = serde_json::to_value(sample_schedule()).unwrap();
        assert_eq!(value[6]["to"], json!("infinite"));
        assert_eq!(value[0]["to"], json!(600.0));
    }
}
