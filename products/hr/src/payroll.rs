//! Pay calculations: monthly payroll breakdowns, simple salary sheets and
//! retirement payouts. Amounts are whole currency units.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HrError, HrResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AllowanceMethod {
    Fixed,
    BaseRatio,
    Hourly,
    Daily,
    Monthly,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DeductionMethod {
    Rate,
    Fixed,
    BaseRatio,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowanceRule {
    pub code: String,
    pub method: AllowanceMethod,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeductionRule {
    pub code: String,
    pub method: DeductionMethod,
    /// Percentage points for `Rate` and `BaseRatio`.
    pub rate: Decimal,
    pub amount: i64,
}

/// Attendance totals for the pay month.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkSummary {
    pub days_worked: i64,
    pub overtime_hours: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBreakdown {
    pub base_salary: i64,
    pub allowances: BTreeMap<String, i64>,
    pub deductions: BTreeMap<String, i64>,
    pub total_allowances: i64,
    pub total_deductions: i64,
    pub gross_pay: i64,
    pub net_pay: i64,
}

impl PayrollBreakdown {
    pub fn allowances_json(&self) -> Value {
        serde_json::to_value(&self.allowances).unwrap_or(Value::Null)
    }

    pub fn deductions_json(&self) -> Value {
        serde_json::to_value(&self.deductions).unwrap_or(Value::Null)
    }
}

/// Build a payroll line: allowances are priced first so that rate-based
/// deductions see the final gross pay.
pub fn compute_payroll(
    base_salary: i64,
    allowances: &[AllowanceRule],
    deductions: &[DeductionRule],
    work: &WorkSummary,
) -> HrResult<PayrollBreakdown> {
    if base_salary < 0 {
        return Err(HrError::Validation("base salary cannot be negative".into()));
    }
    let base = Decimal::from(base_salary);

    let mut allowance_detail = BTreeMap::new();
    for rule in allowances {
        let amount = Decimal::from(rule.amount);
        let value = match rule.method {
            AllowanceMethod::Fixed | AllowanceMethod::Monthly => Some(amount),
            AllowanceMethod::BaseRatio => percent_of(base, amount),
            AllowanceMethod::Hourly => amount.checked_mul(work.overtime_hours),
            AllowanceMethod::Daily => amount.checked_mul(Decimal::from(work.days_worked)),
        };
        let value = to_units(value.ok_or_else(|| overflow(&rule.code))?)?;
        accumulate(&mut allowance_detail, &rule.code, value)?;
    }
    let total_allowances = checked_total(allowance_detail.values(), "total allowances")?;
    let gross_pay = base_salary
        .checked_add(total_allowances)
        .ok_or_else(|| overflow("gross pay"))?;
    let gross = Decimal::from(gross_pay);

    let mut deduction_detail = BTreeMap::new();
    for rule in deductions {
        let value = match rule.method {
            DeductionMethod::Rate => percent_of(gross, rule.rate),
            DeductionMethod::BaseRatio => percent_of(base, rule.rate),
            DeductionMethod::Fixed => Some(Decimal::from(rule.amount)),
        };
        let value = to_units(value.ok_or_else(|| overflow(&rule.code))?)?;
        accumulate(&mut deduction_detail, &rule.code, value)?;
    }
    let total_deductions = checked_total(deduction_detail.values(), "total deductions")?;
    if total_deductions > gross_pay {
        return Err(HrError::NegativeNetPay {
            gross: gross_pay,
            deductions: total_deductions,
        });
    }
    let net_pay = gross_pay
        .checked_sub(total_deductions)
        .ok_or_else(|| overflow("net pay"))?;

    Ok(PayrollBreakdown {
        base_salary,
        allowances: allowance_detail,
        deductions: deduction_detail,
        total_allowances,
        total_deductions,
        gross_pay,
        net_pay,
    })
}

fn percent_of(value: Decimal, percent: Decimal) -> Option<Decimal> {
    value.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

fn overflow(what: &str) -> HrError {
    HrError::Validation(format!("{} is out of range", what))
}

fn accumulate(detail: &mut BTreeMap<String, i64>, code: &str, value: i64) -> HrResult<()> {
    let entry = detail.entry(code.to_string()).or_insert(0);
    *entry = entry.checked_add(value).ok_or_else(|| overflow(code))?;
    Ok(())
}

fn checked_total<'a>(mut values: impl Iterator<Item = &'a i64>, what: &str) -> HrResult<i64> {
    values.try_fold(0i64, |acc, v| acc.checked_add(*v).ok_or_else(|| overflow(what)))
}

fn to_units(value: Decimal) -> HrResult<i64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| HrError::Validation(format!("amount {} is out of range", value)))
}

/// Sum of detail entries whose key starts with `prefix` (e.g. `tax_`).
pub fn sum_prefixed(details: &Value, prefix: &str) -> i64 {
    let Some(map) = details.as_object() else {
        return 0;
    };
    map.iter()
        .filter(|(code, _)| code.starts_with(prefix))
        .filter_map(|(_, amount)| {
            amount
                .as_i64()
                .or_else(|| amount.as_f64().map(|f| f.round() as i64))
        })
        .sum()
}

/// Components of the simple monthly salary sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SalarySheet {
    pub base_salary: Decimal,
    pub overtime_pay: Decimal,
    pub meal_allowance: Decimal,
    pub childcare_allowance: Decimal,
    pub car_allowance: Decimal,
}

impl SalarySheet {
    pub fn total(&self) -> HrResult<Decimal> {
        [
            self.overtime_pay,
            self.meal_allowance,
            self.childcare_allowance,
            self.car_allowance,
        ]
        .into_iter()
        .try_fold(self.base_salary, |acc, part| acc.checked_add(part))
        .ok_or_else(|| overflow("total salary"))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PensionPlan {
    DefinedBenefit,
    DefinedContribution,
    Individual,
}

/// Retirement payout. Defined-benefit plans pay 120% of contributions,
/// truncated to whole units; the others pay contributions back as-is.
pub fn pension_payout(plan: PensionPlan, total_contribution: i64) -> HrResult<i64> {
    match plan {
        PensionPlan::DefinedBenefit => total_contribution
            .checked_mul(12)
            .map(|premium| premium / 10)
            .ok_or_else(|| overflow("pension payout")),
        PensionPlan::DefinedContribution | PensionPlan::Individual => Ok(total_contribution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allowance(code: &str, method: AllowanceMethod, amount: i64) -> AllowanceRule {
        AllowanceRule {
            code: code.into(),
            method,
            amount,
        }
    }

    fn deduction(code: &str, method: DeductionMethod, rate: Decimal, amount: i64) -> DeductionRule {
        DeductionRule {
            code: code.into(),
            method,
            rate,
            amount,
        }
    }

    #[test]
    fn payroll_totals_add_up() {
        let work = WorkSummary {
            days_worked: 20,
            overtime_hours: Decimal::new(125, 1),
        };
        let breakdown = compute_payroll(
            3_000_000,
            &[
                allowance("meal", AllowanceMethod::Fixed, 200_000),
                allowance("duty", AllowanceMethod::BaseRatio, 10),
                allowance("overtime", AllowanceMethod::Hourly, 20_000),
                allowance("transport", AllowanceMethod::Daily, 5_000),
            ],
            &[
                deduction("tax_income", DeductionMethod::Rate, Decimal::new(33, 1), 0),
                deduction("insurance_health", DeductionMethod::BaseRatio, Decimal::new(35, 1), 0),
                deduction("union", DeductionMethod::Fixed, Decimal::ZERO, 10_000),
            ],
            &work,
        )
        .unwrap();

        assert_eq!(breakdown.allowances["meal"], 200_000);
        assert_eq!(breakdown.allowances["duty"], 300_000);
        assert_eq!(breakdown.allowances["overtime"], 250_000);
        assert_eq!(breakdown.allowances["transport"], 100_000);
        assert_eq!(breakdown.total_allowances, 850_000);
        assert_eq!(breakdown.gross_pay, 3_850_000);
        assert_eq!(breakdown.deductions["tax_income"], 127_050);
        assert_eq!(breakdown.deductions["insurance_health"], 105_000);
        assert_eq!(breakdown.total_deductions, 242_050);
        assert_eq!(breakdown.net_pay, 3_607_950);
        assert_eq!(
            breakdown.gross_pay,
            breakdown.base_salary + breakdown.total_allowances
        );
    }

    #[test]
    fn deductions_larger_than_gross_fail() {
        let err = compute_payroll(
            100,
            &[],
            &[deduction("loan", DeductionMethod::Fixed, Decimal::ZERO, 150)],
            &WorkSummary::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            HrError::NegativeNetPay {
                gross: 100,
                deductions: 150
            }
        );
    }

    #[test]
    fn prefixed_sums_ignore_other_codes() {
        let details = json!({
            "tax_income": 120_000,
            "tax_local": 12_000,
            "insurance_health": 100_000,
            "insurance_employment": 27_000,
            "union": 10_000
        });
        assert_eq!(sum_prefixed(&details, "tax_"), 132_000);
        assert_eq!(sum_prefixed(&details, "insurance_"), 127_000);
        assert_eq!(sum_prefixed(&json!([]), "tax_"), 0);
    }

    #[test]
    fn salary_sheet_total_is_sum_of_components() {
        let sheet = SalarySheet {
            base_salary: Decimal::new(250_000_000, 2),
            overtime_pay: Decimal::new(12_050, 2),
            meal_allowance: Decimal::new(10_000_000, 2),
            childcare_allowance: Decimal::ZERO,
            car_allowance: Decimal::new(20_000_000, 2),
        };
        assert_eq!(sheet.total().unwrap(), Decimal::new(280_012_050, 2));
    }

    #[test]
    fn salary_sheet_overflow_is_an_error() {
        let sheet = SalarySheet {
            base_salary: Decimal::MAX,
            car_allowance: Decimal::ONE,
            ..SalarySheet::default()
        };
        assert!(matches!(sheet.total(), Err(HrError::Validation(_))));
    }

    #[test]
    fn oversized_pay_is_rejected_not_panicking() {
        let meal = [allowance("MEAL", AllowanceMethod::Fixed, 200_000)];
        let err = compute_payroll(i64::MAX - 10, &meal, &[], &WorkSummary::default()).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)), "{err:?}");

        let doubled = [
            allowance("MEAL", AllowanceMethod::Fixed, i64::MAX),
            allowance("MEAL", AllowanceMethod::Fixed, 1),
        ];
        let err = compute_payroll(0, &doubled, &[], &WorkSummary::default()).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)), "{err:?}");

        let ratio = [allowance("DUTY", AllowanceMethod::BaseRatio, i64::MAX)];
        let err = compute_payroll(i64::MAX, &ratio, &[], &WorkSummary::default()).unwrap_err();
        assert!(matches!(err, HrError::Validation(_)), "{err:?}");

        let breakdown = compute_payroll(i64::MAX, &[], &[], &WorkSummary::default()).unwrap();
        assert_eq!(breakdown.net_pay, i64::MAX);
    }

    #[test]
    fn defined_benefit_pays_a_premium() {
        assert_eq!(pension_payout(PensionPlan::DefinedBenefit, 10_000_005), Ok(12_000_006));
        assert_eq!(pension_payout(PensionPlan::DefinedContribution, 10_000_005), Ok(10_000_005));
        assert_eq!(pension_payout(PensionPlan::Individual, 42), Ok(42));
    }

    #[test]
    fn defined_benefit_overflow_is_an_error() {
        assert!(pension_payout(PensionPlan::DefinedBenefit, i64::MAX / 12).is_ok());
        assert!(matches!(
            pension_payout(PensionPlan::DefinedBenefit, i64::MAX / 10),
            Err(HrError::Validation(_))
        ));
        assert_eq!(pension_payout(PensionPlan::Individual, i64::MAX), Ok(i64::MAX));
    }
}
