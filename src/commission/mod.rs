//! Commission calculation engine.
//!
//! A sale is priced by the first applicable rule in the order the caller
//! supplies them (see [`select_rule`]). Rules carry no priority field, so
//! when target ranges overlap the list order decides; callers that load rules
//! from the store must keep that order stable.
//!
//! All arithmetic is done on [`Money`] at full decimal precision; amounts are
//! rounded to cents only when rendered into the breakdown text.

pub mod period;
pub mod ranking;

pub use period::{calculate_period_commissions, PeriodCommission};
pub use ranking::{rank_attendants, RankingEntry};

use crate::error::Result;
use crate::model::{Attendant, CommissionRule, RuleType, Sale};
use crate::money::{format_percent, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative earnings above which the performance bonus applies (exclusive).
pub const PERFORMANCE_BONUS_THRESHOLD: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Performance bonus, as a percentage of the commission computed so far.
pub const PERFORMANCE_BONUS_RATE: Decimal = Decimal::TEN;

const TERM_SEPARATOR: &str = " + ";

/// The commission owed for one sale and how it was reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionCalculation {
    pub sale_id: String,
    pub attendant_id: String,
    pub sale_value: Money,
    pub commission_value: Money,
    pub rule: CommissionRule,
    /// Every addend in the order it was applied, joined by `" + "`.
    pub breakdown: String,
}

/// First active rule whose target range contains `sale_value`.
pub fn select_rule(rules: &[CommissionRule], sale_value: Money) -> Option<&CommissionRule> {
    rules.iter().find(|rule| rule.is_applicable(sale_value))
}

/// Compute the commission for a single sale.
///
/// Returns `Ok(None)` when no rule applies; the sale is simply not
/// commissionable.
///
/// # Errors
///
/// Returns `Error::ComputationError` when the sale value or the attendant's
/// earnings are not decimal numbers, or when an amount overflows `Decimal`.
pub fn calculate_commission(
    sale: &Sale,
    attendant: &Attendant,
    rules: &[CommissionRule],
) -> Result<Option<CommissionCalculation>> {
    let sale_value = sale.amount()?;

    let Some(rule) = select_rule(rules, sale_value) else {
        debug!("No commission rule applies to sale {} (R$ {})", sale.id, sale_value);
        return Ok(None);
    };

    let mut terms = Vec::with_capacity(3);
    let mut commission = match rule.rule_type {
        RuleType::Percentage => percentage_term(sale_value, rule.base_value, &mut terms)?,
        RuleType::Fixed => {
            let fixed = Money::new(rule.base_value);
            terms.push(format!("Valor fixo = R$ {}", fixed));
            fixed
        }
        RuleType::Tiered => {
            let mut total = percentage_term(sale_value, rule.base_value, &mut terms)?;
            if let (Some(min_target), Some(bonus_rate)) = (rule.min_target, rule.bonus_percentage) {
                if sale_value.amount() >= min_target {
                    let bonus = sale_value.percent(bonus_rate)?;
                    terms.push(format!(
                        "Bônus de {}% (meta de R$ {} atingida) = R$ {}",
                        format_percent(bonus_rate),
                        Money::new(min_target),
                        bonus
                    ));
                    total = total.checked_add(bonus)?;
                }
            }
            total
        }
    };

    if attendant.earnings_amount()?.amount() > PERFORMANCE_BONUS_THRESHOLD {
        let bonus = commission.percent(PERFORMANCE_BONUS_RATE)?;
        terms.push(format!(
            "Bônus de desempenho ({}%) = R$ {}",
            format_percent(PERFORMANCE_BONUS_RATE),
            bonus
        ));
        commission = commission.checked_add(bonus)?;
    }

    Ok(Some(CommissionCalculation {
        sale_id: sale.id.clone(),
        attendant_id: sale.attendant_id.clone(),
        sale_value,
        commission_value: commission,
        rule: rule.clone(),
        breakdown: terms.join(TERM_SEPARATOR),
    }))
}

fn percentage_term(sale_value: Money, rate: Decimal, terms: &mut Vec<String>) -> Result<Money> {
    let amount = sale_value.percent(rate)?;
    terms.push(format!(
        "{}% de R$ {} = R$ {}",
        format_percent(rate),
        sale_value,
        amount
    ));
    Ok(amount)
}
