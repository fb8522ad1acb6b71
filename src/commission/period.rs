//! Per-attendant commission totals over a date range.

use super::{calculate_commission, CommissionCalculation};
use crate::error::Result;
use crate::model::{Attendant, CommissionRule, Sale};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Commission totals for one attendant in a period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodCommission {
    pub total: Money,
    pub count: usize,
    /// Calculations in the order their sales were supplied.
    pub details: Vec<CommissionCalculation>,
}

impl PeriodCommission {
    fn push(&mut self, calculation: CommissionCalculation) -> Result<()> {
        self.total = self.total.checked_add(calculation.commission_value)?;
        self.count += 1;
        self.details.push(calculation);
        Ok(())
    }
}

/// Aggregate commissions per attendant for sales created in `[start, end]`.
///
/// Sales whose attendant is unknown, and sales no rule applies to, are left
/// out without error. Attendants with no commissionable sale do not appear in
/// the result.
///
/// # Errors
///
/// Propagates `Error::ComputationError` from a sale in range whose value (or
/// whose attendant's earnings) is not a decimal number, and from a total that
/// overflows `Decimal`.
pub fn calculate_period_commissions(
    sales: &[Sale],
    attendants: &[Attendant],
    rules: &[CommissionRule],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<BTreeMap<String, PeriodCommission>> {
    let by_id: HashMap<&str, &Attendant> = attendants
        .iter()
        .map(|attendant| (attendant.id.as_str(), attendant))
        .collect();

    let mut result: BTreeMap<String, PeriodCommission> = BTreeMap::new();
    let mut skipped = 0usize;

    for sale in sales
        .iter()
        .filter(|sale| sale.created_at >= start && sale.created_at <= end)
    {
        let Some(attendant) = by_id.get(sale.attendant_id.as_str()) else {
            skipped += 1;
            continue;
        };

        match calculate_commission(sale, attendant, rules)? {
            Some(calculation) => result
                .entry(attendant.id.clone())
                .or_default()
                .push(calculation)?,
            None => skipped += 1,
        }
    }

    debug!(
        "Period {} .. {}: {} attendants with commissions, {} sales skipped",
        start,
        end,
        result.len(),
        skipped
    );

    Ok(result)
}
