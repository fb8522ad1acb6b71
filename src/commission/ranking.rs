//! Attendant leaderboard built from period commissions.

use super::PeriodCommission;
use crate::model::Attendant;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// 1-based position on the board.
    pub position: usize,
    pub attendant_id: String,
    pub name: String,
    pub image_url: String,
    pub total: Money,
    pub count: usize,
}

/// Order every attendant by commission total (desc), then number of
/// commissioned sales (desc), then name.
///
/// Attendants without commissions in the period are listed with zero totals.
pub fn rank_attendants(
    period: &BTreeMap<String, PeriodCommission>,
    attendants: &[Attendant],
) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = attendants
        .iter()
        .map(|attendant| {
            let (total, count) = period
                .get(&attendant.id)
                .map_or((Money::ZERO, 0), |p| (p.total, p.count));
            RankingEntry {
                position: 0,
                attendant_id: attendant.id.clone(),
                name: attendant.name.clone(),
                image_url: attendant.image_url.clone(),
                total,
                count,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.name.cmp(&b.name))
    });

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index + 1;
    }

    entries
}
