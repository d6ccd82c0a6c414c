// =============================================================================
// Basis / Term Structure
// =============================================================================
//
// Basis      = futures close - spot close
// BasisRatio = Basis / spot close * 100
//
// Rows exist only for dates present in both series (inner join).  The frame
// may additionally carry a calendar-spread z-score between a near and a far
// contract:
//
//   Spread       = far close - near close
//   SpreadZScore = (Spread - SMA(Spread, n)) / sample σ(Spread, n)
//
// The z-score is merged onto basis rows by date and left undefined on dates
// the near/far join does not cover.
// =============================================================================

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::BarSeries;
use crate::indicators::sma::{rolling_mean_opt, rolling_std, StdKind};
use crate::indicators::{finite, Series};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BasisRow {
    pub date: NaiveDate,
    pub futures_close: f64,
    pub spot_close: f64,
    pub basis: Option<f64>,
    pub basis_ratio: Option<f64>,
    #[serde(rename = "SpreadZScore")]
    pub spread_z_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasisFrame {
    rows: Vec<BasisRow>,
}

impl BasisFrame {
    /// Join futures and spot closes on date.
    pub fn build(futures: &BarSeries, spot: &BarSeries) -> Self {
        let rows: Vec<BasisRow> = inner_join(futures, spot)
            .map(|(date, fut, spot)| {
                let basis = finite(fut - spot);
                BasisRow {
                    date,
                    futures_close: fut,
                    spot_close: spot,
                    basis,
                    basis_ratio: basis.and_then(|b| finite(b / spot * 100.0)),
                    spread_z_score: None,
                }
            })
            .collect();

        debug!(
            futures_rows = futures.len(),
            spot_rows = spot.len(),
            joined = rows.len(),
            "basis frame built"
        );
        Self { rows }
    }

    /// Attach the near/far calendar-spread z-score.
    pub fn with_term_structure(mut self, near: &BarSeries, far: &BarSeries, window: usize) -> Self {
        let z_by_date = spread_z_scores(near, far, window);
        for row in &mut self.rows {
            row.spread_z_score = z_by_date.get(&row.date).copied().flatten();
        }
        self
    }

    pub fn rows(&self) -> &[BasisRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&BasisRow> {
        self.rows.last()
    }

    /// The row before the latest, or `None` when there is only one row.
    pub fn previous(&self) -> Option<&BasisRow> {
        self.rows.len().checked_sub(2).map(|i| &self.rows[i])
    }
}

/// Dates present in both series with their closes, ascending.
fn inner_join<'a>(
    left: &'a BarSeries,
    right: &'a BarSeries,
) -> impl Iterator<Item = (NaiveDate, f64, f64)> + 'a {
    let right_by_date: HashMap<NaiveDate, f64> =
        right.bars().iter().map(|b| (b.date, b.close)).collect();
    left.bars()
        .iter()
        .filter_map(move |b| right_by_date.get(&b.date).map(|&r| (b.date, b.close, r)))
}

fn spread_z_scores(near: &BarSeries, far: &BarSeries, window: usize) -> HashMap<NaiveDate, Option<f64>> {
    let joined: Vec<(NaiveDate, f64, f64)> = inner_join(near, far).collect();
    let spread: Series = joined.iter().map(|&(_, n, f)| finite(f - n)).collect();
    let mean = rolling_mean_opt(&spread, window);
    let std = rolling_std(&spread, window, StdKind::Sample);

    joined
        .iter()
        .enumerate()
        .map(|(i, &(date, _, _))| {
            let z = match (spread[i], mean[i], std[i]) {
                (Some(s), Some(m), Some(sd)) => finite((s - m) / sd),
                _ => None,
            };
            (date, z)
        })
        .collect()
}
