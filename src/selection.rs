use crate::error::{CashFlowError, Result};
use crate::ledger::Ledger;
use crate::schema::{Entry, SeriesId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClickMode {
    /// Plain click: selects, or deselects if already selected.
    Toggle,
    /// Context-menu click: only ever adds to the selection.
    Peek,
}

/// Ledger rows currently highlighted, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn index_set(&self) -> BTreeSet<usize> {
        self.indices.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Handles a click on row `index`.
    ///
    /// A row of a multi-entry series stands for the whole series; a
    /// single-entry series toggles on its own.
    pub fn click(&mut self, ledger: &Ledger, index: usize, mode: ClickMode) -> Result<()> {
        let entry = ledger
            .get(index)
            .ok_or(CashFlowError::NoSuchEntry { index })?;
        let group = ledger.indices_for_series(entry.series_id);

        let all_selected = group.iter().all(|i| self.contains(*i));
        if all_selected {
            if mode == ClickMode::Toggle {
                self.indices.retain(|i| !group.contains(i));
            }
        } else {
            for i in group {
                if !self.contains(i) {
                    self.indices.push(i);
                }
            }
        }
        Ok(())
    }

    /// Replaces the selection with every row of `series`.
    pub fn select_series(&mut self, ledger: &Ledger, series: SeriesId) -> Result<()> {
        let rows = ledger.indices_for_series(series);
        if rows.is_empty() {
            return Err(CashFlowError::invalid(
                "series",
                format!("series {} has no cash flows", series),
            ));
        }
        self.indices = rows;
        Ok(())
    }

    /// Selected rows that still exist, in pick order.
    pub fn resolve<'a>(&self, ledger: &'a Ledger) -> Vec<(usize, &'a Entry)> {
        self.indices
            .iter()
            .filter_map(|i| ledger.get(*i).map(|e| (*i, e)))
            .collect()
    }

    pub fn series(&self, ledger: &Ledger) -> BTreeSet<SeriesId> {
        self.resolve(ledger)
            .into_iter()
            .map(|(_, e)| e.series_id)
            .collect()
    }

    /// The one series the selection belongs to.
    pub fn single_series(&self, ledger: &Ledger) -> Result<SeriesId> {
        let series = self.series(ledger);
        match series.len() {
            0 => Err(CashFlowError::SelectionEmpty),
            1 => series.into_iter().next().ok_or(CashFlowError::SelectionEmpty),
            n => Err(CashFlowError::AmbiguousSeriesSelection { series: n }),
        }
    }
}
