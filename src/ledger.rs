use crate::error::{CashFlowError, Result};
use crate::schema::{Color, Entry, SeriesId, MAX_PERIOD, MIN_PERIOD};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Identity shared by every entry of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTag {
    pub id: SeriesId,
    pub color: Color,
    pub name: String,
}

impl SeriesTag {
    pub fn new(id: SeriesId, color: Color, name: impl Into<String>) -> Self {
        Self {
            id,
            color,
            name: name.into(),
        }
    }

    pub fn entry(&self, period: u32, amount: f64) -> Entry {
        Entry {
            period,
            amount,
            color: self.color,
            series_id: self.id,
            series_name: self.name.clone(),
        }
    }

    pub fn of(entry: &Entry) -> Self {
        Self::new(entry.series_id, entry.color, entry.series_name.clone())
    }
}

/// Monotonic source of series ids. Retired ids are never handed out again.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> SeriesId {
        self.last += 1;
        SeriesId(self.last)
    }
}

/// Ordered collection of every cash flow on the diagram.
///
/// Positions are insertion order and double as row indices for selection.
/// Removing rows shifts the positions of everything after them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<Entry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Appends `entries` after checking every period. Nothing is added if any
    /// period is out of range.
    pub fn append(&mut self, entries: Vec<Entry>) -> Result<()> {
        if let Some(bad) = entries
            .iter()
            .find(|e| !(MIN_PERIOD..=MAX_PERIOD).contains(&(e.period as i64)))
        {
            return Err(CashFlowError::PeriodOutOfRange {
                period: bad.period as i64,
            });
        }
        if let Some(bad) = entries.iter().find(|e| !e.amount.is_finite()) {
            return Err(CashFlowError::invalid(
                "amount",
                format!("cash flow at period {} is not a finite number", bad.period),
            ));
        }
        self.entries.extend(entries);
        Ok(())
    }

    /// Removes the rows at `indices` and returns them in ledger order.
    /// Indices past the end are ignored.
    pub fn remove_by_indices(&mut self, indices: &BTreeSet<usize>) -> Vec<Entry> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for (i, entry) in self.entries.drain(..).enumerate() {
            if indices.contains(&i) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        removed
    }

    pub fn clear(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    pub fn indices_for_series(&self, id: SeriesId) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.series_id == id)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn entries_for_series(&self, id: SeriesId) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.series_id == id).collect()
    }

    pub fn series_len(&self, id: SeriesId) -> usize {
        self.entries.iter().filter(|e| e.series_id == id).count()
    }

    pub fn series_ids(&self) -> BTreeSet<SeriesId> {
        self.entries.iter().map(|e| e.series_id).collect()
    }

    pub fn series_tag(&self, id: SeriesId) -> Option<SeriesTag> {
        self.entries
            .iter()
            .find(|e| e.series_id == id)
            .map(SeriesTag::of)
    }

    pub fn live_colors(&self) -> HashSet<Color> {
        self.entries.iter().map(|e| e.color).collect()
    }

    /// Renames every entry of the series. Returns how many rows changed.
    pub fn rename_series(&mut self, id: SeriesId, name: &str) -> usize {
        let mut touched = 0;
        for entry in self.entries.iter_mut().filter(|e| e.series_id == id) {
            entry.series_name = name.to_string();
            touched += 1;
        }
        touched
    }

    /// Flips the sign of every entry of the series.
    pub fn negate_series(&mut self, id: SeriesId) -> usize {
        let mut touched = 0;
        for entry in self.entries.iter_mut().filter(|e| e.series_id == id) {
            entry.amount = -entry.amount;
            touched += 1;
        }
        touched
    }

    /// Moves each group of rows into the series described by its tag, all in
    /// one pass. A row listed in several groups takes the last tag.
    pub fn reassign(&mut self, groups: &[(BTreeSet<usize>, SeriesTag)]) -> usize {
        let mut touched = 0;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if let Some((_, tag)) = groups.iter().rev().find(|(rows, _)| rows.contains(&i)) {
                entry.series_id = tag.id;
                entry.color = tag.color;
                entry.series_name = tag.name.clone();
                touched += 1;
            }
        }
        touched
    }

    /// Row indices ordered the way tables list them: by series name, then period.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.entries.len()).collect();
        indices.sort_by(|a, b| {
            let (ea, eb) = (&self.entries[*a], &self.entries[*b]);
            ea.series_name
                .cmp(&eb.series_name)
                .then(ea.period.cmp(&eb.period))
        });
        indices
    }

    /// Checks the at-rest invariants: periods in range, one color and one
    /// name per series, and no color shared between two series.
    pub fn check_invariants(&self) -> Result<()> {
        let mut tags: BTreeMap<SeriesId, (Color, &str)> = BTreeMap::new();
        let mut owners: BTreeMap<Color, SeriesId> = BTreeMap::new();

        for entry in &self.entries {
            if entry.period as i64 > MAX_PERIOD {
                return Err(CashFlowError::Internal(format!(
                    "series {} holds period {} outside the diagram",
                    entry.series_id, entry.period
                )));
            }

            let (color, name) = *tags
                .entry(entry.series_id)
                .or_insert((entry.color, entry.series_name.as_str()));
            if color != entry.color || name != entry.series_name {
                return Err(CashFlowError::Internal(format!(
                    "series {} has mixed colors or names",
                    entry.series_id
                )));
            }

            let owner = *owners.entry(entry.color).or_insert(entry.series_id);
            if owner != entry.series_id {
                return Err(CashFlowError::Internal(format!(
                    "color {} is shared by series {} and {}",
                    entry.color, owner, entry.series_id
                )));
            }
        }

        Ok(())
    }
}
