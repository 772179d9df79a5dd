use crate::color::ColorAllocator;
use crate::error::{CashFlowError, Result};
use crate::ledger::{IdAllocator, Ledger, SeriesTag};
use crate::schema::SeriesId;
use crate::selection::Selection;
use crate::utils::validate_series_name;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Edits applied to the series touched by the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SeriesOperation {
    /// Sum two or more cash flows that share a period into one new series.
    Combine,

    /// Flip the sign of every cash flow of every selected series.
    Invert,

    /// Remove the selected cash flows.
    Delete,

    /// Cut the selected series in two after its `index`-th cash flow
    /// (0-based, in period order).
    Split { index: usize },

    /// Give the series of the first selected cash flow a new name.
    Rename {
        #[schemars(description = "The new name. Leading and trailing blanks are dropped.")]
        name: String,
    },

    /// Remove every cash flow from the diagram.
    Clear,
}

/// What a series operation changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationReport {
    pub created: Vec<SeriesId>,
    pub touched: usize,
}

impl SeriesOperation {
    pub fn name(&self) -> &'static str {
        match self {
            SeriesOperation::Combine => "combine",
            SeriesOperation::Invert => "invert",
            SeriesOperation::Delete => "delete",
            SeriesOperation::Split { .. } => "split",
            SeriesOperation::Rename { .. } => "rename",
            SeriesOperation::Clear => "clear",
        }
    }

    pub fn apply(
        &self,
        ledger: &mut Ledger,
        ids: &mut IdAllocator,
        colors: &mut ColorAllocator,
        selection: &Selection,
    ) -> Result<OperationReport> {
        match self {
            SeriesOperation::Combine => combine(ledger, ids, colors, selection),
            SeriesOperation::Invert => invert(ledger, selection),
            SeriesOperation::Delete => delete(ledger, selection),
            SeriesOperation::Split { index } => split(ledger, ids, colors, selection, *index),
            SeriesOperation::Rename { name } => rename(ledger, selection, name),
            SeriesOperation::Clear => clear(ledger, colors),
        }
    }
}

pub fn combine(
    ledger: &mut Ledger,
    ids: &mut IdAllocator,
    colors: &mut ColorAllocator,
    selection: &Selection,
) -> Result<OperationReport> {
    let rows = selection.resolve(ledger);
    match rows.len() {
        0 => return Err(CashFlowError::SelectionEmpty),
        1 => {
            return Err(CashFlowError::invalid(
                "selection",
                "select at least two cash flows in the same period to combine",
            ))
        }
        _ => {}
    }

    let periods: BTreeSet<u32> = rows.iter().map(|(_, e)| e.period).collect();
    if periods.len() > 1 {
        return Err(CashFlowError::PeriodMismatch {
            periods: periods.into_iter().collect(),
        });
    }
    let period = rows[0].1.period;

    let total: f64 = rows.iter().map(|(_, e)| e.amount).sum();

    let mut names: Vec<&str> = Vec::new();
    for (_, entry) in &rows {
        if !names.contains(&entry.series_name.as_str()) {
            names.push(entry.series_name.as_str());
        }
    }
    let name = names.join(" + ");
    let sources: BTreeSet<usize> = rows.iter().map(|(i, _)| *i).collect();

    let tag = SeriesTag::new(ids.next_id(), colors.acquire(), name);
    debug!(
        "Combining {} cash flows at period {} into '{}'",
        sources.len(),
        period,
        tag.name
    );

    ledger.remove_by_indices(&sources);
    ledger.append(vec![tag.entry(period, total)])?;

    Ok(OperationReport {
        created: vec![tag.id],
        touched: sources.len(),
    })
}

pub fn invert(ledger: &mut Ledger, selection: &Selection) -> Result<OperationReport> {
    let series = selection.series(ledger);
    if series.is_empty() {
        return Err(CashFlowError::SelectionEmpty);
    }

    let touched: usize = series.iter().map(|id| ledger.negate_series(*id)).sum();
    Ok(OperationReport {
        created: Vec::new(),
        touched,
    })
}

pub fn delete(ledger: &mut Ledger, selection: &Selection) -> Result<OperationReport> {
    let rows: BTreeSet<usize> = selection
        .resolve(ledger)
        .into_iter()
        .map(|(i, _)| i)
        .collect();
    if rows.is_empty() {
        return Err(CashFlowError::SelectionEmpty);
    }

    let removed = ledger.remove_by_indices(&rows);
    Ok(OperationReport {
        created: Vec::new(),
        touched: removed.len(),
    })
}

/// Rows at or before the `index`-th period stay in the original series
/// (renamed `<name>_1`); later rows move to a new series `<name>_2`.
pub fn split(
    ledger: &mut Ledger,
    ids: &mut IdAllocator,
    colors: &mut ColorAllocator,
    selection: &Selection,
    index: usize,
) -> Result<OperationReport> {
    let series = selection.single_series(ledger)?;
    let original = ledger
        .series_tag(series)
        .ok_or(CashFlowError::SelectionEmpty)?;

    let mut rows: Vec<(usize, u32)> = ledger
        .indices_for_series(series)
        .into_iter()
        .filter_map(|i| ledger.get(i).map(|e| (i, e.period)))
        .collect();
    if rows.len() <= 1 {
        return Err(CashFlowError::SeriesTooShort {
            entries: rows.len(),
        });
    }
    if index >= rows.len() - 1 {
        return Err(CashFlowError::invalid(
            "split point",
            format!(
                "{} must be below {} for a series of {} cash flows",
                index,
                rows.len() - 1,
                rows.len()
            ),
        ));
    }

    rows.sort_by_key(|(_, period)| *period);
    let split_period = rows[index].1;

    let (head, tail): (Vec<_>, Vec<_>) = rows.iter().partition(|(_, p)| *p <= split_period);
    if tail.is_empty() {
        return Err(CashFlowError::invalid(
            "split point",
            format!("no cash flows come after period {}", split_period),
        ));
    }

    let first = SeriesTag::new(original.id, original.color, format!("{}_1", original.name));
    let second = SeriesTag::new(
        ids.next_id(),
        colors.acquire(),
        format!("{}_2", original.name),
    );
    debug!(
        "Splitting series {} after period {}: {} + {} cash flows",
        series,
        split_period,
        head.len(),
        tail.len()
    );

    let head_rows: BTreeSet<usize> = head.iter().map(|(i, _)| *i).collect();
    let tail_rows: BTreeSet<usize> = tail.iter().map(|(i, _)| *i).collect();
    let touched = ledger.reassign(&[(head_rows, first), (tail_rows, second.clone())]);

    Ok(OperationReport {
        created: vec![second.id],
        touched,
    })
}

pub fn rename(ledger: &mut Ledger, selection: &Selection, name: &str) -> Result<OperationReport> {
    let (_, first) = selection
        .resolve(ledger)
        .into_iter()
        .next()
        .ok_or(CashFlowError::SelectionEmpty)?;
    let series = first.series_id;
    let name = validate_series_name(name)?;

    let touched = ledger.rename_series(series, &name);
    Ok(OperationReport {
        created: Vec::new(),
        touched,
    })
}

pub fn clear(ledger: &mut Ledger, colors: &mut ColorAllocator) -> Result<OperationReport> {
    let removed = ledger.clear();
    colors.reset();
    Ok(OperationReport {
        created: Vec::new(),
        touched: removed.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::ClickMode;

    struct Fixture {
        ledger: Ledger,
        ids: IdAllocator,
        colors: ColorAllocator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                ledger: Ledger::new(),
                ids: IdAllocator::new(),
                colors: ColorAllocator::new(),
            }
        }

        fn add(&mut self, name: &str, flows: &[(u32, f64)]) -> SeriesId {
            let tag = SeriesTag::new(self.ids.next_id(), self.colors.acquire(), name);
            self.ledger
                .append(flows.iter().map(|(p, a)| tag.entry(*p, *a)).collect())
                .unwrap();
            tag.id
        }

        fn pick(&self, rows: &[usize]) -> Selection {
            let mut selection = Selection::new();
            for row in rows {
                if !selection.contains(*row) {
                    selection.click(&self.ledger, *row, ClickMode::Peek).unwrap();
                }
            }
            selection
        }

        fn apply(&mut self, op: SeriesOperation, selection: &Selection) -> Result<OperationReport> {
            op.apply(&mut self.ledger, &mut self.ids, &mut self.colors, selection)
        }
    }

    #[test]
    fn test_combine_same_period() {
        let mut fx = Fixture::new();
        fx.add("A", &[(4, 10.0)]);
        fx.add("B", &[(4, -3.0)]);
        fx.add("C", &[(4, 5.0)]);

        let selection = fx.pick(&[0, 1, 2]);
        let report = fx.apply(SeriesOperation::Combine, &selection).unwrap();

        assert_eq!(fx.ledger.len(), 1);
        let combined = &fx.ledger.entries()[0];
        assert_eq!(combined.period, 4);
        assert_eq!(combined.amount, 12.0);
        assert_eq!(combined.series_name, "A + B + C");
        assert_eq!(report.created, vec![combined.series_id]);
    }

    #[test]
    fn test_combine_period_mismatch() {
        let mut fx = Fixture::new();
        fx.add("A", &[(4, 10.0)]);
        fx.add("B", &[(5, 1.0)]);
        let selection = fx.pick(&[0, 1]);
        assert!(matches!(
            fx.apply(SeriesOperation::Combine, &selection),
            Err(CashFlowError::PeriodMismatch { .. })
        ));
        assert_eq!(fx.ledger.len(), 2);
    }

    #[test]
    fn test_combine_needs_two() {
        let mut fx = Fixture::new();
        fx.add("A", &[(4, 10.0)]);
        let selection = fx.pick(&[0]);
        assert!(matches!(
            fx.apply(SeriesOperation::Combine, &selection),
            Err(CashFlowError::InvalidInput { .. })
        ));
        assert!(matches!(
            fx.apply(SeriesOperation::Combine, &Selection::new()),
            Err(CashFlowError::SelectionEmpty)
        ));
    }

    #[test]
    fn test_invert_whole_series() {
        let mut fx = Fixture::new();
        fx.add("A", &[(1, 10.0), (2, -20.0)]);
        fx.add("B", &[(1, 7.0)]);
        let selection = fx.pick(&[1]);
        fx.apply(SeriesOperation::Invert, &selection).unwrap();

        let amounts: Vec<f64> = fx.ledger.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![-10.0, 20.0, 7.0]);
    }

    #[test]
    fn test_delete_selected() {
        let mut fx = Fixture::new();
        fx.add("A", &[(1, 10.0), (2, 10.0)]);
        let b = fx.add("B", &[(3, 5.0)]);
        let selection = fx.pick(&[0]);
        let report = fx.apply(SeriesOperation::Delete, &selection).unwrap();
        assert_eq!(report.touched, 2);
        assert_eq!(fx.ledger.series_ids(), BTreeSet::from([b]));
    }

    #[test]
    fn test_split_five_periods_at_two() {
        let mut fx = Fixture::new();
        let id = fx.add("Lease", &[(0, 1.0), (1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)]);
        let color = fx.ledger.entries()[0].color;

        let selection = fx.pick(&[0]);
        let report = fx
            .apply(SeriesOperation::Split { index: 2 }, &selection)
            .unwrap();
        let new_id = report.created[0];

        let a: Vec<u32> = fx.ledger.entries_for_series(id).iter().map(|e| e.period).collect();
        let b: Vec<u32> = fx.ledger.entries_for_series(new_id).iter().map(|e| e.period).collect();
        assert_eq!(a, vec![0, 1, 2]);
        assert_eq!(b, vec![3, 4]);

        let tag_a = fx.ledger.series_tag(id).unwrap();
        let tag_b = fx.ledger.series_tag(new_id).unwrap();
        assert_eq!(tag_a.name, "Lease_1");
        assert_eq!(tag_a.color, color);
        assert_eq!(tag_b.name, "Lease_2");
        assert_ne!(tag_b.color, color);
        assert!(fx.ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_split_rejections() {
        let mut fx = Fixture::new();
        fx.add("One", &[(0, 1.0)]);
        fx.add("Two", &[(5, 1.0), (6, 1.0)]);

        let single = fx.pick(&[0]);
        assert!(matches!(
            fx.apply(SeriesOperation::Split { index: 0 }, &single),
            Err(CashFlowError::SeriesTooShort { entries: 1 })
        ));

        let pair = fx.pick(&[1]);
        assert!(matches!(
            fx.apply(SeriesOperation::Split { index: 1 }, &pair),
            Err(CashFlowError::InvalidInput { .. })
        ));
        assert!(matches!(
            fx.apply(SeriesOperation::Split { index: usize::MAX }, &pair),
            Err(CashFlowError::InvalidInput { .. })
        ));

        let both = fx.pick(&[0, 1]);
        assert!(matches!(
            fx.apply(SeriesOperation::Split { index: 0 }, &both),
            Err(CashFlowError::AmbiguousSeriesSelection { series: 2 })
        ));
    }

    #[test]
    fn test_rename_uses_first_pick() {
        let mut fx = Fixture::new();
        let a = fx.add("A", &[(1, 1.0), (2, 1.0)]);
        fx.add("B", &[(3, 1.0)]);
        let selection = fx.pick(&[2, 0]);
        fx.apply(
            SeriesOperation::Rename {
                name: "  Bonus ".to_string(),
            },
            &selection,
        )
        .unwrap();
        assert_eq!(fx.ledger.series_tag(a).unwrap().name, "A");
        assert_eq!(fx.ledger.entries()[2].series_name, "Bonus");

        assert!(matches!(
            fx.apply(
                SeriesOperation::Rename {
                    name: " ".to_string()
                },
                &selection
            ),
            Err(CashFlowError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_clear_returns_colors() {
        let mut fx = Fixture::new();
        fx.add("A", &[(1, 1.0)]);
        fx.add("B", &[(2, 1.0)]);
        fx.apply(SeriesOperation::Clear, &Selection::new()).unwrap();
        assert!(fx.ledger.is_empty());
        assert_eq!(fx.colors.in_use_count(), 0);
    }
}
