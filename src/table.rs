use crate::ledger::Ledger;
use crate::schema::{Color, SeriesId};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};

/// One line of the cash flow table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Position of the entry in the ledger, usable as a click target.
    pub index: usize,
    pub series_id: SeriesId,
    pub series_name: String,
    pub period: u32,
    pub amount: f64,
    pub display_amount: String,
    pub color: Color,
}

/// Table rows for `selection`, or for the whole ledger when nothing is
/// selected, sorted by series name and then period.
pub fn rows(ledger: &Ledger, selection: &Selection) -> Vec<TableRow> {
    ledger
        .sorted_indices()
        .into_iter()
        .filter(|i| selection.is_empty() || selection.contains(*i))
        .filter_map(|i| {
            ledger.get(i).map(|e| TableRow {
                index: i,
                series_id: e.series_id,
                series_name: e.series_name.clone(),
                period: e.period,
                amount: e.amount,
                display_amount: format_currency(e.amount),
                color: e.color,
            })
        })
        .collect()
}

/// Formats an amount as dollars with thousands separators, e.g. `-$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
