use crate::color::ColorAllocator;
use crate::error::{CashFlowError, Result};
use crate::ledger::{IdAllocator, Ledger, SeriesTag};
use crate::schema::{DiagramSettings, Entry, SeriesId, MAX_PERIOD};
use crate::utils::{validate_finite, validate_period};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    PresentValue,
    FutureValue,
    AnnualValue,
}

impl Transform {
    /// Prefix used when a transform result becomes its own series.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Transform::PresentValue => "PV",
            Transform::FutureValue => "FV",
            Transform::AnnualValue => "AV",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transform::PresentValue => "present value",
            Transform::FutureValue => "future value",
            Transform::AnnualValue => "annual value",
        }
    }
}

/// Where a transform's result lands in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Result becomes a new series; the sources stay.
    NewSeries,
    /// Result takes over the source series' identity and the sources are removed.
    InPlace,
}

impl Placement {
    pub fn from_settings(settings: &DiagramSettings) -> Self {
        if settings.make_new_series {
            Placement::NewSeries
        } else {
            Placement::InPlace
        }
    }
}

/// A computed transform that has not touched the ledger yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    pub transform: Transform,
    pub source_indices: BTreeSet<usize>,
    pub source: SeriesTag,
    /// `(period, amount)` of every result entry, in period order.
    pub results: Vec<(u32, f64)>,
}

/// What a placed transform did to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    pub series_id: SeriesId,
    pub created_series: bool,
    pub removed: usize,
    pub added: usize,
}

/// Time-value-of-money arithmetic at one interest rate per period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeValueEngine {
    rate: f64,
}

impl TimeValueEngine {
    /// `rate` is a decimal fraction and must stay above -1.
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(CashFlowError::invalid(
                "interest rate",
                format!("{}% leaves no value to discount; it must be above -100%", rate * 100.0),
            ));
        }
        Ok(Self { rate })
    }

    pub fn from_settings(settings: &DiagramSettings) -> Result<Self> {
        Self::new(settings.rate())
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Moves `amount` by `n` periods: `amount * (1 + r)^n`. Negative `n`
    /// discounts, positive `n` compounds.
    pub fn shift(&self, amount: f64, n: i64) -> f64 {
        amount * (1.0 + self.rate).powf(n as f64)
    }

    pub fn present_value(&self, amount: f64, source_period: u32, target_period: i64) -> f64 {
        self.shift(amount, target_period - source_period as i64)
    }

    pub fn future_value(&self, amount: f64, source_period: u32, target_period: i64) -> f64 {
        self.shift(amount, target_period - source_period as i64)
    }

    /// Uniform payment over `n` periods equivalent to `present` one period
    /// before the first payment.
    pub fn annual_value(&self, present: f64, n: i64) -> Result<f64> {
        if n < 1 {
            return Err(CashFlowError::invalid(
                "number of periods",
                format!("{} is not a positive number of periods", n),
            ));
        }
        let payment = if self.rate == 0.0 {
            present / n as f64
        } else {
            // 1 - (1 + r)^-n, kept accurate when r is tiny
            let discount = -(-(n as f64) * self.rate.ln_1p()).exp_m1();
            present * self.rate / discount
        };
        validate_finite("annual value", payment)
    }

    /// Sum of every flow moved to `target`.
    pub fn superpose(&self, flows: &[(u32, f64)], target: i64) -> f64 {
        flows
            .iter()
            .map(|(period, amount)| self.shift(*amount, target - *period as i64))
            .sum()
    }

    /// Present value of the selected rows.
    ///
    /// One row: moved to the caller's `target`. Several rows of one series:
    /// combined one period before the earliest row, and `target` is ignored.
    pub fn plan_present_value(
        &self,
        selected: &[(usize, &Entry)],
        target: Option<i64>,
    ) -> Result<TransformPlan> {
        self.plan_lump_sum(Transform::PresentValue, selected, target)
    }

    /// Future value of the selected rows.
    ///
    /// One row: moved to the caller's `target`. Several rows of one series:
    /// combined at the latest row's period.
    pub fn plan_future_value(
        &self,
        selected: &[(usize, &Entry)],
        target: Option<i64>,
    ) -> Result<TransformPlan> {
        self.plan_lump_sum(Transform::FutureValue, selected, target)
    }

    /// Spreads one selected row into `periods` equal payments starting the
    /// period after it.
    pub fn plan_annual_value(
        &self,
        selected: &[(usize, &Entry)],
        periods: i64,
    ) -> Result<TransformPlan> {
        let (index, entry) = match selected {
            [] => return Err(CashFlowError::SelectionEmpty),
            [single] => *single,
            many => {
                return Err(CashFlowError::SingleEntryRequired {
                    selected: many.len(),
                })
            }
        };

        if periods < 1 {
            return Err(CashFlowError::invalid(
                "number of periods",
                format!("{} is not a positive number of periods", periods),
            ));
        }

        let last = (entry.period as i64).saturating_add(periods);
        if last > MAX_PERIOD {
            return Err(CashFlowError::PeriodOutOfRange { period: last });
        }

        let payment = self.annual_value(entry.amount, periods)?;
        debug!(
            "Annual value of {} at period {} over {} periods: {}",
            entry.amount, entry.period, periods, payment
        );

        Ok(TransformPlan {
            transform: Transform::AnnualValue,
            source_indices: BTreeSet::from([index]),
            source: SeriesTag::of(entry),
            results: (entry.period + 1..=last as u32)
                .map(|p| (p, payment))
                .collect(),
        })
    }

    fn plan_lump_sum(
        &self,
        transform: Transform,
        selected: &[(usize, &Entry)],
        target: Option<i64>,
    ) -> Result<TransformPlan> {
        let first = selected.first().ok_or(CashFlowError::SelectionEmpty)?.1;

        let series: BTreeSet<SeriesId> = selected.iter().map(|(_, e)| e.series_id).collect();
        if series.len() > 1 {
            return Err(CashFlowError::AmbiguousSeriesSelection {
                series: series.len(),
            });
        }

        let earliest = selected.iter().map(|(_, e)| e.period).min().unwrap_or(0);
        let latest = selected.iter().map(|(_, e)| e.period).max().unwrap_or(0);

        let target = if selected.len() == 1 {
            target.ok_or_else(|| {
                CashFlowError::invalid("target period", "enter the period to move the cash flow to")
            })?
        } else {
            let fixed = match transform {
                Transform::PresentValue => earliest as i64 - 1,
                _ => latest as i64,
            };
            debug!(
                "{} of {} rows from series {}: target fixed at period {}",
                transform.abbreviation(),
                selected.len(),
                first.series_id,
                fixed
            );
            fixed
        };

        match transform {
            Transform::PresentValue if target > earliest as i64 => {
                return Err(CashFlowError::IllegalDirection {
                    transform: Transform::PresentValue.label().to_string(),
                    alternative: Transform::FutureValue.label().to_string(),
                    source_period: earliest,
                    target,
                });
            }
            Transform::FutureValue if target < latest as i64 => {
                return Err(CashFlowError::IllegalDirection {
                    transform: Transform::FutureValue.label().to_string(),
                    alternative: Transform::PresentValue.label().to_string(),
                    source_period: latest,
                    target,
                });
            }
            _ => {}
        }

        let period = validate_period(target)?;
        let flows: Vec<(u32, f64)> = selected.iter().map(|(_, e)| (e.period, e.amount)).collect();
        let amount = validate_finite(
            &format!("{} amount", transform.abbreviation()),
            self.superpose(&flows, target),
        )?;

        Ok(TransformPlan {
            transform,
            source_indices: selected.iter().map(|(i, _)| *i).collect(),
            source: SeriesTag::of(first),
            results: vec![(period, amount)],
        })
    }
}

/// Writes a plan into the ledger according to `placement`.
pub fn place(
    plan: TransformPlan,
    placement: Placement,
    ledger: &mut Ledger,
    ids: &mut IdAllocator,
    colors: &mut ColorAllocator,
) -> Result<TransformReport> {
    let (tag, removed, created_series) = match placement {
        Placement::NewSeries => {
            let name = format!("{} of {}", plan.transform.abbreviation(), plan.source.name);
            (SeriesTag::new(ids.next_id(), colors.acquire(), name), 0, true)
        }
        Placement::InPlace => {
            let removed = ledger.remove_by_indices(&plan.source_indices);
            (plan.source.clone(), removed.len(), false)
        }
    };

    let entries: Vec<Entry> = plan
        .results
        .iter()
        .map(|(period, amount)| tag.entry(*period, *amount))
        .collect();
    let added = entries.len();
    ledger.append(entries)?;

    Ok(TransformReport {
        series_id: tag.id,
        created_series,
        removed,
        added,
    })
}
