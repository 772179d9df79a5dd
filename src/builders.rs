//! Generators for the four kinds of user-entered series.
//!
//! Each builder validates all of its inputs before producing anything, then
//! returns the entries in period order, tagged with the series id and color
//! the caller allocated.

use crate::error::Result;
use crate::ledger::SeriesTag;
use crate::schema::{
    Color, Entry, GeometricSeries, GradientSeries, SeriesId, SingleCashFlow, UniformSeries,
};
use crate::utils::{
    validate_amount, validate_finite, validate_period, validate_series_name, validate_span,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Any series a user can add to the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesSpec {
    Single(SingleCashFlow),
    Uniform(UniformSeries),
    Gradient(GradientSeries),
    Geometric(GeometricSeries),
}

impl SeriesSpec {
    pub fn build(&self, color: Color, id: SeriesId) -> Result<Vec<Entry>> {
        match self {
            SeriesSpec::Single(p) => build_single(p, color, id),
            SeriesSpec::Uniform(p) => build_uniform(p, color, id),
            SeriesSpec::Gradient(p) => build_gradient(p, color, id),
            SeriesSpec::Geometric(p) => build_geometric(p, color, id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SeriesSpec::Single(_) => "single",
            SeriesSpec::Uniform(_) => "uniform",
            SeriesSpec::Gradient(_) => "gradient",
            SeriesSpec::Geometric(_) => "geometric",
        }
    }
}

pub fn build_single(params: &SingleCashFlow, color: Color, id: SeriesId) -> Result<Vec<Entry>> {
    let period = validate_period(params.period)?;
    let amount = validate_amount("cash flow", params.amount)?;
    let tag = SeriesTag::new(id, color, validate_series_name(&params.name)?);

    Ok(vec![tag.entry(period, amount)])
}

pub fn build_uniform(params: &UniformSeries, color: Color, id: SeriesId) -> Result<Vec<Entry>> {
    let (first, last) = validate_span(params.start, params.length)?;
    let amount = validate_amount("cash flow", params.amount)?;
    let tag = SeriesTag::new(id, color, validate_series_name(&params.name)?);

    Ok((first..=last).map(|p| tag.entry(p, amount)).collect())
}

/// Entry `k` is `k * step`, so the first payment is always zero.
pub fn build_gradient(params: &GradientSeries, color: Color, id: SeriesId) -> Result<Vec<Entry>> {
    let (first, last) = validate_span(params.start, params.length)?;
    let step = validate_finite("gradient step", params.step)?;
    let tag = SeriesTag::new(id, color, validate_series_name(&params.name)?);

    (first..=last)
        .map(|p| -> Result<Entry> {
            let amount = validate_finite("gradient amount", (p - first) as f64 * step)?;
            Ok(tag.entry(p, amount))
        })
        .collect()
}

/// Entry `k` is `initial * (1 + growth)^k`.
pub fn build_geometric(
    params: &GeometricSeries,
    color: Color,
    id: SeriesId,
) -> Result<Vec<Entry>> {
    let (first, last) = validate_span(params.start, params.length)?;
    let initial = validate_amount("initial value", params.initial)?;
    let growth = validate_finite("growth rate", params.growth)?;
    let tag = SeriesTag::new(id, color, validate_series_name(&params.name)?);

    (first..=last)
        .map(|p| -> Result<Entry> {
            let amount = validate_finite(
                "geometric amount",
                initial * (1.0 + growth).powi((p - first) as i32),
            )?;
            Ok(tag.entry(p, amount))
        })
        .collect()
}
