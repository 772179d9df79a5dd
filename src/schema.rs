use crate::error::{CashFlowError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earliest period shown on the diagram.
pub const MIN_PERIOD: i64 = 0;
/// Latest period shown on the diagram.
pub const MAX_PERIOD: i64 = 100;

/// Number of ledger snapshots kept for undo unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Opaque display color handle. Two live series never share one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from HSV components, each in `0.0..=1.0`.
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let h = (hue.rem_euclid(1.0)) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * f);
        let t = value * (1.0 - saturation * (1.0 - f));

        let (r, g, b) = match sector as u8 {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };

        let to_byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(to_byte(r), to_byte(g), to_byte(b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identifier shared by every entry of one series. Ids are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SeriesId(pub u64);

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One dated cash flow on the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entry {
    #[schemars(description = "Period on the diagram's x-axis, 0 to 100")]
    pub period: u32,

    #[schemars(description = "Signed monetary value. Positive is an inflow, negative an outflow.")]
    pub amount: f64,

    pub color: Color,

    pub series_id: SeriesId,

    #[schemars(description = "Display label shared by every entry of the series")]
    pub series_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SingleCashFlow {
    #[schemars(description = "Period of the cash flow (0-100)")]
    pub period: i64,
    #[schemars(description = "Non-zero amount")]
    pub amount: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UniformSeries {
    #[schemars(description = "Period of the first payment (0-100)")]
    pub start: i64,
    #[schemars(description = "Number of payments, at least 1")]
    pub length: i64,
    #[schemars(description = "Non-zero amount repeated every period")]
    pub amount: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GradientSeries {
    #[schemars(description = "Period of the first (always zero) payment")]
    pub start: i64,
    #[schemars(description = "Number of payments, at least 1")]
    pub length: i64,
    #[schemars(description = "Amount added at every subsequent period")]
    pub step: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeometricSeries {
    #[schemars(description = "Period of the first payment (0-100)")]
    pub start: i64,
    #[schemars(description = "Number of payments, at least 1")]
    pub length: i64,
    #[schemars(description = "Non-zero amount of the first payment")]
    pub initial: f64,
    #[schemars(description = "Growth per period as a decimal (0.05 = 5%)")]
    pub growth: f64,
    pub name: String,
}

/// Session configuration for a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagramSettings {
    #[serde(default = "default_interest_rate")]
    #[schemars(description = "Interest rate per period as a percentage, between -100 and 100")]
    pub interest_rate: f64,

    #[serde(default)]
    #[schemars(
        description = "If true, transforms produce a new series and leave their sources in place. If false, the result replaces the selected cash flows."
    )]
    pub make_new_series: bool,

    #[serde(default = "default_history_capacity")]
    #[schemars(description = "Number of ledger snapshots kept for undo")]
    pub history_capacity: usize,
}

fn default_interest_rate() -> f64 {
    5.0
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self {
            interest_rate: default_interest_rate(),
            make_new_series: false,
            history_capacity: default_history_capacity(),
        }
    }
}

impl DiagramSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: DiagramSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        validate_interest_rate(self.interest_rate)?;
        if self.history_capacity == 0 {
            return Err(CashFlowError::invalid(
                "history capacity",
                "must keep at least one snapshot",
            ));
        }
        Ok(())
    }

    /// Interest rate as a decimal fraction.
    pub fn rate(&self) -> f64 {
        self.interest_rate / 100.0
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DiagramSettings)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

pub fn validate_interest_rate(percent: f64) -> Result<()> {
    if !percent.is_finite() || !(-100.0..=100.0).contains(&percent) {
        return Err(CashFlowError::invalid(
            "interest rate",
            format!("{} is not a number between -100 and 100", percent),
        ));
    }
    Ok(())
}
