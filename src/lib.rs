//! # Cash Flow Diagram
//!
//! A ledger and time-value-of-money engine for engineering-economics cash
//! flow diagrams. Cash flows sit at integer periods 0..=100 and are grouped
//! into series that share one color and one name.
//!
//! ## Core Concepts
//!
//! - **Ledger**: Every cash flow on the diagram, in insertion order
//! - **Series**: Entries added or produced together; selected and edited as a unit
//! - **Transforms**: Present, future and annual value at one interest rate per period
//! - **Placement**: Results either replace their sources or form a new series
//! - **History**: Bounded undo over ledger snapshots
//!
//! ## Example
//!
//! ```rust,ignore
//! use cash_flow_diagram::*;
//!
//! let mut diagram = CashFlowDiagram::new(DiagramSettings {
//!     interest_rate: 10.0,
//!     make_new_series: true,
//!     ..DiagramSettings::default()
//! })?;
//!
//! diagram.add_series(SeriesSpec::Uniform(UniformSeries {
//!     start: 1,
//!     length: 3,
//!     amount: 100.0,
//!     name: "Lease".to_string(),
//! }))?;
//!
//! diagram.click(0, ClickMode::Toggle)?;
//! diagram.present_value(None)?;
//!
//! for row in diagram.table() {
//!     println!("{} @ {}: {}", row.series_name, row.period, row.display_amount);
//! }
//! ```

pub mod builders;
pub mod color;
pub mod commands;
pub mod diagram;
pub mod engine;
pub mod error;
pub mod history;
pub mod ledger;
pub mod schema;
pub mod selection;
pub mod series_ops;
pub mod table;
pub mod utils;

pub use builders::SeriesSpec;
pub use color::{synthesized_color, ColorAllocator, BASE_PALETTE};
pub use commands::{Command, CommandEntry, CommandKind, Outcome, COMMANDS};
pub use diagram::CashFlowDiagram;
pub use engine::{Placement, TimeValueEngine, Transform, TransformPlan, TransformReport};
pub use error::{CashFlowError, Result};
pub use history::History;
pub use ledger::{IdAllocator, Ledger, SeriesTag};
pub use schema::*;
pub use selection::{ClickMode, Selection};
pub use series_ops::{OperationReport, SeriesOperation};
pub use table::{format_currency, TableRow};
pub use utils::*;

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A recorded session: settings plus the commands to run against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    #[serde(default)]
    pub settings: DiagramSettings,
    pub commands: Vec<Command>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&schemars::schema_for!(Script))
    }
}

/// Builds a diagram by running `script` from the top. Stops at the first
/// failing command and returns its error.
pub fn replay(script: &Script) -> Result<CashFlowDiagram> {
    let mut diagram = CashFlowDiagram::new(script.settings.clone())?;
    info!("Replaying {} commands", script.commands.len());

    for (step, command) in script.commands.iter().enumerate() {
        debug!("Step {}: {}", step, command.kind().label());
        diagram.execute(command.clone())?;
    }

    Ok(diagram)
}
