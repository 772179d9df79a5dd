use crate::builders::SeriesSpec;
use crate::schema::SeriesId;
use crate::selection::ClickMode;
use crate::series_ops::SeriesOperation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything the presentation layer can ask a diagram to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Add a single cash flow or a uniform, gradient or geometric series.
    AddSeries { series: SeriesSpec },

    /// Move the selection back in time. `target_period` is only read when a
    /// single cash flow is selected.
    PresentValue { target_period: Option<i64> },

    /// Move the selection forward in time. `target_period` is only read when a
    /// single cash flow is selected.
    FutureValue { target_period: Option<i64> },

    /// Spread one selected cash flow over `periods` equal payments.
    AnnualValue { periods: i64 },

    Combine,
    Invert,
    Delete,
    Split { index: usize },
    Rename { name: String },
    Clear,
    Undo,

    /// Interest rate per period as a percentage, between -100 and 100.
    SetInterestRate { percent: f64 },

    SetMakeNewSeries { enabled: bool },

    Click { index: usize, mode: ClickMode },
    SelectSeries { series: SeriesId },
    ClearSelection,
}

/// Identifier of a command, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    AddSeries,
    PresentValue,
    FutureValue,
    AnnualValue,
    Combine,
    Invert,
    Delete,
    Split,
    Rename,
    Clear,
    Undo,
    SetInterestRate,
    SetMakeNewSeries,
    Click,
    SelectSeries,
    ClearSelection,
}

/// Menu metadata for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub kind: CommandKind,
    pub label: &'static str,
    pub description: &'static str,
    pub mutates_ledger: bool,
}

impl CommandEntry {
    pub const fn new(
        kind: CommandKind,
        label: &'static str,
        description: &'static str,
        mutates_ledger: bool,
    ) -> Self {
        Self {
            kind,
            label,
            description,
            mutates_ledger,
        }
    }
}

pub const COMMANDS: [CommandEntry; 16] = [
    CommandEntry::new(CommandKind::AddSeries, "Add Series", "Add a single cash flow or a uniform, gradient or geometric series", true),
    CommandEntry::new(CommandKind::PresentValue, "Present Value", "Discount the selection to an earlier period", true),
    CommandEntry::new(CommandKind::FutureValue, "Future Value", "Compound the selection to a later period", true),
    CommandEntry::new(CommandKind::AnnualValue, "Annual Value", "Convert one cash flow into equal payments", true),
    CommandEntry::new(CommandKind::Combine, "Combine Cash Flows", "Sum cash flows that share a period", true),
    CommandEntry::new(CommandKind::Invert, "Invert Series", "Flip inflows and outflows of the selected series", true),
    CommandEntry::new(CommandKind::Delete, "Delete Selection", "Remove the selected cash flows", true),
    CommandEntry::new(CommandKind::Split, "Split Series", "Cut the selected series in two", true),
    CommandEntry::new(CommandKind::Rename, "Rename", "Rename the selected series", true),
    CommandEntry::new(CommandKind::Clear, "Clear", "Remove every cash flow", true),
    CommandEntry::new(CommandKind::Undo, "Undo", "Restore the diagram before the last change", true),
    CommandEntry::new(CommandKind::SetInterestRate, "Interest Rate", "Set the interest rate used by every transform", false),
    CommandEntry::new(CommandKind::SetMakeNewSeries, "Make New Series", "Choose whether transforms keep their sources", false),
    CommandEntry::new(CommandKind::Click, "Select", "Select or deselect a cash flow", false),
    CommandEntry::new(CommandKind::SelectSeries, "Select Series", "Select every cash flow of a series", false),
    CommandEntry::new(CommandKind::ClearSelection, "Clear Selection", "Deselect everything", false),
];

impl CommandKind {
    pub fn entry(&self) -> &'static CommandEntry {
        let position = COMMANDS
            .iter()
            .position(|e| e.kind == *self)
            .unwrap_or(0);
        &COMMANDS[position]
    }

    pub fn label(&self) -> &'static str {
        self.entry().label
    }

    pub fn mutates_ledger(&self) -> bool {
        self.entry().mutates_ledger
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AddSeries { .. } => CommandKind::AddSeries,
            Command::PresentValue { .. } => CommandKind::PresentValue,
            Command::FutureValue { .. } => CommandKind::FutureValue,
            Command::AnnualValue { .. } => CommandKind::AnnualValue,
            Command::Combine => CommandKind::Combine,
            Command::Invert => CommandKind::Invert,
            Command::Delete => CommandKind::Delete,
            Command::Split { .. } => CommandKind::Split,
            Command::Rename { .. } => CommandKind::Rename,
            Command::Clear => CommandKind::Clear,
            Command::Undo => CommandKind::Undo,
            Command::SetInterestRate { .. } => CommandKind::SetInterestRate,
            Command::SetMakeNewSeries { .. } => CommandKind::SetMakeNewSeries,
            Command::Click { .. } => CommandKind::Click,
            Command::SelectSeries { .. } => CommandKind::SelectSeries,
            Command::ClearSelection => CommandKind::ClearSelection,
        }
    }

    /// The series edit this command stands for, if it is one.
    pub fn series_operation(&self) -> Option<SeriesOperation> {
        match self {
            Command::Combine => Some(SeriesOperation::Combine),
            Command::Invert => Some(SeriesOperation::Invert),
            Command::Delete => Some(SeriesOperation::Delete),
            Command::Split { index } => Some(SeriesOperation::Split { index: *index }),
            Command::Rename { name } => Some(SeriesOperation::Rename { name: name.clone() }),
            Command::Clear => Some(SeriesOperation::Clear),
            _ => None,
        }
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Command)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// What a successful command did, so the presentation layer knows what to redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub kind: CommandKind,
    pub ledger_changed: bool,
    pub created: Vec<SeriesId>,
}

impl Outcome {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            ledger_changed: false,
            created: Vec::new(),
        }
    }

    pub fn changed(kind: CommandKind, created: Vec<SeriesId>) -> Self {
        Self {
            kind,
            ledger_changed: true,
            created,
        }
    }
}
