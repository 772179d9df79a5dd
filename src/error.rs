use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashFlowError {
    #[error("Invalid {field}: {details}")]
    InvalidInput { field: String, details: String },

    #[error("Please select a cash flow or series first")]
    SelectionEmpty,

    #[error("Selection spans {series} series; please select only one series")]
    AmbiguousSeriesSelection { series: usize },

    #[error("Please select only one cash flow ({selected} are selected)")]
    SingleEntryRequired { selected: usize },

    #[error("Cannot move a cash flow from period {source_period} to period {target} with the {transform} transform; use the {alternative} transform instead")]
    IllegalDirection {
        transform: String,
        alternative: String,
        source_period: u32,
        target: i64,
    },

    #[error("Period {period} is outside the diagram range 0..=100")]
    PeriodOutOfRange { period: i64 },

    #[error("Selected cash flows must share one period to be combined (found periods {periods:?})")]
    PeriodMismatch { periods: Vec<u32> },

    #[error("Cannot split a series with {entries} cash flow(s)")]
    SeriesTooShort { entries: usize },

    #[error("No cash flow at row {index}")]
    NoSuchEntry { index: usize },

    #[error("No more actions to undo")]
    NothingToUndo,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CashFlowError {
    pub fn invalid(field: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CashFlowError>;
