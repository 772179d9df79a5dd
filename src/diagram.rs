use crate::builders::SeriesSpec;
use crate::color::ColorAllocator;
use crate::commands::{Command, Outcome};
use crate::engine::{self, Placement, TimeValueEngine, TransformPlan};
use crate::error::{CashFlowError, Result};
use crate::history::History;
use crate::ledger::{IdAllocator, Ledger};
use crate::schema::{validate_interest_rate, DiagramSettings, SeriesId};
use crate::selection::{ClickMode, Selection};
use crate::series_ops::SeriesOperation;
use crate::table::{self, TableRow};
use log::{debug, info, warn};
use std::panic::{self, AssertUnwindSafe};

/// One cash flow diagram session: the ledger plus everything that edits it.
///
/// All changes go through [`CashFlowDiagram::execute`]. A command either
/// completes, or fails and leaves the diagram exactly as it was.
#[derive(Debug, Clone)]
pub struct CashFlowDiagram {
    ledger: Ledger,
    selection: Selection,
    history: History,
    ids: IdAllocator,
    colors: ColorAllocator,
    settings: DiagramSettings,
}

impl Default for CashFlowDiagram {
    fn default() -> Self {
        Self::with_settings(DiagramSettings::default())
    }
}

impl CashFlowDiagram {
    pub fn new(settings: DiagramSettings) -> Result<Self> {
        settings.validate()?;
        info!(
            "Created diagram at {}% with make_new_series={}",
            settings.interest_rate, settings.make_new_series
        );
        Ok(Self::with_settings(settings))
    }

    fn with_settings(settings: DiagramSettings) -> Self {
        let ledger = Ledger::new();
        let mut history = History::new(settings.history_capacity);
        history.snapshot(&ledger);
        Self {
            ledger,
            selection: Selection::new(),
            history,
            ids: IdAllocator::new(),
            colors: ColorAllocator::new(),
            settings,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn settings(&self) -> &DiagramSettings {
        &self.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn colors(&self) -> &ColorAllocator {
        &self.colors
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Rows for the table view: the selection if there is one, else everything.
    pub fn table(&self) -> Vec<TableRow> {
        table::rows(&self.ledger, &self.selection)
    }

    /// Runs one command. On any error, including a panic inside a core
    /// operation, the diagram is restored to its state before the call.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        let kind = command.kind();
        let backup = self.clone();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(command)))
            .unwrap_or_else(|payload| Err(CashFlowError::Internal(panic_message(payload))));

        match result {
            Ok(outcome) => {
                if outcome.ledger_changed {
                    info!(
                        "{} done: {} cash flows in {} series",
                        kind.label(),
                        self.ledger.len(),
                        self.ledger.series_ids().len()
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("{} failed: {}", kind.label(), e);
                *self = backup;
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        let kind = command.kind();
        if let Some(operation) = command.series_operation() {
            let created = self.mutate(|d| d.series_operation(&operation))?;
            return Ok(Outcome::changed(kind, created));
        }

        match command {
            Command::AddSeries { series } => {
                let created = self.mutate(|d| d.add(&series))?;
                Ok(Outcome::changed(kind, created))
            }
            Command::PresentValue { target_period } => {
                let created = self.mutate(|d| {
                    let engine = TimeValueEngine::from_settings(&d.settings)?;
                    let plan = engine.plan_present_value(&d.selection.resolve(&d.ledger), target_period)?;
                    d.place(plan)
                })?;
                Ok(Outcome::changed(kind, created))
            }
            Command::FutureValue { target_period } => {
                let created = self.mutate(|d| {
                    let engine = TimeValueEngine::from_settings(&d.settings)?;
                    let plan = engine.plan_future_value(&d.selection.resolve(&d.ledger), target_period)?;
                    d.place(plan)
                })?;
                Ok(Outcome::changed(kind, created))
            }
            Command::AnnualValue { periods } => {
                let created = self.mutate(|d| {
                    let engine = TimeValueEngine::from_settings(&d.settings)?;
                    let plan = engine.plan_annual_value(&d.selection.resolve(&d.ledger), periods)?;
                    d.place(plan)
                })?;
                Ok(Outcome::changed(kind, created))
            }
            Command::Undo => {
                self.undo()?;
                Ok(Outcome::changed(kind, Vec::new()))
            }
            Command::SetInterestRate { percent } => {
                validate_interest_rate(percent)?;
                self.settings.interest_rate = percent;
                debug!("Interest rate set to {}%", percent);
                Ok(Outcome::new(kind))
            }
            Command::SetMakeNewSeries { enabled } => {
                self.settings.make_new_series = enabled;
                debug!("make_new_series set to {}", enabled);
                Ok(Outcome::new(kind))
            }
            Command::Click { index, mode } => {
                self.selection.click(&self.ledger, index, mode)?;
                Ok(Outcome::new(kind))
            }
            Command::SelectSeries { series } => {
                self.selection.select_series(&self.ledger, series)?;
                Ok(Outcome::new(kind))
            }
            Command::ClearSelection => {
                self.selection.clear();
                Ok(Outcome::new(kind))
            }
            Command::Combine
            | Command::Invert
            | Command::Delete
            | Command::Split { .. }
            | Command::Rename { .. }
            | Command::Clear => Err(CashFlowError::Internal(format!(
                "{} was not routed as a series operation",
                kind.label()
            ))),
        }
    }

    /// Wraps a ledger change with the bookkeeping every change needs:
    /// snapshots on both sides, color reconciliation, invariant checks and
    /// clearing the selection.
    fn mutate<F>(&mut self, change: F) -> Result<Vec<SeriesId>>
    where
        F: FnOnce(&mut Self) -> Result<Vec<SeriesId>>,
    {
        self.history.snapshot(&self.ledger);
        let created = change(self)?;
        self.colors.reconcile(self.ledger.live_colors());
        self.ledger.check_invariants()?;
        self.selection.clear();
        self.history.snapshot(&self.ledger);
        Ok(created)
    }

    fn add(&mut self, spec: &SeriesSpec) -> Result<Vec<SeriesId>> {
        let id = self.ids.next_id();
        let color = self.colors.acquire();
        let entries = spec.build(color, id)?;
        debug!("Adding {} series {} with {} cash flows", spec.kind(), id, entries.len());
        self.ledger.append(entries)?;
        Ok(vec![id])
    }

    fn place(&mut self, plan: TransformPlan) -> Result<Vec<SeriesId>> {
        let placement = Placement::from_settings(&self.settings);
        let report = engine::place(
            plan,
            placement,
            &mut self.ledger,
            &mut self.ids,
            &mut self.colors,
        )?;
        Ok(if report.created_series {
            vec![report.series_id]
        } else {
            Vec::new()
        })
    }

    fn series_operation(&mut self, operation: &SeriesOperation) -> Result<Vec<SeriesId>> {
        let report = operation.apply(
            &mut self.ledger,
            &mut self.ids,
            &mut self.colors,
            &self.selection,
        )?;
        Ok(report.created)
    }

    fn undo(&mut self) -> Result<()> {
        let restored = self.history.undo()?;
        self.ledger = restored;
        self.colors.reconcile(self.ledger.live_colors());
        self.ledger.check_invariants()?;
        self.selection.clear();
        Ok(())
    }

    pub fn add_series(&mut self, spec: SeriesSpec) -> Result<Outcome> {
        self.execute(Command::AddSeries { series: spec })
    }

    pub fn click(&mut self, index: usize, mode: ClickMode) -> Result<Outcome> {
        self.execute(Command::Click { index, mode })
    }

    pub fn select_series(&mut self, series: SeriesId) -> Result<Outcome> {
        self.execute(Command::SelectSeries { series })
    }

    pub fn present_value(&mut self, target_period: Option<i64>) -> Result<Outcome> {
        self.execute(Command::PresentValue { target_period })
    }

    pub fn future_value(&mut self, target_period: Option<i64>) -> Result<Outcome> {
        self.execute(Command::FutureValue { target_period })
    }

    pub fn annual_value(&mut self, periods: i64) -> Result<Outcome> {
        self.execute(Command::AnnualValue { periods })
    }

    pub fn undo_last(&mut self) -> Result<Outcome> {
        self.execute(Command::Undo)
    }

    pub fn set_interest_rate(&mut self, percent: f64) -> Result<Outcome> {
        self.execute(Command::SetInterestRate { percent })
    }

    pub fn set_make_new_series(&mut self, enabled: bool) -> Result<Outcome> {
        self.execute(Command::SetMakeNewSeries { enabled })
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("operation panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("operation panicked: {}", s)
    } else {
        "operation panicked".to_string()
    }
}
