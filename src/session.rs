use std::sync::Arc;

use tokio::sync::mpsc::{Receiver, Sender, UnboundedSender};
use tokio::time::Duration;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::SimulationError;
use crate::logging::{log_event, log_warning};
use crate::message::{
    RecomputeMessage, ResultMessage, SelectionEvent, SimulationOutcome, SimulationRequest,
};
use crate::sanitize;
use crate::state::SimulationState;

/// Simulation form state plus bookkeeping for out-of-order results.
///
/// Every request is stamped with a fresh generation; an outcome is only accepted
/// if it answers the most recently issued request.
#[derive(Debug)]
pub struct SimulationSession {
    catalog: Arc<Catalog>,
    state: SimulationState,
    generation: u64,
    latest: Option<SimulationOutcome>,
}

impl SimulationSession {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: SimulationState::new(),
            generation: 0,
            latest: None,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last accepted outcome
    pub fn latest(&self) -> Option<&SimulationOutcome> {
        self.latest.as_ref()
    }

    /// Apply one form edit. Ids that are not in the catalog leave the state untouched.
    pub fn apply_event(&mut self, event: SelectionEvent) -> Result<(), SimulationError> {
        match event {
            SelectionEvent::AddTreatment {
                treatment_id,
                quantity,
            } => {
                let treatment = self.catalog.treatment(&treatment_id)?.clone();
                self.state.add_treatment(treatment, quantity);
            }
            SelectionEvent::SetQuantity {
                treatment_id,
                quantity,
            } => {
                if !self.state.set_quantity(&treatment_id, quantity) {
                    return Err(SimulationError::UnknownTreatment(treatment_id));
                }
            }
            SelectionEvent::RemoveTreatment { treatment_id } => {
                if !self.state.remove_treatment(&treatment_id) {
                    return Err(SimulationError::UnknownTreatment(treatment_id));
                }
            }
            SelectionEvent::SelectPlan { plan_id } => {
                let plan = plan_id
                    .map(|id| self.catalog.plan(&id).cloned())
                    .transpose()?;
                self.state.select_plan(plan);
            }
            SelectionEvent::SetDiscountPercentage { value } => {
                self.state
                    .set_discount_percentage(sanitize::parse_percentage(&value));
            }
            SelectionEvent::SetFixedDiscount { value } => {
                self.state.set_fixed_discount(sanitize::parse_amount(&value));
            }
            SelectionEvent::SelectFinancing { financing_id } => {
                let option = financing_id
                    .map(|id| self.catalog.financing(&id).cloned())
                    .transpose()?;
                self.state.select_financing(option);
            }
            SelectionEvent::SelectTerm { term_months } => {
                if !self.state.select_term(term_months) {
                    let option_id = self
                        .state
                        .financing()
                        .map_or_else(|| "-".to_string(), |f| f.id.clone());
                    return match term_months {
                        Some(0) => Err(SimulationError::InvalidTerm),
                        Some(term) => Err(SimulationError::TermNotOffered { option_id, term }),
                        None => Ok(()),
                    };
                }
            }
            SelectionEvent::Clear => self.state.clear(),
        }
        Ok(())
    }

    /// Snapshot the current state as a new request, superseding all earlier ones.
    pub fn next_request(&mut self) -> SimulationRequest {
        self.generation += 1;
        SimulationRequest {
            generation: self.generation,
            inputs: self.state.inputs(),
            financing: self.state.financing().cloned(),
            term_months: self.state.term_months(),
        }
    }

    /// Keep the outcome only if it answers the latest request. Returns whether it was kept.
    pub fn accept(&mut self, outcome: SimulationOutcome) -> bool {
        if outcome.generation != self.generation {
            return false;
        }
        self.latest = Some(outcome);
        true
    }
}

/// Session task: applies form edits, asks the worker to recompute, keeps the freshest result.
///
/// Requests go out on an unbounded channel so the session never waits on the worker.
///
/// Each accepted outcome is also forwarded to `notify` when given, until its
/// receiver goes away. Once `events_rx`
/// is exhausted the request channel is closed and remaining results are drained
/// before the session is handed back.
pub async fn run_session(
    config: Config,
    catalog: Arc<Catalog>,
    mut events_rx: Receiver<SelectionEvent>,
    recompute_tx: UnboundedSender<RecomputeMessage>,
    mut results_rx: Receiver<ResultMessage>,
    mut notify: Option<Sender<SimulationOutcome>>,
) -> anyhow::Result<SimulationSession> {
    let verbose = config.verbose;
    if verbose {
        log_event("session", "-", "start", "Starting session task");
    }
    let mut ticker = (config.ingest_rate_ms > 0)
        .then(|| tokio::time::interval(Duration::from_millis(config.ingest_rate_ms)));
    let mut session = SimulationSession::new(catalog);
    let mut recompute_tx = Some(recompute_tx);

    loop {
        tokio::select! {
            event = events_rx.recv(), if recompute_tx.is_some() => {
                let Some(event) = event else {
                    // no more edits: let the worker flush and hang up
                    recompute_tx = None;
                    continue;
                };
                if let Some(ticker) = ticker.as_mut() {
                    ticker.tick().await;
                }
                if verbose {
                    log_event("session", &session.generation.to_string(), "event", &format!("{:?}", event));
                }
                if let Err(e) = session.apply_event(event) {
                    log_warning("session", &session.generation.to_string(), &format!("Event skipped: {}", e));
                    continue;
                }
                let request = session.next_request();
                if let Some(tx) = &recompute_tx {
                    if tx.send(RecomputeMessage::Recompute(request)).is_err() {
                        return Err(anyhow::anyhow!("Recompute channel dropped"));
                    }
                }
            }
            message = results_rx.recv() => {
                let Some(ResultMessage::Computed(outcome)) = message else {
                    break;
                };
                let generation = outcome.generation;
                if session.accept(outcome.clone()) {
                    if verbose {
                        log_event("session", &generation.to_string(), "accepted", "Applied latest outcome");
                    }
                    let delivered = match &notify {
                        Some(tx) => tx.send(outcome).await.is_ok(),
                        None => true,
                    };
                    if !delivered {
                        log_warning("session", &generation.to_string(), "Notify receiver dropped, no further outcomes forwarded");
                        notify = None;
                    }
                } else if verbose {
                    log_event(
                        "session",
                        &generation.to_string(),
                        "stale",
                        &format!("Discarded outcome, latest is {}", session.generation),
                    );
                }
            }
        }
    }
    Ok(session)
}
