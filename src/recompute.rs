use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tokio::time::{Duration, sleep};

use crate::config::Config;
use crate::financing;
use crate::logging::log_event;
use crate::message::{RecomputeMessage, ResultMessage, SimulationOutcome, SimulationRequest};
use crate::simulation::simulate;

/// Compute the cost breakdown and, when financing is chosen, the monthly payment
/// on the patient total.
pub fn evaluate(request: &SimulationRequest) -> SimulationOutcome {
    let result = simulate(&request.inputs);
    let principal = result.as_ref().map_or(0.0, |r| r.patient_total);
    let payment = match &request.financing {
        Some(option) => financing::estimate(principal, option, request.term_months),
        None => Ok(None),
    };
    SimulationOutcome {
        generation: request.generation,
        result,
        payment,
    }
}

/// Recompute worker fed by the session.
///
/// After a request arrives, later requests keep replacing it until the channel
/// has been quiet for `debounce_ms`; only then is the latest one evaluated.
/// When the session hangs up, whatever is pending is evaluated right away.
pub async fn run_recompute(
    config: Config,
    mut rx: UnboundedReceiver<RecomputeMessage>,
    tx: Sender<ResultMessage>,
) -> anyhow::Result<()> {
    let delay = Duration::from_millis(config.debounce_ms);
    if config.verbose {
        log_event("recompute", "-", "start", "Starting recompute task");
    }

    while let Some(RecomputeMessage::Recompute(first)) = rx.recv().await {
        let mut pending = first;
        let mut closed = false;

        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(RecomputeMessage::Recompute(request)) => {
                        if config.verbose {
                            log_event(
                                "recompute",
                                &request.generation.to_string(),
                                "superseded",
                                &format!("Replacing pending generation {}", pending.generation),
                            );
                        }
                        pending = request;
                    }
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = sleep(delay) => break,
            }
        }

        let outcome = evaluate(&pending);
        if config.verbose {
            let total = outcome
                .result
                .as_ref()
                .map_or("-".to_string(), |r| format!("{:.2}", r.patient_total));
            log_event(
                "recompute",
                &outcome.generation.to_string(),
                "computed",
                &format!("Patient total: {}", total),
            );
        }
        if tx.send(ResultMessage::Computed(outcome)).await.is_err() {
            return Err(anyhow::anyhow!("Session result channel dropped"));
        }
        if closed {
            break;
        }
    }
    Ok(())
}
