use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use dentalsim::catalog::Catalog;
use dentalsim::config::{Cli, Command, Config, parse_treatment_arg};
use dentalsim::json_faker::{fake_catalog, write_fake_catalog, write_fake_events_jsonl};
use dentalsim::logging::log_event;
use dentalsim::message::{SelectionEvent, SimulationOutcome};
use dentalsim::reader::{load_catalog, load_invoice, stream_events};
use dentalsim::recompute::{evaluate, run_recompute};
use dentalsim::reporter::{print_invoice, print_simulation};
use dentalsim::session::{SimulationSession, run_session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Command::Simulate {
            catalog,
            treatments,
            plan,
            discount,
            fixed_discount,
            financing,
            term,
        } => {
            let catalog = load_catalog(&catalog).await?;
            let mut session = SimulationSession::new(Arc::new(catalog));

            let mut events: Vec<SelectionEvent> = treatments
                .iter()
                .map(|arg| {
                    let (treatment_id, quantity) = parse_treatment_arg(arg);
                    SelectionEvent::AddTreatment {
                        treatment_id,
                        quantity,
                    }
                })
                .collect();
            events.push(SelectionEvent::SelectPlan { plan_id: plan });
            events.push(SelectionEvent::SetDiscountPercentage { value: discount });
            events.push(SelectionEvent::SetFixedDiscount {
                value: fixed_discount,
            });
            events.push(SelectionEvent::SelectFinancing {
                financing_id: financing,
            });
            events.push(SelectionEvent::SelectTerm { term_months: term });

            for event in events {
                session
                    .apply_event(event.clone())
                    .with_context(|| format!("Cannot apply {:?}", event))?;
            }
            let outcome = evaluate(&session.next_request());
            report(&outcome)?;
        }
        Command::Invoice { path } => {
            let invoice = load_invoice(&path).await?;
            print_invoice(&invoice);
        }
        Command::Replay {
            catalog, events, ..
        } => {
            let catalog = Arc::new(load_catalog(&catalog).await?);
            let session = replay(config, catalog, events).await?;
            match session.latest() {
                Some(outcome) => report(outcome)?,
                None => println!("No simulation was computed"),
            }
        }
        Command::Generate {
            catalog,
            events,
            treatments,
            count,
        } => {
            let fake = fake_catalog(treatments);
            write_fake_catalog(&catalog, &fake)?;
            write_fake_events_jsonl(&events, &fake, count)?;
            println!(
                "Wrote {} treatments to {} and {} events to {}",
                fake.treatments.len(),
                catalog.display(),
                count,
                events.display()
            );
        }
    }
    Ok(())
}

fn report(outcome: &SimulationOutcome) -> anyhow::Result<()> {
    let payment = outcome.payment.clone()?;
    print_simulation(outcome.result.as_ref(), payment.as_ref());
    Ok(())
}

/// Wire reader -> session -> recompute worker and run the script to completion.
async fn replay(
    config: Config,
    catalog: Arc<Catalog>,
    events_path: PathBuf,
) -> anyhow::Result<SimulationSession> {
    let (event_tx, event_rx) = tokio::sync::mpsc::channel(16);
    let (recompute_tx, recompute_rx) = tokio::sync::mpsc::unbounded_channel();
    let (result_tx, result_rx) = tokio::sync::mpsc::channel(16);

    let worker = tokio::spawn(run_recompute(config.clone(), recompute_rx, result_tx));
    let reader = tokio::spawn(async move { stream_events(&events_path, event_tx).await });

    let session = run_session(config.clone(), catalog, event_rx, recompute_tx, result_rx, None).await?;
    reader.await??;
    worker.await??;

    if config.verbose {
        log_event(
            "main",
            &session.generation().to_string(),
            "done",
            "Replay finished",
        );
    }
    Ok(session)
}
