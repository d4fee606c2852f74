use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;

use crate::catalog::Catalog;
use crate::error::FetchError;
use crate::invoice::Invoice;
use crate::logging::log_warning;
use crate::message::SelectionEvent;
use crate::schema::{FinancingOption, InsurancePlan, Treatment};

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FetchError> {
    let display = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::Io {
            path: display.clone(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| FetchError::Parse {
        path: display,
        source,
    })
}

fn validated(catalog: Catalog, path: String) -> Result<Catalog, FetchError> {
    catalog
        .validate()
        .map_err(|source| FetchError::Invalid { path, source })?;
    Ok(catalog)
}

/// Load a catalog JSON file with `treatments`, `insurance_plans` and `financing_options`.
pub async fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, FetchError> {
    let path = path.as_ref();
    let catalog: Catalog = read_json(path).await?;
    validated(catalog, path.display().to_string())
}

/// Load treatments, plans and financing options from three files at once.
///
/// Any single failure fails the whole load; nothing is filled in.
pub async fn load_catalog_parts(
    treatments: impl AsRef<Path>,
    plans: impl AsRef<Path>,
    financing: impl AsRef<Path>,
) -> Result<Catalog, FetchError> {
    let (treatments, plans, financing) = (treatments.as_ref(), plans.as_ref(), financing.as_ref());
    let label = format!(
        "{} + {} + {}",
        treatments.display(),
        plans.display(),
        financing.display()
    );
    let (treatments, insurance_plans, financing_options) = futures::try_join!(
        read_json::<Vec<Treatment>>(treatments),
        read_json::<Vec<InsurancePlan>>(plans),
        read_json::<Vec<FinancingOption>>(financing),
    )?;
    let catalog = Catalog {
        treatments,
        insurance_plans,
        financing_options,
    };
    validated(catalog, label)
}

pub async fn load_invoice(path: impl AsRef<Path>) -> Result<Invoice, FetchError> {
    read_json(path.as_ref()).await
}

/// Stream form edits from a JSONL file. Malformed lines are reported and skipped.
pub async fn stream_events(
    path: impl AsRef<Path>,
    sender: Sender<SelectionEvent>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::open(path).await?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SelectionEvent>(&line) {
            Ok(event) => {
                if sender.send(event).await.is_err() {
                    log_warning("reader", &path.display().to_string(), "Session receiver dropped");
                    break;
                }
            }
            Err(err) => log_warning(
                "reader",
                &format!("{}:{}", path.display(), line_no),
                &format!("Invalid event skipped: {}", err),
            ),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock_catalog;

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = load_catalog("/definitely/not/here.json").await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, serde_json::to_string(&mock_catalog()).unwrap())
            .await
            .unwrap();

        let catalog = load_catalog(&path).await.unwrap();
        assert_eq!(catalog, mock_catalog());

        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(matches!(
            load_catalog(&path).await,
            Err(FetchError::Parse { .. })
        ));
    }
}
