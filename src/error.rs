use thiserror::Error;

/// Validation failures raised by the cost engine and the selection state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("term must be at least one month")]
    InvalidTerm,
    #[error("term of {term} months is not offered by financing option {option_id}")]
    TermNotOffered { option_id: String, term: u32 },
    #[error("{field} must be a finite, non-negative percentage, got {value}")]
    InvalidRate { field: &'static str, value: f64 },
    #[error("unknown treatment: {0}")]
    UnknownTreatment(String),
    #[error("unknown insurance plan: {0}")]
    UnknownPlan(String),
    #[error("unknown financing option: {0}")]
    UnknownFinancing(String),
    #[error("no line item at index {index} (document has {len})")]
    ItemIndex { index: usize, len: usize },
    #[error("payment rejected: {0}")]
    PaymentRejected(String),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Failures while loading reference data. Callers decide what to show;
/// nothing here substitutes placeholder data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} failed validation: {source}")]
    Invalid {
        path: String,
        #[source]
        source: SimulationError,
    },
}
