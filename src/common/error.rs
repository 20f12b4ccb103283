use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown {kind}: {name}")]
    ObjectUnknown { kind: &'static str, name: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Illegal state transition for {object}: {from} -> {to}")]
    IllegalStateTransition {
        object: String,
        from: String,
        to: String,
    },

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

impl DomainError {
    pub fn unknown_vehicle(name: &str) -> Self {
        DomainError::ObjectUnknown {
            kind: "vehicle",
            name: name.to_string(),
        }
    }

    pub fn unknown_order(name: &str) -> Self {
        DomainError::ObjectUnknown {
            kind: "transport order",
            name: name.to_string(),
        }
    }

    pub fn unknown_sequence(name: &str) -> Self {
        DomainError::ObjectUnknown {
            kind: "order sequence",
            name: name.to_string(),
        }
    }
}

/// Raised while assembling the dispatcher at startup; never during a dispatch cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown priority key '{key}' in {chain}")]
    UnknownPriorityKey { chain: &'static str, key: String },

    #[error("Priority key '{key}' listed more than once in {chain}")]
    DuplicatePriorityKey { chain: &'static str, key: String },

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Loading error: {0}")]
    Loading(#[from] anyhow::Error),

    #[error("Dispatcher is not running")]
    DispatcherUnavailable,
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
