use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Not enough teams to fill the simulated bracket
    #[error("need at least {required} teams to run the knockout simulation, got {found}")]
    InsufficientTeams { required: usize, found: usize },

    /// A forecast over zero iterations has no percentages
    #[error("simulation needs at least one iteration")]
    InvalidIterations,

    /// Tournament configuration cannot be turned into a bracket
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    /// Confidence level outside (0, 1)
    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    /// Output could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Engine configuration failed to parse or validate
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
