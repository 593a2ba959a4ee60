//! Crate error types.
//!
//! Every fallible public operation returns [`SelectError`]. Each variant maps to a
//! process exit code so the `mpaic` binary can report failures the same way it
//! reports success: through `main`'s `ExitCode`.
//!
//! [`FitFailure`] is deliberately separate: it describes a single candidate fit
//! going wrong and is normally absorbed by the search (the candidate is scored as
//! `+inf`). It only reaches the caller wrapped in [`SelectError::Fit`] when the
//! caller explicitly asked for a fitted object, e.g. during refit.

use thiserror::Error;

/// Why a single regression fit could not produce a usable AIC.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    #[error("design matrix is rank deficient (rank {rank} < {cols} columns)")]
    Singular { rank: usize, cols: usize },

    #[error("no residual degrees of freedom (n={n}, k={k})")]
    NoResidualDf { n: usize, k: usize },

    #[error("IRLS did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("fitted probabilities numerically 0 or 1 (separation)")]
    Separation,

    #[error("fit produced non-finite values")]
    NonFinite,
}

#[derive(Debug, Clone, Error)]
pub enum SelectError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model fit failed: {0}")]
    Fit(#[from] FitFailure),

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl SelectError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::Fit(_) => 3,
            Self::WorkerPool(_) | Self::Serialize(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, SelectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(SelectError::invalid("bad shape").exit_code(), 2);
        assert_eq!(SelectError::from(FitFailure::Separation).exit_code(), 3);
        assert_eq!(SelectError::WorkerPool("x".into()).exit_code(), 4);
    }

    #[test]
    fn messages_are_descriptive() {
        let err = SelectError::invalid("y has 3 rows, X has 4");
        assert_eq!(err.to_string(), "invalid input: y has 3 rows, X has 4");

        let err = SelectError::from(FitFailure::Singular { rank: 2, cols: 3 });
        assert!(err.to_string().contains("rank 2 < 3"));
    }
}
