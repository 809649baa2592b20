//! Domain error taxonomy.
//!
//! Validation failures, missing resources and illegal state transitions
//! are ordinary typed outcomes the caller maps to responses. Only
//! [`DomainError::Store`] carries infrastructure failures; no business
//! meaning is attached to it. Insufficient stock during confirmation is
//! deliberately **not** an error — see
//! [`crate::order::ConfirmOutcome`].

use common::{OrderNumberError, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors produced by the domain engines.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Client-supplied data violated a rule. The message names the
    /// offending field or value.
    #[error("{0}")]
    Validation(String),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The requested lifecycle transition is not legal from the order's
    /// current state.
    #[error("order cannot be {action}: order is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// Infrastructure failure in the backing store.
    #[error(transparent)]
    Store(StoreError),
}

impl DomainError {
    /// Builds an invalid-transition error describing the blocking state.
    pub fn invalid_transition(
        action: &'static str,
        status: OrderStatus,
        is_cancelled: bool,
    ) -> Self {
        DomainError::InvalidTransition {
            action,
            state: status.display(is_cancelled),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            // Running a day past 9999 orders is a capacity rule, not an
            // infrastructure fault; the suffix is never widened or wrapped.
            StoreError::OrderNumber(OrderNumberError::SequenceExhausted(prefix)) => {
                DomainError::Validation(format!(
                    "Daily order number capacity reached for {prefix}."
                ))
            }
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
