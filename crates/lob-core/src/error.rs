//! Error types for the matching core.
//!
//! Every failure is local and synchronous: it is returned at the offending
//! call and nothing is retried, since matching is deterministic and the same
//! input fails the same way twice.

use thiserror::Error;

use crate::order::{OrderId, Price, Quantity};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Non-positive quantity on submission, or a reduction that is zero or
    /// larger than what remains.
    #[error("invalid quantity {requested} (remaining {remaining})")]
    InvalidQuantity { requested: Quantity, remaining: Quantity },

    #[error("invalid price {0}: prices must be positive")]
    InvalidPrice(Price),

    /// An order was enqueued into a level with a different price.
    ///
    /// This is an internal invariant violation and indicates a bug if it ever
    /// reaches a caller.
    #[error("order priced {order_price} enqueued into level {level_price}")]
    PriceMismatch { level_price: Price, order_price: Price },

    /// Peek on a level that holds no orders. Internal, like `PriceMismatch`.
    #[error("price level {0} is empty")]
    Empty(Price),

    #[error("order {0} is not resting in the book")]
    NotFound(OrderId),

    #[error("order {0} has no remaining quantity")]
    AlreadyFilled(OrderId),

    #[error("order id {0} has already been used in this book")]
    DuplicateOrderId(OrderId),
}

impl EngineError {
    /// `true` for errors that can only come from a defect in the core itself.
    pub fn is_internal(&self) -> bool {
        matches!(self, EngineError::PriceMismatch { .. } | EngineError::Empty(_))
    }
}
