//! Message types used by the matching core.
//!
//! These are **transport-agnostic** logical records:
//! - [`InputMessage`]: what the engine consumes.
//! - [`OutputMessage`]: what the engine produces.
//!
//! They derive serde traits so collaborators (session handling, persistence,
//! market data) can serialize them however they like; no wire format lives in
//! this crate.

use serde::{Deserialize, Serialize};

use crate::order::{OrderId, Price, Quantity};
use crate::order_kind::OrderKind;
use crate::side::Side;
use crate::top_of_book::BookSnapshot;

/// A request into the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMessage {
    NewOrder(NewOrder),

    /// Cancel a resting order by id.
    Cancel(Cancel),

    /// Ask for the current best bid / best ask.
    QueryTopOfBook,
}

/// What an [`InputMessage`] asks the engine to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Add,
    Cancel,
    Query,
}

impl InputMessage {
    pub fn action(&self) -> Action {
        match self {
            InputMessage::NewOrder(_) => Action::Add,
            InputMessage::Cancel(_) => Action::Cancel,
            InputMessage::QueryTopOfBook => Action::Query,
        }
    }
}

/// An event emitted by the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMessage {
    /// The order was accepted; `remaining` is what is left after matching.
    Ack(Ack),

    Trade(Trade),

    CancelAck(CancelAck),

    /// The request failed validation; nothing in the book changed.
    Reject(Reject),

    TopOfBook(BookSnapshot),
}

/// New order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Caller-supplied id; `None` lets the engine assign one.
    pub order_id: Option<OrderId>,
    pub side: Side,
    pub kind: OrderKind,
    /// Limit price in ticks; must be positive.
    pub price: Price,
    pub quantity: Quantity,
}

impl NewOrder {
    /// Limit order with an engine-assigned id.
    pub fn limit(side: Side, price: Price, quantity: Quantity) -> Self {
        NewOrder {
            order_id: None,
            side,
            kind: OrderKind::Limit,
            price,
            quantity,
        }
    }

    pub fn with_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// Cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub order_id: OrderId,
    pub quantity: Quantity,
    pub remaining: Quantity,
}

/// Trade between a resting maker and an incoming taker.
///
/// `price` is always the maker's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Strictly increasing per engine.
    pub sequence: u64,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    /// Side of the taker (the aggressor).
    pub taker_side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl Trade {
    pub fn buy_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.taker_order_id,
            Side::Sell => self.maker_order_id,
        }
    }

    pub fn sell_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.maker_order_id,
            Side::Sell => self.taker_order_id,
        }
    }
}

/// Acknowledgement of a cancel request.
///
/// `cancelled` is the quantity taken out of the book; `found` is `false`
/// when the id was not resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAck {
    pub order_id: OrderId,
    pub found: bool,
    pub cancelled: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    pub order_id: Option<OrderId>,
    pub reason: String,
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl OutputMessage {
    pub fn ack(order_id: OrderId, quantity: Quantity, remaining: Quantity) -> Self {
        OutputMessage::Ack(Ack {
            order_id,
            quantity,
            remaining,
        })
    }

    pub fn cancel_ack(order_id: OrderId, cancelled: Option<Quantity>) -> Self {
        OutputMessage::CancelAck(CancelAck {
            order_id,
            found: cancelled.is_some(),
            cancelled: cancelled.unwrap_or(0),
        })
    }

    pub fn reject(order_id: Option<OrderId>, reason: impl Into<String>) -> Self {
        OutputMessage::Reject(Reject {
            order_id,
            reason: reason.into(),
        })
    }
}
