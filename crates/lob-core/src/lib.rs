//! lob-core
//!
//! Pure limit-order matching logic for one instrument:
//! - order and order-kind representation
//! - id-indexed order arena and FIFO price levels
//! - two-sided order book with price-time priority
//! - matching engine producing trades at the maker's price
//! - transport-agnostic messages and read-only snapshots
//!
//! No async runtime, no I/O. Callers that need concurrent access put the
//! engine behind a single writer (see the `lob-sequencer` crate).

pub mod arena;
pub mod error;
pub mod matching_engine;
pub mod messages;
pub mod order;
pub mod order_book;
pub mod order_kind;
pub mod price_level;
pub mod side;
pub mod top_of_book;

pub use side::Side;
pub use order_kind::OrderKind;

pub use messages::{
    Ack,
    Action,
    Cancel,
    CancelAck,
    InputMessage,
    NewOrder,
    OutputMessage,
    Reject,
    Trade,
};

pub use arena::OrderArena;
pub use error::EngineError;
pub use matching_engine::{MatchingEngine, SubmitResult};
pub use order::{Order, OrderId, Price, PriorityKey, Quantity, Sequence};
pub use order_book::{Cancelled, OrderBook};
pub use price_level::PriceLevel;
pub use top_of_book::{BookSnapshot, DepthSnapshot, LevelSummary};
