//! Matching engine for a single instrument.
//!
//! Owns one [`OrderBook`], hands out order ids and arrival sequences, and runs
//! the price-time matching loop for every incoming order:
//!
//! 1. **Matching**: walk the opposing side best level first. At each level
//!    the head resting order trades `min(incoming, resting)` at the *resting*
//!    order's price, exhausted heads are popped and empty levels removed.
//!    Matching stops when the incoming order is filled, the opposing side is
//!    empty, or the next level is beyond the incoming limit price.
//! 2. **Resting**: any remainder is placed on the incoming order's own side.
//! 3. **Done**: the caller gets the trades in execution order plus the final
//!    remaining quantity.
//!
//! Every mutating method takes `&mut self` and runs to completion without
//! suspending, so a match can never be interleaved with another submit or
//! cancel on the same engine.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::EngineError;
use crate::messages::{InputMessage, NewOrder, OutputMessage, Trade};
use crate::order::{self, Order, OrderId, Price, Quantity, Sequence};
use crate::order_book::{Cancelled, OrderBook};
use crate::side::Side;
use crate::top_of_book::{BookSnapshot, DepthSnapshot};

/// Outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitResult {
    pub order_id: OrderId,
    pub side: Side,
    /// Original quantity.
    pub quantity: Quantity,
    /// Quantity left after matching; resting in the book when non-zero.
    pub remaining: Quantity,
    /// Trades in execution order.
    pub trades: Vec<Trade>,
}

impl SubmitResult {
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining
    }

    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_resting(&self) -> bool {
        self.remaining > 0
    }
}

/// Where the matching loop is for the current incoming order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum MatchState {
    Matching,
    Resting,
    Done,
}

#[derive(Debug)]
pub struct MatchingEngine {
    symbol: String,
    book: OrderBook,

    /// Next engine-assigned id. Every id in `1..next_order_id` has been used,
    /// either issued by the engine or claimed by a caller.
    next_order_id: u64,
    next_sequence: Sequence,
    next_trade_sequence: u64,

    /// Caller-supplied ids the counter has not reached yet. Drained as the
    /// counter passes them, so this only grows with out-of-order claims.
    claimed_ids: HashSet<OrderId>,
}

impl MatchingEngine {
    pub fn new(symbol: impl Into<String>) -> Self {
        MatchingEngine {
            symbol: symbol.into(),
            book: OrderBook::new(),
            next_order_id: 1,
            next_sequence: 1,
            next_trade_sequence: 1,
            claimed_ids: HashSet::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Submit a limit order with an engine-assigned id.
    pub fn submit_order(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<SubmitResult, EngineError> {
        self.submit(NewOrder::limit(side, price, quantity))
    }

    /// Validate, match and (if anything is left) rest a new order.
    ///
    /// Validation runs before any id or sequence is consumed, so a rejected
    /// order leaves the engine exactly as it was.
    pub fn submit(&mut self, msg: NewOrder) -> Result<SubmitResult, EngineError> {
        order::validate(msg.price, msg.quantity)?;

        let id = match msg.order_id {
            Some(id) if self.is_used(id) => return Err(EngineError::DuplicateOrderId(id)),
            Some(id) => id,
            None => OrderId(self.next_order_id),
        };

        let mut incoming = Order::submit(
            id,
            self.next_sequence,
            msg.side,
            msg.kind,
            msg.price,
            msg.quantity,
        )?;
        self.next_sequence += 1;
        self.claim_id(id);

        debug!(symbol = %self.symbol, order = %incoming, "order accepted");

        let mut trades = Vec::new();
        let state = loop {
            match self.match_best_level(&mut incoming, &mut trades)? {
                MatchState::Matching => continue,
                settled => break settled,
            }
        };

        let remaining = incoming.remaining();
        if state == MatchState::Resting {
            debug!(symbol = %self.symbol, order = %incoming, "order resting");
            self.book.insert_resting(incoming)?;
        }

        debug_assert!(!self.book.is_crossed(), "book left crossed after {id}");

        Ok(SubmitResult {
            order_id: id,
            side: msg.side,
            quantity: msg.quantity,
            remaining,
            trades,
        })
    }

    /// One step of the matching state machine: trade through the best
    /// opposing level, or decide that matching is over.
    fn match_best_level(
        &mut self,
        incoming: &mut Order,
        trades: &mut Vec<Trade>,
    ) -> Result<MatchState, EngineError> {
        if incoming.is_filled() {
            return Ok(MatchState::Done);
        }

        let maker_side = incoming.side().opposite();
        let level_price = match self.book.best_opposing(incoming.side()) {
            Some(level) => level.price(),
            None => return Ok(Self::settle(incoming)),
        };
        if !incoming.crosses(level_price) {
            return Ok(Self::settle(incoming));
        }

        while !incoming.is_filled() {
            let Some(level) = self.book.level(maker_side, level_price) else {
                break;
            };
            let maker_id = level.peek()?;
            let maker = self
                .book
                .order(maker_id)
                .ok_or(EngineError::NotFound(maker_id))?;
            let (maker_remaining, maker_price) = (maker.remaining(), maker.price());

            let fill = incoming.remaining().min(maker_remaining);
            self.book.reduce_resting(maker_id, fill)?;
            incoming.reduce(fill)?;

            let trade = Trade {
                sequence: self.next_trade_sequence,
                maker_order_id: maker_id,
                taker_order_id: incoming.id(),
                taker_side: incoming.side(),
                price: maker_price,
                quantity: fill,
            };
            self.next_trade_sequence += 1;
            trace!(symbol = %self.symbol, ?trade, "fill");
            trades.push(trade);

            self.book.pop_if_exhausted(maker_side, level_price);
            if self.book.remove_if_empty(maker_side, level_price) {
                break;
            }
        }

        Ok(if incoming.is_filled() {
            MatchState::Done
        } else {
            MatchState::Matching
        })
    }

    fn is_used(&self, id: OrderId) -> bool {
        (1..self.next_order_id).contains(&id.0) || self.claimed_ids.contains(&id)
    }

    /// Mark `id` as used and move the counter past any ids callers already
    /// claimed, so the next engine-assigned id is always free.
    fn claim_id(&mut self, id: OrderId) {
        if id.0 == self.next_order_id {
            self.next_order_id += 1;
        } else {
            self.claimed_ids.insert(id);
        }
        while self.claimed_ids.remove(&OrderId(self.next_order_id)) {
            self.next_order_id += 1;
        }
    }

    /// Matching is over with quantity left: rest it if the kind allows.
    fn settle(incoming: &Order) -> MatchState {
        if incoming.kind().rests() {
            MatchState::Resting
        } else {
            MatchState::Done
        }
    }

    /// Cancel a resting order.
    ///
    /// Fails with `NotFound` when the id is not resting, whether it never
    /// existed, was fully filled, or was already cancelled. The book is not
    /// touched in that case.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<Cancelled, EngineError> {
        let cancelled = self.book.cancel(order_id)?;
        debug!(
            symbol = %self.symbol,
            order = %cancelled.order,
            quantity = cancelled.quantity,
            "order cancelled"
        );
        Ok(cancelled)
    }

    /// `true` if a resting order was found and cancelled.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        match self.cancel(order_id) {
            Ok(_) => true,
            Err(err) => {
                debug!(symbol = %self.symbol, %err, "cancel had no effect");
                false
            }
        }
    }

    /// Best bid and best ask with aggregate sizes.
    pub fn snapshot(&self) -> BookSnapshot {
        self.book.top_of_book()
    }

    /// Up to `levels` aggregated price levels per side.
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        self.book.depth(levels)
    }

    /// Drop every resting order. Ids and sequences keep counting up, so ids
    /// used before the flush stay unusable.
    ///
    /// Id bookkeeping is a counter plus the caller-supplied ids above it; it
    /// lives as long as the engine and is not reset here.
    pub fn clear(&mut self) {
        self.book.clear();
    }

    /// Process a single input message and return the resulting events.
    ///
    /// - New order: `Ack` followed by one `Trade` per fill, or a `Reject`.
    /// - Cancel: a `CancelAck`, with `found == false` if nothing was resting.
    /// - Top-of-book query: one `TopOfBook`.
    pub fn process_message(&mut self, msg: InputMessage) -> Vec<OutputMessage> {
        match msg {
            InputMessage::NewOrder(new) => {
                let requested_id = new.order_id;
                match self.submit(new) {
                    Ok(result) => {
                        let mut outputs = Vec::with_capacity(result.trades.len() + 1);
                        outputs.push(OutputMessage::ack(
                            result.order_id,
                            result.quantity,
                            result.remaining,
                        ));
                        outputs.extend(result.trades.into_iter().map(OutputMessage::Trade));
                        outputs
                    }
                    Err(err) => {
                        warn!(symbol = %self.symbol, %err, "order rejected");
                        vec![OutputMessage::reject(requested_id, err.to_string())]
                    }
                }
            }
            InputMessage::Cancel(cancel) => {
                let cancelled = self.cancel(cancel.order_id).ok().map(|c| c.quantity);
                vec![OutputMessage::cancel_ack(cancel.order_id, cancelled)]
            }
            InputMessage::QueryTopOfBook => vec![OutputMessage::TopOfBook(self.snapshot())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Cancel;
    use crate::top_of_book::LevelSummary;

    fn engine() -> MatchingEngine {
        MatchingEngine::new("TEST")
    }

    #[test]
    fn first_order_rests() {
        let mut engine = engine();
        let result = engine.submit_order(Side::Buy, 100, 10).unwrap();

        assert_eq!(result.order_id, OrderId(1));
        assert_eq!(result.remaining, 10);
        assert!(result.trades.is_empty());
        assert_eq!(
            engine.snapshot().bid,
            Some(LevelSummary { price: 100, quantity: 10, orders: 1 })
        );
    }

    #[test]
    fn partial_fill_then_rest_on_other_side() {
        let mut engine = engine();
        let buy = engine.submit_order(Side::Buy, 100, 10).unwrap();

        let sell = engine.submit_order(Side::Sell, 100, 4).unwrap();
        assert_eq!(sell.remaining, 0);
        assert_eq!(sell.trades.len(), 1);
        assert_eq!(sell.trades[0].price, 100);
        assert_eq!(sell.trades[0].quantity, 4);
        assert_eq!(engine.book().order(buy.order_id).map(Order::remaining), Some(6));

        let sell = engine.submit_order(Side::Sell, 99, 10).unwrap();
        assert_eq!(sell.trades.len(), 1);
        assert_eq!(sell.trades[0].price, 100);
        assert_eq!(sell.trades[0].quantity, 6);
        assert_eq!(sell.trades[0].maker_order_id, buy.order_id);
        assert_eq!(sell.remaining, 4);

        let snap = engine.snapshot();
        assert_eq!(snap.bid, None);
        assert_eq!(snap.ask, Some(LevelSummary { price: 99, quantity: 4, orders: 1 }));
    }

    #[test]
    fn taker_gets_maker_price() {
        let mut engine = engine();
        let buy = engine.submit_order(Side::Buy, 101, 5).unwrap();
        let sell = engine.submit_order(Side::Sell, 99, 5).unwrap();

        assert_eq!(sell.trades.len(), 1);
        let trade = sell.trades[0];
        assert_eq!(trade.price, 101);
        assert_eq!(trade.quantity, 5);
        assert_eq!(trade.maker_order_id, buy.order_id);
        assert_eq!(trade.taker_order_id, sell.order_id);
        assert!(engine.book().is_empty());
    }

    #[test]
    fn sweeps_levels_until_limit() {
        let mut engine = engine();
        engine.submit_order(Side::Sell, 101, 2).unwrap();
        engine.submit_order(Side::Sell, 102, 3).unwrap();
        engine.submit_order(Side::Sell, 104, 5).unwrap();

        let buy = engine.submit_order(Side::Buy, 103, 10).unwrap();
        let fills: Vec<_> = buy.trades.iter().map(|t| (t.price, t.quantity)).collect();
        assert_eq!(fills, vec![(101, 2), (102, 3)]);
        assert_eq!(buy.remaining, 5);

        let snap = engine.snapshot();
        assert_eq!(snap.best_bid_price(), Some(103));
        assert_eq!(snap.best_ask_price(), Some(104));
    }

    #[test]
    fn same_price_fills_in_arrival_order() {
        let mut engine = engine();
        let first = engine.submit_order(Side::Sell, 100, 3).unwrap();
        let second = engine.submit_order(Side::Sell, 100, 3).unwrap();

        let buy = engine.submit_order(Side::Buy, 100, 4).unwrap();
        let makers: Vec<_> = buy.trades.iter().map(|t| (t.maker_order_id, t.quantity)).collect();
        assert_eq!(makers, vec![(first.order_id, 3), (second.order_id, 1)]);
        assert!(!engine.book().contains(first.order_id));
        assert_eq!(engine.book().order(second.order_id).map(Order::remaining), Some(2));
    }

    #[test]
    fn trade_sequences_increase_across_submissions() {
        let mut engine = engine();
        engine.submit_order(Side::Sell, 100, 1).unwrap();
        engine.submit_order(Side::Sell, 100, 1).unwrap();
        let a = engine.submit_order(Side::Buy, 100, 2).unwrap();
        engine.submit_order(Side::Sell, 100, 1).unwrap();
        let b = engine.submit_order(Side::Buy, 100, 1).unwrap();

        let seqs: Vec<_> = a.trades.iter().chain(b.trades.iter()).map(|t| t.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn rejected_order_changes_nothing() {
        let mut engine = engine();
        assert_eq!(
            engine.submit_order(Side::Buy, 0, 10),
            Err(EngineError::InvalidPrice(0))
        );
        assert!(matches!(
            engine.submit_order(Side::Buy, 100, 0),
            Err(EngineError::InvalidQuantity { .. })
        ));

        let accepted = engine.submit_order(Side::Buy, 100, 1).unwrap();
        assert_eq!(accepted.order_id, OrderId(1));
        assert!(engine.book().order(accepted.order_id).is_some());
        assert_eq!(engine.book().order(accepted.order_id).map(Order::sequence), Some(1));
    }

    #[test]
    fn caller_supplied_ids_must_be_unique() {
        let mut engine = engine();
        let msg = NewOrder::limit(Side::Buy, 100, 1).with_id(OrderId(50));
        assert_eq!(engine.submit(msg.clone()).unwrap().order_id, OrderId(50));
        assert_eq!(engine.submit(msg), Err(EngineError::DuplicateOrderId(OrderId(50))));
    }

    #[test]
    fn engine_ids_skip_claimed_ids() {
        let mut engine = engine();
        engine.submit(NewOrder::limit(Side::Buy, 100, 1).with_id(OrderId(2))).unwrap();
        engine.submit(NewOrder::limit(Side::Buy, 100, 1).with_id(OrderId(3))).unwrap();

        let ids: Vec<OrderId> = (0..3)
            .map(|_| engine.submit_order(Side::Buy, 100, 1).unwrap().order_id)
            .collect();
        assert_eq!(ids, vec![OrderId(1), OrderId(4), OrderId(5)]);
        assert!(engine.claimed_ids.is_empty());

        // Ids the engine issued are just as taken as claimed ones.
        assert_eq!(
            engine.submit(NewOrder::limit(Side::Buy, 100, 1).with_id(OrderId(4))),
            Err(EngineError::DuplicateOrderId(OrderId(4)))
        );
    }

    #[test]
    fn claiming_the_largest_id_leaves_engine_ids_available() {
        let mut engine = engine();
        let top = OrderId(u64::MAX);
        engine.submit(NewOrder::limit(Side::Buy, 100, 1).with_id(top)).unwrap();

        let sell = engine.submit_order(Side::Sell, 200, 1).unwrap();
        assert_eq!(sell.order_id, OrderId(1));
        assert_eq!(engine.submit_order(Side::Sell, 200, 1).unwrap().order_id, OrderId(2));
        assert_eq!(
            engine.submit(NewOrder::limit(Side::Sell, 200, 1).with_id(top)),
            Err(EngineError::DuplicateOrderId(top))
        );
        assert_eq!(engine.book().order_count(), 3);
    }

    #[test]
    fn filled_id_cannot_be_reused() {
        let mut engine = engine();
        engine.submit_order(Side::Sell, 100, 1).unwrap();
        let taker = engine.submit_order(Side::Buy, 100, 1).unwrap();
        assert!(taker.is_filled());

        let reuse = NewOrder::limit(Side::Buy, 100, 1).with_id(taker.order_id);
        assert_eq!(engine.submit(reuse), Err(EngineError::DuplicateOrderId(taker.order_id)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut engine = engine();
        let buy = engine.submit_order(Side::Buy, 100, 5).unwrap();
        engine.submit_order(Side::Buy, 99, 5).unwrap();

        assert!(engine.cancel_order(buy.order_id));
        let after_first = engine.depth(10);

        assert!(!engine.cancel_order(buy.order_id));
        assert_eq!(engine.cancel(buy.order_id), Err(EngineError::NotFound(buy.order_id)));
        assert_eq!(engine.depth(10), after_first);
        assert_eq!(engine.snapshot().best_bid_price(), Some(99));
    }

    #[test]
    fn cancel_of_filled_order_is_not_found() {
        let mut engine = engine();
        let sell = engine.submit_order(Side::Sell, 100, 2).unwrap();
        engine.submit_order(Side::Buy, 100, 2).unwrap();

        assert!(!engine.cancel_order(sell.order_id));
        assert!(!engine.cancel_order(OrderId(999)));
    }

    #[test]
    fn process_message_emits_ack_then_trades() {
        let mut engine = engine();
        engine.process_message(InputMessage::NewOrder(NewOrder::limit(Side::Sell, 100, 3)));

        let outputs =
            engine.process_message(InputMessage::NewOrder(NewOrder::limit(Side::Buy, 100, 5)));
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], OutputMessage::ack(OrderId(2), 5, 2));
        assert!(matches!(
            outputs[1],
            OutputMessage::Trade(Trade { price: 100, quantity: 3, .. })
        ));

        let cancel = engine.process_message(InputMessage::Cancel(Cancel { order_id: OrderId(2) }));
        assert_eq!(cancel, vec![OutputMessage::cancel_ack(OrderId(2), Some(2))]);

        let again = engine.process_message(InputMessage::Cancel(Cancel { order_id: OrderId(2) }));
        assert_eq!(again, vec![OutputMessage::cancel_ack(OrderId(2), None)]);

        let tob = engine.process_message(InputMessage::QueryTopOfBook);
        assert_eq!(tob, vec![OutputMessage::TopOfBook(BookSnapshot::default())]);
    }

    #[test]
    fn process_message_rejects_invalid_order() {
        let mut engine = engine();
        let outputs =
            engine.process_message(InputMessage::NewOrder(NewOrder::limit(Side::Buy, 0, 5)));
        assert!(matches!(&outputs[..], [OutputMessage::Reject(reject)] if reject.order_id.is_none()));
        assert!(engine.book().is_empty());
    }

    #[test]
    fn clear_keeps_ids_increasing() {
        let mut engine = engine();
        engine.submit_order(Side::Buy, 100, 1).unwrap();
        engine.clear();
        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.submit_order(Side::Buy, 100, 1).unwrap().order_id, OrderId(2));
    }
}
