//! Price level: the FIFO queue of orders resting at one price.
//!
//! Levels never reorder their entries. New orders go to the tail, fills
//! always hit the head, and the only other removal is cancellation.

use std::collections::VecDeque;

use crate::arena::OrderArena;
use crate::error::EngineError;
use crate::order::{Order, OrderId, Price, Quantity};

#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    queue: VecDeque<OrderId>,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        PriceLevel {
            price,
            queue: VecDeque::new(),
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Append `order` at the tail (time priority).
    pub fn enqueue(&mut self, order: &Order) -> Result<(), EngineError> {
        if order.price() != self.price {
            return Err(EngineError::PriceMismatch {
                level_price: self.price,
                order_price: order.price(),
            });
        }
        self.queue.push_back(order.id());
        Ok(())
    }

    /// Head of the queue without removing it.
    pub fn peek(&self) -> Result<OrderId, EngineError> {
        self.queue
            .front()
            .copied()
            .ok_or(EngineError::Empty(self.price))
    }

    /// Remove the head iff the arena shows it has nothing left.
    ///
    /// A head id missing from the arena is treated as exhausted as well, so
    /// the level cannot get stuck on a stale handle.
    pub fn pop_if_exhausted(&mut self, orders: &OrderArena) -> Option<OrderId> {
        let head = *self.queue.front()?;
        let exhausted = orders.get(head).map_or(true, Order::is_filled);
        if exhausted {
            self.queue.pop_front()
        } else {
            None
        }
    }

    /// Remove `id` wherever it sits in the queue.
    pub fn remove(&mut self, id: OrderId) -> bool {
        match self.queue.iter().position(|queued| *queued == id) {
            Some(pos) => self.queue.remove(pos).is_some(),
            None => false,
        }
    }

    /// Sum of remaining quantity across the level.
    pub fn total_quantity(&self, orders: &OrderArena) -> Quantity {
        self.queue
            .iter()
            .filter_map(|id| orders.get(*id))
            .map(Order::remaining)
            .sum()
    }

    /// Queued ids, head first.
    pub fn iter(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.queue.iter().copied()
    }

    pub fn back(&self) -> Option<OrderId> {
        self.queue.back().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
