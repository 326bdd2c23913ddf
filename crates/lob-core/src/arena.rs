//! Id-indexed storage for resting orders.
//!
//! The book owns every resting [`Order`] here; price levels only hold
//! [`OrderId`] handles into the arena, so removing an order never leaves a
//! dangling reference in a level that is being iterated.

use std::collections::HashMap;

use crate::order::{Order, OrderId};

#[derive(Debug, Default, Clone)]
pub struct OrderArena {
    orders: HashMap<OrderId, Order>,
}

impl OrderArena {
    pub fn new() -> Self {
        OrderArena::default()
    }

    /// Store `order`, handing back the previous occupant of its id if any.
    pub fn insert(&mut self, order: Order) -> Option<Order> {
        self.orders.insert(order.id(), order)
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn get_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&id)
    }

    pub fn remove(&mut self, id: OrderId) -> Option<Order> {
        self.orders.remove(&id)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }
}
