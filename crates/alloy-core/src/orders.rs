//! In-memory service order collection.
//!
//! Orders live for the lifetime of the process. The workflow core only needs
//! lookup and status updates, exposed through [`OrderProvider`]; the intake
//! and list screens use the richer [`OrderBook`] API.

use std::sync::RwLock;

use tracing::{debug, info};

use crate::error::{AlloyError, Result};
use crate::types::{NewServiceOrder, OrderId, ServiceOrder, WorkStatus};

const MOCK_ORDERS_JSON: &str = include_str!("data/service_orders.json");

/// Read/write access to service orders, as seen by the workflow core.
pub trait OrderProvider: Send + Sync {
    /// Fetch a copy of the order with the given id.
    fn get(&self, id: &OrderId) -> Option<ServiceOrder>;

    /// Update one order's status. Returns `Ok(false)` if no such order exists.
    fn set_status(&self, id: &OrderId, status: WorkStatus) -> Result<bool>;
}

/// Thread-safe in-memory list of service orders, newest first.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: RwLock<Vec<ServiceOrder>>,
}

impl OrderBook {
    /// Create a book holding the given orders.
    pub fn new(orders: Vec<ServiceOrder>) -> Self {
        Self {
            orders: RwLock::new(orders),
        }
    }

    /// Create a book seeded with the bundled demo orders.
    pub fn with_mock_orders() -> Result<Self> {
        let orders: Vec<ServiceOrder> = serde_json::from_str(MOCK_ORDERS_JSON)?;
        debug!(count = orders.len(), "Loaded mock service orders");
        Ok(Self::new(orders))
    }

    /// Snapshot of every order.
    pub fn list(&self) -> Result<Vec<ServiceOrder>> {
        let guard = self
            .orders
            .read()
            .map_err(|e| AlloyError::Orders(format!("Order lock poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    /// Orders with the given status, in list order.
    pub fn filter_by_status(&self, status: WorkStatus) -> Result<Vec<ServiceOrder>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|o| o.status == status)
            .collect())
    }

    /// Number a new submission `WO-<highest + 1>`, open it as `new`, and put it first.
    pub fn add_order(&self, submission: NewServiceOrder) -> Result<OrderId> {
        let mut guard = self
            .orders
            .write()
            .map_err(|e| AlloyError::Orders(format!("Order lock poisoned: {}", e)))?;

        let max = guard
            .iter()
            .filter_map(|o| o.id.number())
            .max()
            .unwrap_or(0);
        let id = OrderId(format!("WO-{}", max + 1));

        guard.insert(0, submission.into_order(id.clone()));
        info!(order_id = %id, "Service order created");
        Ok(id)
    }
}

impl OrderProvider for OrderBook {
    fn get(&self, id: &OrderId) -> Option<ServiceOrder> {
        let guard = self.orders.read().ok()?;
        guard.iter().find(|o| &o.id == id).cloned()
    }

    fn set_status(&self, id: &OrderId, status: WorkStatus) -> Result<bool> {
        let mut guard = self
            .orders
            .write()
            .map_err(|e| AlloyError::Orders(format!("Order lock poisoned: {}", e)))?;

        match guard.iter_mut().find(|o| &o.id == id) {
            Some(order) => {
                debug!(order_id = %id, from = %order.status, to = %status, "Order status updated");
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
