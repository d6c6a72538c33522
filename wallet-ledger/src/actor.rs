//! Actor-based concurrency for the wallet store
//!
//! All mutations funnel through one writer task:
//! - The reference uniqueness check and the conditional insert execute on a
//!   single task, so concurrent callers can never both observe "absent" and
//!   both insert. The actor IS the uniqueness constraint.
//! - Reads go straight to storage; RocksDB handles concurrent readers.
//!
//! Unlike a throughput-oriented event log there is no write batching here:
//! every money movement is individually durable before the caller gets its
//! reply.

use crate::storage::{AppendOutcome, SettleOutcome, Storage};
use crate::types::{
    AuditRecord, EntryStatus, EscrowStatus, LedgerEntry, Order, OrderId, OrderStatus, Reference,
    WalletFreeze, WalletRequest,
};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the store actor
pub enum StoreMessage {
    /// Conditional entry insert keyed by reference
    AppendEntry {
        entry: LedgerEntry,
        response: oneshot::Sender<Result<AppendOutcome>>,
    },

    /// Exactly-once pending transition
    SettleEntry {
        reference: Reference,
        status: EntryStatus,
        response: oneshot::Sender<Result<SettleOutcome>>,
    },

    /// Create or overwrite a wallet request (reject path included)
    PutRequest {
        request: WalletRequest,
        response: oneshot::Sender<Result<()>>,
    },

    /// Approved request and its ledger entry, one storage transaction
    ApproveRequest {
        request: WalletRequest,
        entry: LedgerEntry,
        response: oneshot::Sender<Result<AppendOutcome>>,
    },

    /// Create or overwrite an order record
    PutOrder {
        order: Order,
        response: oneshot::Sender<Result<()>>,
    },

    /// Rewrite an order's status pair (escrow transition or compensation)
    UpdateOrderState {
        order_id: OrderId,
        status: OrderStatus,
        escrow_status: EscrowStatus,
        response: oneshot::Sender<Result<Order>>,
    },

    /// Write a moderation freeze flag
    SetFreeze {
        freeze: WalletFreeze,
        response: oneshot::Sender<Result<()>>,
    },

    /// Append an audit record
    AppendAudit {
        record: AuditRecord,
        response: oneshot::Sender<Result<()>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that serializes all store mutations
pub struct StoreActor {
    storage: Arc<Storage>,
    mailbox: mpsc::Receiver<StoreMessage>,
}

impl StoreActor {
    /// Create new actor
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<StoreMessage>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor event loop until shutdown or all handles drop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                StoreMessage::Shutdown => break,
                other => self.handle_message(other),
            }
        }
        tracing::debug!("Store actor stopped");
    }

    fn handle_message(&mut self, msg: StoreMessage) {
        match msg {
            StoreMessage::AppendEntry { entry, response } => {
                let _ = response.send(self.storage.append_entry_if_absent(&entry));
            }

            StoreMessage::SettleEntry { reference, status, response } => {
                let _ = response.send(self.storage.settle_entry(&reference, status));
            }

            StoreMessage::PutRequest { request, response } => {
                let _ = response.send(self.storage.put_request(&request));
            }

            StoreMessage::ApproveRequest { request, entry, response } => {
                let _ = response.send(self.storage.approve_request_with_entry(&request, &entry));
            }

            StoreMessage::PutOrder { order, response } => {
                let _ = response.send(self.storage.put_order(&order));
            }

            StoreMessage::UpdateOrderState { order_id, status, escrow_status, response } => {
                let _ = response.send(self.update_order_state(&order_id, status, escrow_status));
            }

            StoreMessage::SetFreeze { freeze, response } => {
                let _ = response.send(self.storage.set_freeze(&freeze));
            }

            StoreMessage::AppendAudit { record, response } => {
                let _ = response.send(self.storage.append_audit(&record));
            }

            StoreMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn update_order_state(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        escrow_status: EscrowStatus,
    ) -> Result<Order> {
        let mut order = self.storage.get_order(order_id)?;
        order.status = status;
        order.escrow_status = escrow_status;
        self.storage.put_order(&order)?;
        Ok(order)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreMessage>,
}

impl StoreHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<StoreMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> StoreMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Conditional entry insert keyed by reference
    pub async fn append_entry(&self, entry: LedgerEntry) -> Result<AppendOutcome> {
        self.request(|response| StoreMessage::AppendEntry { entry, response })
            .await
    }

    /// Exactly-once pending transition
    pub async fn settle_entry(
        &self,
        reference: Reference,
        status: EntryStatus,
    ) -> Result<SettleOutcome> {
        self.request(|response| StoreMessage::SettleEntry { reference, status, response })
            .await
    }

    /// Create or overwrite a wallet request
    pub async fn put_request(&self, request: WalletRequest) -> Result<()> {
        self.request(|response| StoreMessage::PutRequest { request, response })
            .await
    }

    /// Approved request plus ledger entry, one storage transaction
    pub async fn approve_request(
        &self,
        request: WalletRequest,
        entry: LedgerEntry,
    ) -> Result<AppendOutcome> {
        self.request(|response| StoreMessage::ApproveRequest { request, entry, response })
            .await
    }

    /// Create or overwrite an order record
    pub async fn put_order(&self, order: Order) -> Result<()> {
        self.request(|response| StoreMessage::PutOrder { order, response })
            .await
    }

    /// Rewrite an order's status pair
    pub async fn update_order_state(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        escrow_status: EscrowStatus,
    ) -> Result<Order> {
        self.request(|response| StoreMessage::UpdateOrderState {
            order_id,
            status,
            escrow_status,
            response,
        })
        .await
    }

    /// Write a moderation freeze flag
    pub async fn set_freeze(&self, freeze: WalletFreeze) -> Result<()> {
        self.request(|response| StoreMessage::SetFreeze { freeze, response })
            .await
    }

    /// Append an audit record
    pub async fn append_audit(&self, record: AuditRecord) -> Result<()> {
        self.request(|response| StoreMessage::AppendAudit { record, response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(StoreMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the store actor
pub fn spawn_store_actor(storage: Arc<Storage>) -> StoreHandle {
    let (tx, rx) = mpsc::channel(1024); // Bounded channel for backpressure
    let actor = StoreActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    StoreHandle::new(tx)
}
