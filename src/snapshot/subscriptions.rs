//! Tracks account subscriptions across reconnects.
//!
//! Request ids map to the account they subscribe to until the node replies,
//! after which the node's subscription id maps back to the account.

use std::collections::HashMap;

use solana_pubkey::Pubkey;

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    watched: Vec<Pubkey>,
    pending: HashMap<u64, Pubkey>,
    active: HashMap<u64, Pubkey>,
    next_request_id: u64,
}

impl SubscriptionManager {
    pub fn new(watched: Vec<Pubkey>) -> Self {
        Self {
            watched,
            ..Default::default()
        }
    }

    pub fn watched(&self) -> &[Pubkey] {
        &self.watched
    }

    /// Forget every server-side id and hand out fresh request ids for all
    /// watched accounts.
    pub fn begin_resubscribe(&mut self) -> Vec<(u64, Pubkey)> {
        self.pending.clear();
        self.active.clear();
        let watched = self.watched.clone();
        watched
            .into_iter()
            .map(|pubkey| {
                self.next_request_id += 1;
                self.pending.insert(self.next_request_id, pubkey);
                (self.next_request_id, pubkey)
            })
            .collect()
    }

    /// Record the node's subscription id for a pending request.
    pub fn confirm(&mut self, request_id: u64, subscription: u64) -> Option<Pubkey> {
        let pubkey = self.pending.remove(&request_id)?;
        self.active.insert(subscription, pubkey);
        Some(pubkey)
    }

    /// Drop a request the node refused.
    pub fn reject(&mut self, request_id: u64) -> Option<Pubkey> {
        self.pending.remove(&request_id)
    }

    pub fn account_for(&self, subscription: u64) -> Option<Pubkey> {
        self.active.get(&subscription).copied()
    }

    pub fn is_fully_subscribed(&self) -> bool {
        self.pending.is_empty() && self.active.len() == self.watched.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
