//! Authenticated trading session.
//!
//! A [`Session`] binds one wallet to its margin account on one deployment.
//! It is passed explicitly to every trading call, so several accounts can
//! share a process and tests can run against synthetic state.

use std::sync::Arc;

use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_transaction::Transaction;

use crate::network::ProgramKeys;
use crate::orders::Translator;
use crate::program::client::Ledger;
use crate::program::confirm::{submit_and_confirm, ConfirmConfig, ConfirmedTransaction};
use crate::program::error::{SdkError, SdkResult};
use crate::program::pda::{get_margin_pda, get_state_signer_pda};
use crate::program::types::MarginAccounts;
use crate::snapshot::{
    AccountSet, ListenerConfig, Snapshot, SnapshotListener, SnapshotResult, SnapshotStore,
};

pub struct Session {
    keypair: Arc<Keypair>,
    accounts: MarginAccounts,
    keys: ProgramKeys,
    ledger: Arc<dyn Ledger>,
    store: Arc<SnapshotStore>,
    confirm: ConfirmConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authority", &self.accounts.authority)
            .field("margin", &self.accounts.margin)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Assemble a session from parts already resolved by the caller.
    pub fn new(
        keypair: Arc<Keypair>,
        accounts: MarginAccounts,
        keys: ProgramKeys,
        ledger: Arc<dyn Ledger>,
        store: Arc<SnapshotStore>,
        confirm: ConfirmConfig,
    ) -> Self {
        Self {
            keypair,
            accounts,
            keys,
            ledger,
            store,
            confirm,
        }
    }

    /// Margin account address of a wallet on a deployment.
    pub fn margin_address(authority: &Pubkey, keys: &ProgramKeys) -> Pubkey {
        get_margin_pda(authority, &keys.state, &keys.program_id).0
    }

    /// Load every watched account once and publish the first snapshot.
    ///
    /// Returns the session and the account set the listener takes over.
    pub async fn bootstrap(
        keypair: Arc<Keypair>,
        keys: ProgramKeys,
        ledger: Arc<dyn Ledger>,
        confirm: ConfirmConfig,
    ) -> SdkResult<(Self, AccountSet)> {
        let authority = keypair.pubkey();
        let margin = Self::margin_address(&authority, &keys);
        let set = AccountSet::load(ledger.as_ref(), keys.state, margin).await?;

        let accounts = MarginAccounts {
            authority,
            state: keys.state,
            state_signer: get_state_signer_pda(&keys.state, &keys.program_id).0,
            cache: set.state.cache,
            margin,
            control: set.margin.control,
        };
        let store = Arc::new(SnapshotStore::new());
        store.publish(set.to_snapshot(0));

        tracing::info!(%authority, %margin, "Session ready");
        Ok((Self::new(keypair, accounts, keys, ledger, store, confirm), set))
    }

    /// Start the push listener that keeps this session's snapshot current.
    pub async fn start_listener(
        &self,
        ws_url: &str,
        config: ListenerConfig,
        accounts: AccountSet,
    ) -> SnapshotResult<SnapshotListener> {
        SnapshotListener::start(
            ws_url,
            config,
            accounts,
            self.store.clone(),
            Some(self.ledger.clone()),
        )
        .await
    }

    pub fn authority(&self) -> Pubkey {
        self.accounts.authority
    }

    pub fn accounts(&self) -> &MarginAccounts {
        &self.accounts
    }

    pub fn keys(&self) -> &ProgramKeys {
        &self.keys
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Latest snapshot. Stale snapshots are served with a warning.
    pub fn snapshot(&self) -> SnapshotResult<Arc<Snapshot>> {
        let snapshot = self.store.load()?;
        if self.store.is_stale() {
            tracing::warn!(slot = snapshot.slot, "Serving stale snapshot");
        }
        Ok(snapshot)
    }

    /// Translator bound to this session's accounts.
    pub fn translator<'a>(&'a self, snapshot: &'a Snapshot) -> Translator<'a> {
        Translator::new(snapshot, &self.accounts, &self.keys)
    }

    /// Sign `instructions` as one transaction, submit it and wait for its logs.
    pub async fn execute(&self, instructions: &[Instruction]) -> SdkResult<ConfirmedTransaction> {
        let blockhash = self.ledger.latest_blockhash().await?;
        let mut transaction = Transaction::new_with_payer(instructions, Some(&self.accounts.authority));
        transaction
            .try_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| SdkError::Signing(e.to_string()))?;
        submit_and_confirm(self.ledger.as_ref(), transaction, &self.confirm).await
    }
}
