//! # Credential Registry
//!
//! Ownership table for eligibility tokens. `mint` is the only mutator of
//! token ownership and refuses a token id that is already owned, which is
//! the last line of defence against issuing the same credential twice.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use gt_core::{Address, CallContext, EventId, EventLog, LedgerEvent, Ownership, Timestamp, TokenId};

use crate::error::CredentialError;
use crate::metadata::CredentialMetadata;

/// One minted credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token_id: TokenId,
    pub owner: Address,
    /// The event this credential proves eligibility for.
    pub event_id: EventId,
    pub minted_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityCredential {
    address: Address,
    ownership: Ownership,
    metadata: CredentialMetadata,
    minter: Address,
    tokens: BTreeMap<TokenId, TokenRecord>,
    holdings: BTreeMap<Address, BTreeSet<TokenId>>,
    next_token_id: TokenId,
}

impl EligibilityCredential {
    pub fn new(
        address: Address,
        owner: Address,
        minter: Address,
        metadata: CredentialMetadata,
    ) -> Self {
        Self {
            address,
            ownership: Ownership::new(owner),
            metadata,
            minter,
            tokens: BTreeMap::new(),
            holdings: BTreeMap::new(),
            next_token_id: TokenId::FIRST,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        new_owner: Address,
    ) -> Result<(), CredentialError> {
        self.ownership
            .transfer(self.address, &ctx.caller, new_owner, log)?;
        Ok(())
    }

    // ─── Minting ─────────────────────────────────────────────────────

    /// Mint `token_id` to `to`, tagged with `event_id`. Minter only.
    pub fn mint(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        to: Address,
        token_id: TokenId,
        event_id: EventId,
    ) -> Result<(), CredentialError> {
        self.require_minter(&ctx.caller)?;
        if to.is_zero() {
            return Err(CredentialError::ZeroRecipient);
        }
        if self.tokens.contains_key(&token_id) {
            return Err(CredentialError::AlreadyMinted(token_id));
        }

        self.tokens.insert(
            token_id,
            TokenRecord {
                token_id,
                owner: to,
                event_id,
                minted_at: ctx.now,
            },
        );
        self.holdings.entry(to).or_default().insert(token_id);
        // A mint at `u64::MAX` leaves the cursor where it is.
        if token_id >= self.next_token_id {
            if let Some(next) = token_id.next() {
                self.next_token_id = next;
            }
        }
        log.emit(LedgerEvent::Transfer {
            registry: self.address,
            from: Address::ZERO,
            to,
            token_id,
        });

        tracing::info!(%token_id, owner = %to, %event_id, "credential minted");
        Ok(())
    }

    /// Mint the lowest free token id at or above the sequential cursor.
    /// Minter only.
    pub fn mint_next(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        to: Address,
        event_id: EventId,
    ) -> Result<TokenId, CredentialError> {
        let token_id = self.next_free_token_id()?;
        self.mint(ctx, log, to, token_id, event_id)?;
        Ok(token_id)
    }

    /// The id `mint_next` would assign now.
    pub fn next_free_token_id(&self) -> Result<TokenId, CredentialError> {
        let mut token_id = self.next_token_id;
        while self.tokens.contains_key(&token_id) {
            token_id = token_id.next().ok_or(CredentialError::TokenIdExhausted)?;
        }
        Ok(token_id)
    }

    /// Rotate the minter identity. Owner only.
    pub fn set_minter(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        minter: Address,
    ) -> Result<(), CredentialError> {
        self.ownership.require_owner(&ctx.caller)?;
        let previous = self.minter;
        self.minter = minter;
        log.emit(LedgerEvent::MinterChanged {
            registry: self.address,
            previous,
            minter,
        });
        tracing::info!(%previous, %minter, "minter changed");
        Ok(())
    }

    fn require_minter(&self, caller: &Address) -> Result<(), CredentialError> {
        if self.minter.is_zero() || *caller != self.minter {
            return Err(CredentialError::Unauthorized {
                caller: *caller,
                minter: self.minter,
            });
        }
        Ok(())
    }

    // ─── Reads ───────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn total_supply(&self) -> u64 {
        self.tokens.len() as u64
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Address, CredentialError> {
        self.token(token_id).map(|t| t.owner)
    }

    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.holdings.get(owner).map_or(0, |set| set.len() as u64)
    }

    pub fn tokens_of(&self, owner: &Address) -> Vec<TokenId> {
        self.holdings
            .get(owner)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn event_of(&self, token_id: TokenId) -> Result<EventId, CredentialError> {
        self.token(token_id).map(|t| t.event_id)
    }

    pub fn token(&self, token_id: TokenId) -> Result<&TokenRecord, CredentialError> {
        self.tokens
            .get(&token_id)
            .ok_or(CredentialError::NotFound(token_id))
    }

    /// `base_uri` followed by the token number, or `None` without a base.
    pub fn token_uri(&self, token_id: TokenId) -> Result<Option<String>, CredentialError> {
        self.token(token_id)?;
        Ok(self
            .metadata
            .base_uri
            .as_ref()
            .map(|base| format!("{base}{}", token_id.get())))
    }
}
