//! # Event Catalog
//!
//! CRUD over threshold-gated events. Mutating calls receive the
//! [`CallContext`] of the transaction and append to its [`EventLog`]; the
//! host is responsible for discarding both the state change and the log
//! entries if the surrounding call fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gt_core::{Address, CallContext, EventId, EventLog, LedgerEvent, Ownership, Timestamp};

use crate::error::CatalogError;

// ─── Event ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub organizer: Address,
    /// Minimum qualifying balance in the event's base unit (e.g. milli-ETH).
    pub threshold: u32,
    pub name: String,
    pub expiry: Timestamp,
    pub active: bool,
}

impl Event {
    /// Active and not yet expired at `now`.
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.active && now < self.expiry
    }
}

/// New values for every mutable field of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub threshold: u32,
    pub name: String,
    pub expiry: Timestamp,
    pub active: bool,
}

// ─── Catalog ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCatalog {
    address: Address,
    ownership: Ownership,
    events: BTreeMap<EventId, Event>,
    next_event_id: EventId,
}

impl EventCatalog {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            ownership: Ownership::new(owner),
            events: BTreeMap::new(),
            next_event_id: EventId::FIRST,
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
    ) -> Result<(), CatalogError> {
        self.ownership
            .transfer(self.address, &ctx.caller, new_owner, log)?;
        Ok(())
    }

    /// Publish a new event with `ctx.caller` as organizer.
    pub fn create_event(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        threshold: u32,
        name: &str,
        expiry: Timestamp,
    ) -> Result<EventId, CatalogError> {
        validate_fields(name, expiry, ctx.now)?;

        let id = self.next_event_id;
        let next = id.next().ok_or(CatalogError::EventIdExhausted)?;
        let event = Event {
            id,
            organizer: ctx.caller,
            threshold,
            name: name.to_string(),
            expiry,
            active: true,
        };
        log.emit(LedgerEvent::EventCreated {
            catalog: self.address,
            event_id: id,
            organizer: event.organizer,
            threshold,
            name: event.name.clone(),
            expiry,
        });
        self.events.insert(id, event);
        self.next_event_id = next;

        tracing::info!(event_id = %id, organizer = %ctx.caller, threshold, "event created");
        Ok(id)
    }

    /// Overwrite every mutable field. Organizer only; the new name and
    /// expiry are validated as on creation.
    pub fn update_event(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        event_id: EventId,
        update: EventUpdate,
    ) -> Result<(), CatalogError> {
        let address = self.address;
        let event = self.organizer_event_mut(ctx, event_id)?;
        validate_fields(&update.name, update.expiry, ctx.now)?;

        event.threshold = update.threshold;
        event.name = update.name;
        event.expiry = update.expiry;
        event.active = update.active;
        log.emit(updated_event(address, event));

        tracing::info!(%event_id, active = event.active, "event updated");
        Ok(())
    }

    /// Clear the active flag. Organizer only; calling it on an inactive
    /// event succeeds without emitting anything.
    pub fn deactivate_event(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        event_id: EventId,
    ) -> Result<(), CatalogError> {
        let address = self.address;
        let event = self.organizer_event_mut(ctx, event_id)?;
        if !event.active {
            return Ok(());
        }
        event.active = false;
        log.emit(updated_event(address, event));

        tracing::info!(%event_id, "event deactivated");
        Ok(())
    }

    pub fn get_event(&self, event_id: EventId) -> Result<&Event, CatalogError> {
        self.events
            .get(&event_id)
            .ok_or(CatalogError::NotFound(event_id))
    }

    /// The id the next `create_event` will assign.
    pub fn next_event_id(&self) -> EventId {
        self.next_event_id
    }

    /// All events in id order.
    pub fn list_events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn events_by_organizer<'a>(
        &'a self,
        organizer: &'a Address,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .values()
            .filter(move |e| e.organizer == *organizer)
    }

    fn organizer_event_mut(
        &mut self,
        ctx: &CallContext,
        event_id: EventId,
    ) -> Result<&mut Event, CatalogError> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or(CatalogError::NotFound(event_id))?;
        if event.organizer != ctx.caller {
            return Err(CatalogError::NotOrganizer {
                event_id,
                caller: ctx.caller,
            });
        }
        Ok(event)
    }
}

fn validate_fields(name: &str, expiry: Timestamp, now: Timestamp) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if expiry <= now {
        return Err(CatalogError::InvalidExpiry { expiry, now });
    }
    Ok(())
}

fn updated_event(catalog: Address, event: &Event) -> LedgerEvent {
    LedgerEvent::EventUpdated {
        catalog,
        event_id: event.id,
        threshold: event.threshold,
        name: event.name.clone(),
        expiry: event.expiry,
        active: event.active,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
