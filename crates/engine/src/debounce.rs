// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leading-edge change coalescing.

use parking_lot::Mutex;
use pq_core::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Window inside which repeated change requests collapse into one event.
pub const CHANGE_WINDOW: Duration = Duration::from_millis(100);

/// Buffered registry events per subscriber before lagging.
const EVENT_CAPACITY: usize = 64;

/// Coalesced registry notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    /// Photos were added, removed, or changed status
    #[serde(rename = "registry:changed")]
    Changed,
}

/// Fires on the first call, then stays quiet until `window` has passed.
pub struct Debouncer<C: Clock> {
    window: Duration,
    clock: C,
    last_fired: Mutex<Option<Instant>>,
}

impl<C: Clock> Debouncer<C> {
    pub fn new(window: Duration, clock: C) -> Self {
        Self {
            window,
            clock,
            last_fired: Mutex::new(None),
        }
    }

    /// Returns true when the caller should emit now.
    pub fn ready(&self) -> bool {
        let now = self.clock.now();
        let mut last = self.last_fired.lock();
        match *last {
            Some(fired) if now.saturating_duration_since(fired) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Cloneable handle that photos and the registry use to request an update.
pub struct ChangeNotifier<C: Clock> {
    debouncer: Arc<Debouncer<C>>,
    tx: broadcast::Sender<RegistryEvent>,
}

impl<C: Clock> Clone for ChangeNotifier<C> {
    fn clone(&self) -> Self {
        Self {
            debouncer: Arc::clone(&self.debouncer),
            tx: self.tx.clone(),
        }
    }
}

impl<C: Clock> ChangeNotifier<C> {
    pub fn new(clock: C) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            debouncer: Arc::new(Debouncer::new(CHANGE_WINDOW, clock)),
            tx,
        }
    }

    /// Request an update; emitted only if the window allows it.
    pub fn request(&self) {
        if self.debouncer.ready() {
            // No subscribers is fine.
            let _ = self.tx.send(RegistryEvent::Changed);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;
