//! Guarded settings store with change notification.
//!
//! One [`SettingsService`] instance owns one configuration value for the
//! life of the process. Every access goes through a closure executed
//! under the store's lock, so observers never see a half-mutated value:
//!
//! ```text
//!   config endpoint ──▶ update(|c| …, "http") ──┐
//!                                               ▼
//!                                 ┌───────────────────────────┐
//!                                 │  SettingsService<T>       │
//!   control tick ──▶ read(|c| …) ─┤  ┌───────┐  ┌──────────┐  │
//!                                 │  │ value │  │ handlers │  │
//!                                 │  └───────┘  └────┬─────┘  │
//!                                 └─────────────────┼─────────┘
//!                                                   ▼
//!                                     cb("http") · cb("http") · …
//! ```
//!
//! Update handlers run while the lock is still held, in registration
//! order, and receive the origin id of the change so subscribers can
//! suppress their own echo. The lock is reentrant for the calling
//! context: a handler may call back into its own store without
//! deadlocking, while every other execution context blocks until the
//! whole update (mutation plus notification) has finished. Keep handlers
//! short; they stall all other contexts for their duration.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

// ═══════════════════════════════════════════════════════════════
//  Handler registration
// ═══════════════════════════════════════════════════════════════

/// Callback invoked after every propagating update. The argument is the
/// opaque origin id the updater passed to [`SettingsService::update`].
pub type UpdateCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Identity of a registered update handler.
///
/// Ids are unique per store for the life of the process and never reused
/// after removal. [`HandlerId::NONE`] is reserved so callers can keep
/// "no handler registered" in a plain field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HandlerId(u64);

impl HandlerId {
    /// The reserved "no handler" id. Never assigned by registration.
    pub const NONE: Self = Self(0);

    /// Returns `true` for the reserved [`NONE`](Self::NONE) id.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

struct HandlerEntry {
    id: HandlerId,
    callback: UpdateCallback,
    removable: bool,
}

/// Everything the lock guards: the value plus the handler registry.
/// Registration shares the lock with updates, so an add racing a
/// notification is ordered rather than torn.
struct Inner<T> {
    value: T,
    handlers: Vec<HandlerEntry>,
    next_id: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Settings service
// ═══════════════════════════════════════════════════════════════

/// Guarded settings container, generic over the value type.
///
/// The critical-section lock gives cross-context exclusion with
/// same-context reentrancy, so the store is safe to touch from the
/// control loop and from transport callbacks alike.
pub struct SettingsService<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<T>>>,
}

impl<T> SettingsService<T> {
    /// Wrap `value` in a fresh store with no registered handlers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                value,
                handlers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    // ── Value access ──────────────────────────────────────────

    /// Run `f` against the current value under the lock and return its
    /// result. Never notifies.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.lock(|cell| f(&cell.borrow().value))
    }

    /// Mutate the value under the lock without notifying handlers.
    ///
    /// For changes that must not retrigger dependent logic: the initial
    /// load from persistence, or a subscriber writing back its own echo.
    pub fn update_silent(&self, f: impl FnOnce(&mut T)) {
        self.inner.lock(|cell| f(&mut cell.borrow_mut().value));
    }

    /// Mutate the value, then invoke every registered handler with
    /// `origin_id` in registration order, still holding the lock.
    ///
    /// Each handler runs to completion before the next starts. Handlers
    /// may re-enter this store from the same context. A handler added
    /// during the notification is first invoked on the next update; a
    /// handler removed during it still receives the one in flight.
    pub fn update(&self, f: impl FnOnce(&mut T), origin_id: &str) {
        self.inner.lock(|cell| {
            f(&mut cell.borrow_mut().value);
            Self::notify(cell, origin_id);
        });
    }

    /// Re-run notification without mutating, e.g. after a bulk
    /// [`update_silent`](Self::update_silent) load that downstream
    /// subscribers still need to observe.
    pub fn call_update_handlers(&self, origin_id: &str) {
        self.inner.lock(|cell| Self::notify(cell, origin_id));
    }

    // ── Handler registry ──────────────────────────────────────

    /// Register `cb` to run after every propagating update and return
    /// its id.
    ///
    /// Handlers registered with `removable = false` survive every
    /// [`remove_update_handler`](Self::remove_update_handler) call;
    /// always-on core subscribers use this to protect themselves from
    /// dynamic teardown paths.
    pub fn add_update_handler(
        &self,
        cb: impl Fn(&str) + Send + Sync + 'static,
        removable: bool,
    ) -> HandlerId {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            inner.next_id += 1;
            let id = HandlerId(inner.next_id);
            inner.handlers.push(HandlerEntry {
                id,
                callback: Arc::new(cb),
                removable,
            });
            id
        })
    }

    /// Remove the handler with `id`, if present and removable. Unknown
    /// ids, [`HandlerId::NONE`], and non-removable handlers are silently
    /// left alone.
    pub fn remove_update_handler(&self, id: HandlerId) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if let Some(pos) = inner
                .handlers
                .iter()
                .position(|h| h.id == id && h.removable)
            {
                inner.handlers.remove(pos);
            }
        });
    }

    /// Number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().handlers.len())
    }

    // ── Serializer boundary ───────────────────────────────────

    /// Mutate through a caller-supplied deserializer reading from
    /// `source`, then notify. The store stays agnostic to the encoding;
    /// the canonical JSON pair lives in [`crate::config`].
    pub fn update_from<S>(
        &self,
        source: &S,
        deserializer: impl FnOnce(&S, &mut T),
        origin_id: &str,
    ) {
        self.update(|value| deserializer(source, value), origin_id);
    }

    /// [`update_from`](Self::update_from) without notification.
    pub fn update_from_silent<S>(&self, source: &S, deserializer: impl FnOnce(&S, &mut T)) {
        self.update_silent(|value| deserializer(source, value));
    }

    /// Serialize the current value into `out` through a caller-supplied
    /// serializer, under the lock.
    pub fn read_into<O>(&self, out: &mut O, serializer: impl FnOnce(&T, &mut O)) {
        self.read(|value| serializer(value, out));
    }

    // ── Internal ──────────────────────────────────────────────

    /// Invoke every handler with no `RefCell` borrow live, so callbacks
    /// can re-enter the store from their own context. The snapshot fixes
    /// the recipient set at notification start.
    fn notify(cell: &RefCell<Inner<T>>, origin_id: &str) {
        let snapshot: Vec<UpdateCallback> = cell
            .borrow()
            .handlers
            .iter()
            .map(|h| Arc::clone(&h.callback))
            .collect();
        for callback in snapshot {
            callback(origin_id);
        }
    }
}
