//! Controller cache, Selector/Button mapping, and the pushed-state routing
//! table (spec.md §3, §4.B, §4.C).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use symnet_protocol::{ControllerNumber, ControllerState, RawValue, SymnetClient};
use tokio::sync::{mpsc, Mutex};

use crate::error::DispatcherError;

/// Last-known value goes stale after this long (spec.md §3).
pub const VALUE_TTL: Duration = Duration::from_secs(10);

/// `(controller, old_value, new_value) -> future`, scheduled fire-and-forget
/// so a slow observer never blocks the cache (spec.md §4.B).
pub type Observer = Arc<dyn Fn(RawValue, RawValue) -> BoxFuture<'static, ()> + Send + Sync>;

/// The TTL-cached raw value plus its observer list, shared by every
/// Controller-like thing (live controllers and the dummy selector alike —
/// spec.md §9 prefers this over a class hierarchy).
#[derive(Default)]
pub struct Cache {
    raw_value: Mutex<RawValue>,
    raw_value_time: Mutex<Option<Instant>>,
    observers: Mutex<Vec<Observer>>,
}

impl Cache {
    async fn is_fresh(&self) -> bool {
        matches!(*self.raw_value_time.lock().await, Some(t) if t.elapsed() < VALUE_TTL)
    }

    async fn cached(&self) -> RawValue {
        *self.raw_value.lock().await
    }

    async fn add_observer(&self, observer: Observer) {
        self.observers.lock().await.push(observer);
    }

    /// Assigns the new value, stamping freshness, and fires observers iff
    /// the value actually changed (spec.md invariant: "every observer is
    /// called exactly once with (old, new)" when `v != previous`).
    async fn set(&self, value: RawValue) {
        let old = {
            let mut raw = self.raw_value.lock().await;
            let old = *raw;
            *raw = value;
            *self.raw_value_time.lock().await = Some(Instant::now());
            old
        };
        if old != value {
            let observers = self.observers.lock().await.clone();
            for observer in observers {
                tokio::spawn(observer(old, value));
            }
        }
    }
}

/// One live controller on the DSP, backed by a [`SymnetClient`].
pub struct Controller {
    number: ControllerNumber,
    client: SymnetClient,
    cache: Cache,
}

impl Controller {
    pub fn new(number: ControllerNumber, client: SymnetClient) -> Arc<Controller> {
        Arc::new(Controller {
            number,
            client,
            cache: Cache::default(),
        })
    }

    pub fn number(&self) -> ControllerNumber {
        self.number
    }

    pub async fn add_observer(&self, observer: Observer) {
        self.cache.add_observer(observer).await;
    }

    /// Returns the cached value if fresh, otherwise issues `GS2` and waits.
    pub async fn get_raw_value(&self) -> Result<RawValue, DispatcherError> {
        if !self.cache.is_fresh().await {
            let value = self.client.gs2(self.number).await?;
            self.cache.set(value).await;
        }
        Ok(self.cache.cached().await)
    }

    /// Updates the cache and notifies observers, without touching the DSP.
    /// Used when a local set is about to be followed by `assure_current_state`,
    /// and when routing a pushed value.
    pub async fn set_raw_value(&self, value: RawValue) {
        self.cache.set(value).await;
    }

    /// `CS <n> <v>` with the currently cached value, awaiting `ACK`.
    pub async fn assure_current_state(&self) -> Result<(), DispatcherError> {
        let value = self.cache.cached().await;
        self.client.cs(self.number, value).await?;
        Ok(())
    }
}

/// Tags a [`Selector`] as talking to a real controller or performing no I/O
/// at all (spec.md §4.C, §9 "prefer tagged variants ... over deep inheritance").
pub enum SelectorKind {
    Live(Arc<Controller>),
    Dummy { number: ControllerNumber, cache: Cache },
}

/// A discrete multi-position control, quantized to `position_count`
/// positions over the controller's `0..=65535` raw range.
pub struct Selector {
    kind: SelectorKind,
    position_count: u32,
}

impl Selector {
    pub fn live(controller: Arc<Controller>, position_count: u32) -> Selector {
        assert!(position_count >= 2, "position_count must be >= 2");
        Selector {
            kind: SelectorKind::Live(controller),
            position_count,
        }
    }

    /// A selector that performs no protocol I/O — used for off-device
    /// testing (spec.md §4.C).
    pub fn dummy(number: ControllerNumber, position_count: u32) -> Selector {
        assert!(position_count >= 2, "position_count must be >= 2");
        Selector {
            kind: SelectorKind::Dummy {
                number,
                cache: Cache::default(),
            },
            position_count,
        }
    }

    pub fn position_count(&self) -> u32 {
        self.position_count
    }

    pub fn number(&self) -> ControllerNumber {
        match &self.kind {
            SelectorKind::Live(c) => c.number(),
            SelectorKind::Dummy { number, .. } => *number,
        }
    }

    pub async fn add_observer(&self, observer: Observer) {
        match &self.kind {
            SelectorKind::Live(c) => c.add_observer(observer).await,
            SelectorKind::Dummy { cache, .. } => cache.add_observer(observer).await,
        }
    }

    async fn get_raw_value(&self) -> Result<RawValue, DispatcherError> {
        match &self.kind {
            SelectorKind::Live(c) => c.get_raw_value().await,
            SelectorKind::Dummy { cache, .. } => Ok(cache.cached().await),
        }
    }

    async fn set_raw_value(&self, value: RawValue) {
        match &self.kind {
            SelectorKind::Live(c) => c.set_raw_value(value).await,
            SelectorKind::Dummy { cache, .. } => cache.set(value).await,
        }
    }

    pub async fn get_position(&self) -> Result<u32, DispatcherError> {
        let raw = self.get_raw_value().await?;
        Ok(position_of(raw, self.position_count))
    }

    /// Maps the position to a raw value, applies it to the local cache
    /// immediately (so observers fire on the local change, per spec.md
    /// §4.C), then awaits `CS`/`ACK` on live selectors. Errors on dummy
    /// selectors (spec.md §4.C: "assure_current_state is an error").
    pub async fn set_position(&self, position: u32) -> Result<(), DispatcherError> {
        if position < 1 || position > self.position_count {
            return Err(DispatcherError::PositionOutOfRange {
                position,
                max: self.position_count,
            });
        }
        let raw = raw_of(position, self.position_count);
        self.set_raw_value(raw).await;
        match &self.kind {
            SelectorKind::Live(c) => {
                c.assure_current_state().await?;
                Ok(())
            }
            SelectorKind::Dummy { .. } => Err(DispatcherError::DummyNotSupported),
        }
    }
}

/// Maps a 1-indexed position to its raw value: `round((p-1)/(n-1) * 65535)`.
pub fn raw_of(position: u32, position_count: u32) -> RawValue {
    let p = f64::from(position - 1);
    let n = f64::from(position_count - 1);
    ((p / n) * 65535.0).round() as RawValue
}

/// Inverse of [`raw_of`]: `round(raw/65535 * (n-1) + 1)`.
pub fn position_of(raw: RawValue, position_count: u32) -> u32 {
    let r = f64::from(raw.clamp(0, 65535));
    let n = f64::from(position_count - 1);
    ((r / 65535.0) * n + 1.0).round() as u32
}

/// An on/off control: "on" is raw 65535, "off" is raw 0, "pressed" is any
/// non-zero raw value (spec.md §4.C).
pub struct Button {
    controller: Arc<Controller>,
}

impl Button {
    pub fn new(controller: Arc<Controller>) -> Button {
        Button { controller }
    }

    pub async fn on(&self) -> Result<(), DispatcherError> {
        self.controller.set_raw_value(65535).await;
        self.controller.assure_current_state().await
    }

    pub async fn off(&self) -> Result<(), DispatcherError> {
        self.controller.set_raw_value(0).await;
        self.controller.assure_current_state().await
    }

    pub async fn pressed(&self) -> Result<bool, DispatcherError> {
        Ok(self.controller.get_raw_value().await? > 0)
    }
}

/// Owns the UDP transport and routes pushed [`ControllerState`]s to the
/// `Controller` each one belongs to (spec.md §3, "SymNetDevice").
pub struct SymnetDevice {
    controllers: Mutex<HashMap<ControllerNumber, Arc<Controller>>>,
    client: SymnetClient,
}

impl SymnetDevice {
    pub fn new(client: SymnetClient) -> Arc<SymnetDevice> {
        Arc::new(SymnetDevice {
            controllers: Mutex::new(HashMap::new()),
            client,
        })
    }

    pub fn client(&self) -> SymnetClient {
        self.client.clone()
    }

    pub async fn define_controller(&self, number: ControllerNumber) -> Arc<Controller> {
        let controller = Controller::new(number, self.client.clone());
        self.controllers.lock().await.insert(number, controller.clone());
        controller
    }

    /// Consumes `push_rx` forever, routing each pushed state to its owning
    /// controller. Unknown controller numbers are dropped (nothing owns
    /// them locally).
    pub async fn run_push_router(self: Arc<Self>, mut push_rx: mpsc::Receiver<ControllerState>) {
        while let Some(state) = push_rx.recv().await {
            let controller = self.controllers.lock().await.get(&state.number).cloned();
            if let Some(controller) = controller {
                controller.set_raw_value(state.value).await;
            } else {
                tracing::debug!(number = state.number, "push for unknown controller, dropping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_mapping_round_trips() {
        for n in [2, 3, 5, 10] {
            for p in 1..=n {
                assert_eq!(position_of(raw_of(p, n), n), p, "n={n} p={p}");
            }
        }
    }

    #[test]
    fn raw_of_is_within_range() {
        for n in [2, 3, 7] {
            for p in 1..=n {
                let raw = raw_of(p, n);
                assert!((0..=65535).contains(&raw));
            }
        }
    }

    #[test]
    fn three_position_selector_matches_worked_example() {
        // automat=1, studio A=2, studio B=3 (spec.md §8 scenarios).
        assert_eq!(raw_of(1, 3), 0);
        assert_eq!(raw_of(2, 3), 32768);
        assert_eq!(raw_of(3, 3), 65535);
    }

    #[tokio::test]
    async fn dummy_selector_performs_no_io_and_rejects_assure() {
        let selector = Selector::dummy(1, 3);
        selector.set_raw_value(0).await;
        assert_eq!(selector.get_position().await.unwrap(), 1);

        let err = selector.set_position(2).await.unwrap_err();
        assert!(matches!(err, DispatcherError::DummyNotSupported));
        // The local value was still updated before the I/O attempt.
        assert_eq!(selector.get_position().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn observer_fires_once_on_change_and_not_on_repeat() {
        let cache = Cache::default();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls2 = calls.clone();
        cache
            .add_observer(Arc::new(move |old, new| {
                let calls = calls2.clone();
                Box::pin(async move {
                    calls.lock().await.push((old, new));
                })
            }))
            .await;

        cache.set(100).await;
        cache.set(100).await; // no-op, unchanged
        cache.set(200).await;

        // Observers are spawned fire-and-forget; give them a moment to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let seen = calls.lock().await.clone();
        assert_eq!(seen, vec![(0, 100), (100, 200)]);
    }
}
