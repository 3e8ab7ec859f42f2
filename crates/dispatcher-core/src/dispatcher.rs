//! The dispatcher finite-state machine: states, the transition table,
//! entry actions, LED recipes, timer gating, and selector reconciliation
//! (spec.md §4.D, §4.E, §9).

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;

use crate::controller::Selector;
use crate::error::DispatcherError;
use crate::persistence::{PersistedState, PersistenceStore};
use crate::studio::{ButtonEvent, ButtonKind, LedStateTarget, LedStatus, Studio, StudioLedStatus};
use crate::timers::{run_next_hour_timer, CancelableTimer};

pub const DEFAULT_IMMEDIATE_STATE_DURATION: Duration = Duration::from_secs(300);
pub const DEFAULT_IMMEDIATE_RELEASE_DURATION: Duration = Duration::from_secs(30);
const KEEPALIVE_MIN: Duration = Duration::from_secs(300);
const KEEPALIVE_MAX: Duration = Duration::from_secs(600);

/// The eleven-odd-named but ten-variant FSM states of spec.md §4.D. Each
/// carries an LED recipe (see [`led_recipe`]) and zero or more timer
/// tokens encoded in its name (see [`State::has_next_hour_token`] et al).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    AutomatOnAir,
    AutomatOnAirImmediateStateX,
    FromAutomatChangeToStudioXOnNextHour,
    StudioXOnAir,
    FromStudioXChangeToAutomatOnNextHour,
    StudioXOnAirImmediateState,
    StudioXOnAirImmediateRelease,
    FromStudioXChangeToStudioYOnNextHour,
    StudioXOnAirStudioYTakeoverRequest,
    Noop,
}

impl State {
    pub fn has_x(self) -> bool {
        !matches!(self, State::AutomatOnAir | State::Noop)
    }

    pub fn has_y(self) -> bool {
        matches!(
            self,
            State::FromStudioXChangeToStudioYOnNextHour | State::StudioXOnAirStudioYTakeoverRequest
        )
    }

    fn has_next_hour_token(self) -> bool {
        matches!(
            self,
            State::FromAutomatChangeToStudioXOnNextHour
                | State::FromStudioXChangeToAutomatOnNextHour
                | State::FromStudioXChangeToStudioYOnNextHour
        )
    }

    fn has_immediate_state_token(self) -> bool {
        matches!(self, State::AutomatOnAirImmediateStateX | State::StudioXOnAirImmediateState)
    }

    fn has_immediate_release_token(self) -> bool {
        matches!(self, State::StudioXOnAirImmediateRelease)
    }
}

/// The six logical button-derived triggers plus the three timer-expiry
/// triggers (spec.md §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    TakeoverX,
    ReleaseX,
    ImmediateX,
    TakeoverY,
    ReleaseY,
    ImmediateY,
    NextHour,
    ImmediateStateTimeout,
    ImmediateReleaseTimeout,
}

/// What drives one call to [`Dispatcher::fire`]: either a trigger already
/// resolved by a timer expiry (or a test), or a raw button event whose X/Y
/// role mapping still needs to be resolved against current state.
enum Stimulus {
    Trigger(Trigger, Option<Arc<Studio>>),
    Button(ButtonEvent),
}

/// The authoritative (source, trigger) -> (dest, switch_to_y) table from
/// `SPEC_FULL.md` §4.D, reconstructed from spec.md §8's worked scenarios
/// since the original `transitions` list was not part of the retrieval
/// pack. Absent pairs are `ignore_invalid_triggers` no-ops.
fn transition(source: State, trigger: Trigger) -> Option<(State, bool)> {
    use State::*;
    use Trigger::*;
    let dest = match (source, trigger) {
        (AutomatOnAir, TakeoverX) => FromAutomatChangeToStudioXOnNextHour,
        (AutomatOnAir, ImmediateX) => AutomatOnAirImmediateStateX,
        (AutomatOnAirImmediateStateX, ReleaseX) => AutomatOnAir,
        (AutomatOnAirImmediateStateX, ImmediateStateTimeout) => AutomatOnAir,
        (FromAutomatChangeToStudioXOnNextHour, ReleaseX) => AutomatOnAir,
        (FromAutomatChangeToStudioXOnNextHour, NextHour) => StudioXOnAir,
        (StudioXOnAir, ReleaseX) => FromStudioXChangeToAutomatOnNextHour,
        (StudioXOnAir, ImmediateX) => StudioXOnAirImmediateState,
        (StudioXOnAir, TakeoverY) => StudioXOnAirStudioYTakeoverRequest,
        (FromStudioXChangeToAutomatOnNextHour, TakeoverX) => StudioXOnAir,
        (FromStudioXChangeToAutomatOnNextHour, NextHour) => AutomatOnAir,
        (StudioXOnAirImmediateState, ReleaseX) => StudioXOnAirImmediateRelease,
        (StudioXOnAirImmediateState, ImmediateStateTimeout) => StudioXOnAirImmediateRelease,
        (StudioXOnAirImmediateRelease, TakeoverX) => StudioXOnAir,
        (StudioXOnAirImmediateRelease, ImmediateReleaseTimeout) => FromStudioXChangeToAutomatOnNextHour,
        (StudioXOnAirStudioYTakeoverRequest, ReleaseX) => FromStudioXChangeToStudioYOnNextHour,
        (StudioXOnAirStudioYTakeoverRequest, ReleaseY) => StudioXOnAir,
        (StudioXOnAirStudioYTakeoverRequest, TakeoverX) => StudioXOnAirStudioYTakeoverRequest,
        (FromStudioXChangeToStudioYOnNextHour, ReleaseY) => StudioXOnAir,
        (FromStudioXChangeToStudioYOnNextHour, NextHour) => return Some((StudioXOnAir, true)),
        (Noop, _) => Noop,
        _ => return None,
    };
    Some((dest, false))
}

/// The LED recipe for a state (spec.md §6's table).
pub fn led_recipe(state: State) -> LedStateTarget {
    use State::*;
    let off = StudioLedStatus::ALL_OFF;
    match state {
        AutomatOnAir => LedStateTarget { x: off, y: off, other: off },
        AutomatOnAirImmediateStateX => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::OFF, yellow: LedStatus::OFF, red: LedStatus::ON },
            y: off,
            other: off,
        },
        FromAutomatChangeToStudioXOnNextHour => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::BLINK, yellow: LedStatus::OFF, red: LedStatus::OFF },
            y: off,
            other: off,
        },
        StudioXOnAir => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::ON, yellow: LedStatus::OFF, red: LedStatus::OFF },
            y: off,
            other: off,
        },
        FromStudioXChangeToAutomatOnNextHour => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::ON, yellow: LedStatus::BLINK, red: LedStatus::OFF },
            y: off,
            other: off,
        },
        StudioXOnAirImmediateState => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::ON, yellow: LedStatus::OFF, red: LedStatus::ON },
            y: off,
            other: off,
        },
        StudioXOnAirImmediateRelease => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::ON, yellow: LedStatus::BLINK, red: LedStatus::ON },
            y: off,
            other: StudioLedStatus { green: LedStatus::OFF, yellow: LedStatus::BLINK, red: LedStatus::BLINK },
        },
        FromStudioXChangeToStudioYOnNextHour => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::ON, yellow: LedStatus::ON, red: LedStatus::OFF },
            y: StudioLedStatus { green: LedStatus::BLINK, yellow: LedStatus::OFF, red: LedStatus::OFF },
            other: off,
        },
        StudioXOnAirStudioYTakeoverRequest => LedStateTarget {
            x: StudioLedStatus { green: LedStatus::ON, yellow: LedStatus::BLINK, red: LedStatus::OFF },
            y: StudioLedStatus { green: LedStatus::OFF, yellow: LedStatus::ON, red: LedStatus::OFF },
            other: off,
        },
        Noop => LedStateTarget { x: off, y: off, other: off },
    }
}

/// One configured studio and the selector position it occupies while on
/// air.
pub struct StudioDefinition {
    pub studio: Arc<Studio>,
    pub selector_position: u32,
}

/// Static configuration the dispatcher is built with (spec.md §6
/// "Configuration inputs").
pub struct DispatcherConfig {
    pub automat_selector_position: u32,
    pub studios: Vec<StudioDefinition>,
    pub immediate_state_duration: Duration,
    pub immediate_release_duration: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            automat_selector_position: 1,
            studios: Vec::new(),
            immediate_state_duration: DEFAULT_IMMEDIATE_STATE_DURATION,
            immediate_release_duration: DEFAULT_IMMEDIATE_RELEASE_DURATION,
        }
    }
}

struct Inner {
    x: Option<Arc<Studio>>,
    y: Option<Arc<Studio>>,
    state: State,
}

/// The dispatcher singleton: owns (x, y, state), the selector it drives,
/// and the three gated timers. `(x, y, state, timers)` is guarded by a
/// single mutex held for the duration of one transition (spec.md §5).
pub struct Dispatcher {
    inner: Mutex<Inner>,
    selector: Arc<Selector>,
    studios: Vec<StudioDefinition>,
    automat_selector_position: u32,
    immediate_state_duration: Duration,
    immediate_release_duration: Duration,
    next_hour_timer: CancelableTimer,
    immediate_state_timer: CancelableTimer,
    immediate_release_timer: CancelableTimer,
    persistence: PersistenceStore,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig, selector: Arc<Selector>, persistence: PersistenceStore) -> Arc<Dispatcher> {
        Arc::new(Dispatcher {
            inner: Mutex::new(Inner { x: None, y: None, state: State::AutomatOnAir }),
            selector,
            studios: config.studios,
            automat_selector_position: config.automat_selector_position,
            immediate_state_duration: config.immediate_state_duration,
            immediate_release_duration: config.immediate_release_duration,
            next_hour_timer: CancelableTimer::new(),
            immediate_state_timer: CancelableTimer::new(),
            immediate_release_timer: CancelableTimer::new(),
            persistence,
        })
    }

    /// Registers the selector-divergence observer and restores persisted
    /// state, if any. Must be called once before handling events.
    pub async fn start(self: &Arc<Self>) -> Result<(), DispatcherError> {
        let weak = Arc::downgrade(self);
        let position_count = self.selector.position_count();
        self.selector
            .add_observer(Arc::new(move |_old, new_raw| {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(dispatcher) = weak.upgrade() {
                        dispatcher.on_external_selector_change(new_raw, position_count).await;
                    }
                })
            }))
            .await;

        match self.persistence.load().await {
            Ok(Some(persisted)) => self.restore(persisted).await?,
            Ok(None) => {
                tracing::warn!("no persisted dispatcher state found, starting from automat_on_air");
                self.enter_state(State::AutomatOnAir, State::AutomatOnAir).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "persisted dispatcher state is malformed, starting from automat_on_air");
                self.enter_state(State::AutomatOnAir, State::AutomatOnAir).await;
            }
        }
        Ok(())
    }

    async fn restore(self: &Arc<Self>, persisted: PersistedState) -> Result<(), DispatcherError> {
        let resolve = |name: &str| -> Result<Option<Arc<Studio>>, DispatcherError> {
            if name.is_empty() {
                return Ok(None);
            }
            self.studios
                .iter()
                .find(|d| d.studio.name == name)
                .map(|d| Some(d.studio.clone()))
                .ok_or_else(|| DispatcherError::UnknownStudio(name.to_string()))
        };
        let x = resolve(&persisted.x)?;
        let y = resolve(&persisted.y)?;
        let state = state_from_name(&persisted.state).unwrap_or(State::AutomatOnAir);

        {
            let mut inner = self.inner.lock().await;
            inner.x = x;
            inner.y = y;
            inner.state = state;
        }
        if state.has_x() {
            self.reconcile().await;
        } else {
            self.reconcile_automat().await;
        }
        self.apply_led_recipe(state).await;
        Ok(())
    }

    /// Maps a physical button event to one of the six logical triggers
    /// per spec.md §4.D's role-mapping rule, then fires it. Events that
    /// don't resolve to X or Y are dropped. The role mapping is resolved
    /// inside `fire`'s own lock acquisition (see [`Stimulus::Button`]) so
    /// it can't race a concurrently-running timer-fired transition.
    pub async fn handle_button_event(self: &Arc<Self>, event: ButtonEvent) {
        self.fire(Stimulus::Button(event)).await;
    }

    /// Drives one FSM transition, or silently ignores an undefined
    /// (source, trigger) pair (`ignore_invalid_triggers`, spec.md §4.D).
    ///
    /// Boxed rather than a plain `async fn`: timer expiry re-enters this
    /// same method, and an `async fn` that calls itself (even indirectly,
    /// through a spawned closure built in [`Self::apply_timer_gating`])
    /// produces an infinitely-sized future type. Boxing erases that.
    fn fire<'a>(
        self: &'a Arc<Self>,
        stimulus: Stimulus,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().await;

            // Resolving a button event's X/Y role mapping here, under the
            // same lock acquisition that decides and applies the
            // transition, is what keeps the mapping from going stale
            // against a concurrently-running timer-fired `fire` call
            // (spec.md §5 "Shared mutable state").
            let (trigger, studio) = match stimulus {
                Stimulus::Trigger(trigger, studio) => (trigger, studio),
                Stimulus::Button(event) => {
                    let is_x = match &inner.x {
                        None => true,
                        Some(x) => **x == *event.studio,
                    };
                    let is_y = !is_x
                        && match &inner.y {
                            None => true,
                            Some(y) => **y == *event.studio,
                        };

                    let trigger = if is_x {
                        Some(match event.button {
                            ButtonKind::Takeover => Trigger::TakeoverX,
                            ButtonKind::Release => Trigger::ReleaseX,
                            ButtonKind::Immediate => Trigger::ImmediateX,
                        })
                    } else if is_y {
                        Some(match event.button {
                            ButtonKind::Takeover => Trigger::TakeoverY,
                            ButtonKind::Release => Trigger::ReleaseY,
                            ButtonKind::Immediate => Trigger::ImmediateY,
                        })
                    } else {
                        None
                    };

                    match trigger {
                        Some(trigger) => (trigger, Some(event.studio)),
                        None => {
                            tracing::info!(studio = %event.studio.name, button = ?event.button, "button event dropped (neither X nor Y)");
                            return;
                        }
                    }
                }
            };

            let source = inner.state;
            let Some((dest, switch_to_y)) = transition(source, trigger) else {
                tracing::info!(?source, ?trigger, "invalid trigger ignored");
                return;
            };

            if switch_to_y {
                inner.x = inner.y.take();
            }
            if trigger == Trigger::TakeoverX && inner.x.is_none() {
                inner.x = studio.clone();
            }
            if trigger == Trigger::TakeoverY && inner.y.is_none() {
                inner.y = studio.clone();
            }
            if !dest.has_x() {
                inner.x = None;
            }
            if !dest.has_y() {
                inner.y = None;
            }
            inner.state = dest;
            let x = inner.x.clone();
            let y = inner.y.clone();
            drop(inner);

            tracing::info!(?source, ?trigger, dest = ?dest, "dispatcher transition");
            self.audit(dest, &x, &y);
            self.apply_timer_gating(source, dest, x.clone(), y.clone()).await;
            self.apply_led_recipe(dest).await;
            self.enter_state(source, dest).await;
        })
    }

    /// Entry actions for `automat_on_air` and `studio_X_on_air` (spec.md
    /// §4.D "Entry actions"); every other state leaves the selector target
    /// untouched.
    async fn enter_state(self: &Arc<Self>, _source: State, dest: State) {
        match dest {
            State::AutomatOnAir => self.reconcile_automat().await,
            State::StudioXOnAir => self.reconcile().await,
            _ => {}
        }
    }

    async fn reconcile_automat(self: &Arc<Self>) {
        if let Err(e) = self.selector.set_position(self.automat_selector_position).await {
            tracing::error!(error = %e, "failed to reconcile selector to automat position");
        }
    }

    /// Reconciles the selector to X's configured position, or does
    /// nothing if X is unset (e.g. called speculatively during restore).
    async fn reconcile(self: &Arc<Self>) {
        let x = self.inner.lock().await.x.clone();
        let Some(x) = x else { return };
        let Some(def) = self.studios.iter().find(|d| d.studio == x) else {
            tracing::error!(studio = %x.name, "on-air studio has no configured selector position");
            return;
        };
        if let Err(e) = self.selector.set_position(def.selector_position).await {
            tracing::error!(error = %e, studio = %x.name, "failed to reconcile selector to studio position");
        }
    }

    /// The current intended selector position, used by the keepalive loop
    /// and the divergence check.
    async fn intended_position(&self) -> u32 {
        let inner = self.inner.lock().await;
        match &inner.x {
            None => self.automat_selector_position,
            Some(x) => self
                .studios
                .iter()
                .find(|d| &d.studio == x)
                .map(|d| d.selector_position)
                .unwrap_or(self.automat_selector_position),
        }
    }

    /// Invoked from the selector's observer stream; re-issues the intended
    /// position if the DSP's reported position diverges (spec.md §4.D
    /// "Selector reconciliation").
    async fn on_external_selector_change(self: &Arc<Self>, new_raw: i32, position_count: u32) {
        let observed = crate::controller::position_of(new_raw, position_count);
        let intended = self.intended_position().await;
        if observed != intended {
            tracing::warn!(observed, intended, "selector diverged from dispatcher target, reconciling");
            if let Err(e) = self.selector.set_position(intended).await {
                tracing::error!(error = %e, "failed to reconcile diverged selector");
            }
        }
    }

    /// Runs forever, reconciling unconditionally every 300-600 s
    /// (spec.md §4.D keepalive loop). Intended to be spawned as a
    /// background task alongside the dispatcher.
    pub async fn run_keepalive_loop(self: Arc<Self>) {
        loop {
            let wait = rand::thread_rng().gen_range(KEEPALIVE_MIN..KEEPALIVE_MAX);
            tokio::time::sleep(wait).await;
            let intended = self.intended_position().await;
            if let Err(e) = self.selector.set_position(intended).await {
                tracing::error!(error = %e, "keepalive reconciliation failed");
            }
        }
    }

    /// Gates the three name-driven timers per spec.md §4.D: a token
    /// present in both source and destination leaves the running timer
    /// alone; present only in the source, cancel; present only in the
    /// destination, start.
    async fn apply_timer_gating(self: &Arc<Self>, source: State, dest: State, x: Option<Arc<Studio>>, y: Option<Arc<Studio>>) {
        let _ = &y;
        match (source.has_next_hour_token(), dest.has_next_hour_token()) {
            (true, false) => self.next_hour_timer.cancel().await,
            (false, true) => {
                let weak = Arc::downgrade(self);
                self.next_hour_timer
                    .start_if_idle(async move {
                        run_next_hour_timer().await;
                        if let Some(d) = weak.upgrade() {
                            d.fire(Stimulus::Trigger(Trigger::NextHour, None)).await;
                        }
                    })
                    .await;
            }
            _ => {}
        }

        match (source.has_immediate_state_token(), dest.has_immediate_state_token()) {
            (true, false) => self.immediate_state_timer.cancel().await,
            (false, true) => {
                let weak = Arc::downgrade(self);
                let duration = self.immediate_state_duration;
                let studio = x.clone();
                self.immediate_state_timer
                    .start_if_idle(async move {
                        tokio::time::sleep(duration).await;
                        if let Some(d) = weak.upgrade() {
                            d.fire(Stimulus::Trigger(Trigger::ImmediateStateTimeout, studio)).await;
                        }
                    })
                    .await;
            }
            _ => {}
        }

        match (source.has_immediate_release_token(), dest.has_immediate_release_token()) {
            (true, false) => self.immediate_release_timer.cancel().await,
            (false, true) => {
                let weak = Arc::downgrade(self);
                let duration = self.immediate_release_duration;
                let studio = x;
                self.immediate_release_timer
                    .start_if_idle(async move {
                        tokio::time::sleep(duration).await;
                        if let Some(d) = weak.upgrade() {
                            d.fire(Stimulus::Trigger(Trigger::ImmediateReleaseTimeout, studio)).await;
                        }
                    })
                    .await;
            }
            _ => {}
        }
    }

    /// Applies the state's LED recipe to every configured studio
    /// (spec.md §4.D invariant 3: every studio gets exactly one of the
    /// x/y/other recipes).
    async fn apply_led_recipe(&self, state: State) {
        let (x, y) = {
            let inner = self.inner.lock().await;
            (inner.x.clone(), inner.y.clone())
        };
        let recipe = led_recipe(state);
        for def in &self.studios {
            let status = if Some(&def.studio) == x.as_ref() {
                recipe.x
            } else if Some(&def.studio) == y.as_ref() {
                recipe.y
            } else {
                recipe.other
            };
            def.studio.set_led_status(status);
        }
    }

    /// Logs (but never auto-corrects) a violation of the X/Y-token
    /// invariants (spec.md §4.D, §8 invariants 1-2; §9's fault-injection
    /// scenario requires this to be silent-but-logged, not corrective).
    fn audit(&self, state: State, x: &Option<Arc<Studio>>, y: &Option<Arc<Studio>>) {
        if state.has_x() != x.is_some() {
            tracing::error!(?state, has_x = x.is_some(), "invariant violated: X-token presence disagrees with x");
        }
        if state.has_y() != y.is_some() {
            tracing::error!(?state, has_y = y.is_some(), "invariant violated: Y-token presence disagrees with y");
        }
    }

    /// Current FSM state, for diagnostics and tests.
    pub async fn current_state(&self) -> State {
        self.inner.lock().await.state
    }

    pub async fn current_x(&self) -> Option<Arc<Studio>> {
        self.inner.lock().await.x.clone()
    }

    pub async fn current_y(&self) -> Option<Arc<Studio>> {
        self.inner.lock().await.y.clone()
    }

    /// Writes the current `(x, y, state)` to the persistence store
    /// (spec.md §4.F, step 3 of the cleanup sequence in §5).
    pub async fn save(&self) -> Result<(), DispatcherError> {
        let inner = self.inner.lock().await;
        let persisted = PersistedState {
            x: inner.x.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
            y: inner.y.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
            state: state_name(inner.state).to_string(),
        };
        drop(inner);
        self.persistence.save(&persisted).await
    }

    /// Cancels all timers (spec.md §5 cleanup step 2).
    pub async fn cancel_timers(&self) {
        self.next_hour_timer.cancel().await;
        self.immediate_state_timer.cancel().await;
        self.immediate_release_timer.cancel().await;
    }

    /// Fires the `next_hour` trigger without waiting for the wall clock —
    /// a test hook for exercising hour-boundary transitions on demand.
    pub async fn force_next_hour(self: &Arc<Self>) {
        self.fire(Stimulus::Trigger(Trigger::NextHour, None)).await;
    }

    /// Forces an inconsistent (state, x) pair and runs the audit, without
    /// going through a normal transition — the fault-injection scenario
    /// in spec.md §8 scenario 6. Test-only: production code can only
    /// reach inconsistency through a bug, which this exists to catch.
    #[cfg(test)]
    pub async fn debug_force_x_none_in(&self, state: State) {
        let mut inner = self.inner.lock().await;
        inner.state = state;
        inner.x = None;
        let x = inner.x.clone();
        let y = inner.y.clone();
        drop(inner);
        self.audit(state, &x, &y);
    }
}

fn state_name(state: State) -> &'static str {
    use State::*;
    match state {
        AutomatOnAir => "automat_on_air",
        AutomatOnAirImmediateStateX => "automat_on_air_immediate_state_X",
        FromAutomatChangeToStudioXOnNextHour => "from_automat_change_to_studio_X_on_next_hour",
        StudioXOnAir => "studio_X_on_air",
        FromStudioXChangeToAutomatOnNextHour => "from_studio_X_change_to_automat_on_next_hour",
        StudioXOnAirImmediateState => "studio_X_on_air_immediate_state",
        StudioXOnAirImmediateRelease => "studio_X_on_air_immediate_release",
        FromStudioXChangeToStudioYOnNextHour => "from_studio_X_change_to_studio_Y_on_next_hour",
        StudioXOnAirStudioYTakeoverRequest => "studio_X_on_air_studio_Y_takeover_request",
        Noop => "noop",
    }
}

fn state_from_name(name: &str) -> Option<State> {
    use State::*;
    Some(match name {
        "automat_on_air" => AutomatOnAir,
        "automat_on_air_immediate_state_X" => AutomatOnAirImmediateStateX,
        "from_automat_change_to_studio_X_on_next_hour" => FromAutomatChangeToStudioXOnNextHour,
        "studio_X_on_air" => StudioXOnAir,
        "from_studio_X_change_to_automat_on_next_hour" => FromStudioXChangeToAutomatOnNextHour,
        "studio_X_on_air_immediate_state" => StudioXOnAirImmediateState,
        "studio_X_on_air_immediate_release" => StudioXOnAirImmediateRelease,
        "from_studio_X_change_to_studio_Y_on_next_hour" => FromStudioXChangeToStudioYOnNextHour,
        "studio_X_on_air_studio_Y_takeover_request" => StudioXOnAirStudioYTakeoverRequest,
        "noop" => Noop,
        _ => return None,
    })
}
