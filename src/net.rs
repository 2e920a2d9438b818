/*!
Net: an electrical node, its drivers, and its listeners.

A `Net` never owns a reference to anything outside the engine's arena — it
is addressed everywhere else by `NetId`, a stable handle. This is the
Rust-native form of spec §9's "store net references as ids, never as
pointers" note: the wiring graph's merge/rebuild path deletes and recreates
nets at will, and any code still holding a `NetId` for a deleted net will
simply get `TrainerError::UnknownNet` back from the engine rather than
dereferencing something that moved.
*/

use std::fmt;
use std::rc::Rc;

use crate::logic::LogicState;

/// Stable handle into the engine's net arena. Cheap to copy, compare, hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(pub(crate) u64);

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net#{}", self.0)
    }
}

/// A source that can impose a logic level on a net.
///
/// Per spec §3/§9, drivers are a small closed variant rather than a bare
/// `dyn Fn` everywhere: `ConstantHigh`/`ConstantLow`/`ConstantFloat` keep
/// rail and tied-off drivers cheap, `Copy`-free but allocation-free, and
/// trivially debuggable; `Closure` is the irreducible case for drivers
/// that close over external mutable state (a switch's boolean, a chip's
/// output register, a clock's phase).
#[derive(Clone)]
pub enum Driver {
    ConstantHigh,
    ConstantLow,
    ConstantFloat,
    Closure(Rc<dyn Fn() -> LogicState>),
}

impl Driver {
    pub fn closure<F>(f: F) -> Driver
    where
        F: Fn() -> LogicState + 'static,
    {
        Driver::Closure(Rc::new(f))
    }

    pub fn read(&self) -> LogicState {
        match self {
            Driver::ConstantHigh => LogicState::High,
            Driver::ConstantLow => LogicState::Low,
            Driver::ConstantFloat => LogicState::Float,
            Driver::Closure(f) => f(),
        }
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::ConstantHigh => f.write_str("Driver::ConstantHigh"),
            Driver::ConstantLow => f.write_str("Driver::ConstantLow"),
            Driver::ConstantFloat => f.write_str("Driver::ConstantFloat"),
            Driver::Closure(_) => f.write_str("Driver::Closure(..)"),
        }
    }
}

/// A sink notified when a net's resolved state transitions.
pub type Listener = Rc<dyn Fn(LogicState)>;

/// An electrical node: current resolved state plus its drivers and
/// listeners. Owned by the engine's arena; never cloned or moved once
/// registered.
pub struct Net {
    id: NetId,
    state: LogicState,
    drivers: Vec<Driver>,
    listeners: Vec<Listener>,
    pub is_vcc: bool,
    pub is_gnd: bool,
}

impl Net {
    pub(crate) fn new(id: NetId) -> Net {
        Net {
            id,
            state: LogicState::Float,
            drivers: Vec::new(),
            listeners: Vec::new(),
            is_vcc: false,
            is_gnd: false,
        }
    }

    pub fn id(&self) -> NetId {
        self.id
    }

    pub fn state(&self) -> LogicState {
        self.state
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn add_driver(&mut self, driver: Driver) {
        self.drivers.push(driver);
    }

    pub(crate) fn clear_drivers_only(&mut self) {
        self.drivers.clear();
    }

    pub(crate) fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Pure query: what would this net's state be if recomputed right now.
    pub fn resolve(&self) -> LogicState {
        let values: Vec<LogicState> = self.drivers.iter().map(Driver::read).collect();
        crate::logic::resolve(&values)
    }

    /// Recompute state; if it changed, store the new state and return it
    /// together with a snapshot of the listener list taken at the moment
    /// of the transition (so a listener added by another listener during
    /// notification is not invoked for this transition). Returns `None`
    /// if the state did not change.
    ///
    /// Deliberately does *not* invoke the listeners itself: callers that
    /// share the net arena behind a `RefCell` (the engine) must drop their
    /// borrow before running listener closures, since a listener may
    /// re-enter the engine (e.g. to schedule a further update).
    pub(crate) fn begin_update(&mut self) -> Option<(LogicState, Vec<Listener>)> {
        let new_state = self.resolve();
        if new_state == self.state {
            return None;
        }
        tracing::trace!(net = %self.id, from = %self.state, to = %new_state, "net transition");
        self.state = new_state;
        Some((new_state, self.listeners.clone()))
    }

    /// Convenience for standalone use (no shared arena, no reentrancy
    /// concern): recompute and notify in one call. Returns whether the
    /// state changed.
    pub fn update(&mut self) -> bool {
        match self.begin_update() {
            Some((new_state, listeners)) => {
                for listener in listeners {
                    listener(new_state);
                }
                true
            }
            None => false,
        }
    }

    /// Absorb another net's drivers and listeners (used by merge). Does
    /// not re-resolve; the caller schedules that separately.
    pub(crate) fn absorb(&mut self, mut other: Net) {
        self.drivers.append(&mut other.drivers);
        self.listeners.append(&mut other.listeners);
        self.is_vcc = self.is_vcc || other.is_vcc;
        self.is_gnd = self.is_gnd || other.is_gnd;
    }
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("drivers", &self.drivers.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
