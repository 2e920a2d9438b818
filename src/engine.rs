/*!
Circuit engine: owns the net arena and the event scheduler, and is the
seam where a net's resolved state becomes observable propagation.

This is the Rust-native analogue of the teacher engine's `Bus`
(src/bus.rs): `Bus` aggregates CPU-visible devices (PPU, APU, controllers,
cartridge) and drives their timing via `bus::clock::tick`; `CircuitEngine`
aggregates nets and drives their timing via `EventScheduler`. Where `Bus`
exposes `tick(cycles)` as its single timing entry point, `CircuitEngine`
exposes `step`/`run`, delegating to the scheduler exactly as `Bus::tick`
delegates to `clock::tick`.

Sharing model
=============
Drivers and listeners are closures that routinely need to call back into
the engine (a chip's clock listener schedules an output update; a switch's
driver reads a boolean the UI mutates elsewhere). So `CircuitEngine` is a
cheap `Rc`-backed handle, not a value type the caller must thread through
`&mut` — the same shape the teacher's clock module uses when it
temporarily moves the PPU out of the `Bus` "to avoid overlapping borrows"
(src/bus/clock.rs): here, the net arena and the scheduler each live behind
their own `RefCell`, and every internal method drops its borrow before
invoking a driver/listener closure that might re-enter. Nets and the
scheduler are kept in *separate* `RefCell`s precisely so a task popped from
the scheduler can schedule further tasks without racing its own borrow.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::error::TrainerError;
use crate::logic::LogicState;
use crate::net::{Driver, Listener, Net, NetId};
use crate::scheduler::{EventScheduler, TimeNs};

/// Engine-wide tunables, constructed in code (no file format — see
/// SPEC_FULL §2's configuration note: this is an ambient concern, not a
/// persistence concern).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Default chip propagation delay in nanoseconds, used by chips that
    /// don't override it explicitly.
    pub default_propagation_delay_ns: TimeNs,
    /// Default mono-pulse button active window, in nanoseconds.
    pub default_pulse_window_ns: TimeNs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_propagation_delay_ns: 10,
            default_pulse_window_ns: 100_000_000,
        }
    }
}

struct EngineState {
    nets: HashMap<NetId, Net>,
    next_net_id: u64,
    power_on: bool,
    vcc: Option<NetId>,
    gnd: Option<NetId>,
}

struct EngineShared {
    config: EngineConfig,
    state: RefCell<EngineState>,
    scheduler: RefCell<EventScheduler>,
}

/// Owns every net and the event queue; the integration point between the
/// Net resolver (§4.1) and the Event Scheduler (§4.2). Cheap to clone —
/// every clone shares the same underlying arena and queue.
#[derive(Clone)]
pub struct CircuitEngine(Rc<EngineShared>);

impl Default for CircuitEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CircuitEngine {
    pub fn new(config: EngineConfig) -> CircuitEngine {
        CircuitEngine(Rc::new(EngineShared {
            config,
            state: RefCell::new(EngineState {
                nets: HashMap::new(),
                next_net_id: 0,
                power_on: false,
                vcc: None,
                gnd: None,
            }),
            scheduler: RefCell::new(EventScheduler::new()),
        }))
    }

    pub fn config(&self) -> EngineConfig {
        self.0.config
    }

    /// Create a fresh FLOAT net with a unique id.
    pub fn create_net(&self) -> NetId {
        let mut state = self.0.state.borrow_mut();
        let id = NetId(state.next_net_id);
        state.next_net_id += 1;
        state.nets.insert(id, Net::new(id));
        id
    }

    /// Create (once) and return the VCC and GND rail nets. Their drivers
    /// are tied to this engine's global power flag: VCC reads HIGH iff
    /// power is on, else FLOAT; GND reads LOW iff power is on, else
    /// FLOAT. These are the only rails whose state is tied to a global
    /// flag (spec §3).
    pub fn rails(&self) -> (NetId, NetId) {
        {
            let state = self.0.state.borrow();
            if let (Some(vcc), Some(gnd)) = (state.vcc, state.gnd) {
                return (vcc, gnd);
            }
        }
        let vcc = self.create_net();
        let gnd = self.create_net();
        {
            let mut state = self.0.state.borrow_mut();
            state.nets.get_mut(&vcc).expect("just created").is_vcc = true;
            state.nets.get_mut(&gnd).expect("just created").is_gnd = true;
            state.vcc = Some(vcc);
            state.gnd = Some(gnd);
        }
        let power_on = self.is_power_on();
        let _ = self.add_driver(vcc, if power_on { Driver::ConstantHigh } else { Driver::ConstantFloat });
        let _ = self.add_driver(gnd, if power_on { Driver::ConstantLow } else { Driver::ConstantFloat });
        (vcc, gnd)
    }

    pub fn vcc_net(&self) -> Option<NetId> {
        self.0.state.borrow().vcc
    }

    pub fn gnd_net(&self) -> Option<NetId> {
        self.0.state.borrow().gnd
    }

    pub fn is_power_on(&self) -> bool {
        self.0.state.borrow().power_on
    }

    /// Toggle system power. Rebuilds the VCC/GND rail drivers in place
    /// (preserving listeners already attached to the rail nets, e.g. a
    /// chip's power-pin listener installed during `setup`) and schedules
    /// both rails to re-resolve.
    pub fn set_power(&self, on: bool) {
        let changed = {
            let mut state = self.0.state.borrow_mut();
            if state.power_on == on {
                false
            } else {
                state.power_on = on;
                true
            }
        };
        if !changed {
            return;
        }
        tracing::debug!(power_on = on, "system power changed");
        let (vcc, gnd) = self.rails();
        {
            let mut state = self.0.state.borrow_mut();
            state.nets.get_mut(&vcc).expect("rails just ensured").clear_drivers_only();
            state.nets.get_mut(&gnd).expect("rails just ensured").clear_drivers_only();
        }
        let _ = self.add_driver(vcc, if on { Driver::ConstantHigh } else { Driver::ConstantFloat });
        let _ = self.add_driver(gnd, if on { Driver::ConstantLow } else { Driver::ConstantFloat });
    }

    pub fn state_of(&self, net: NetId) -> Result<LogicState, TrainerError> {
        self.0
            .state
            .borrow()
            .nets
            .get(&net)
            .map(Net::state)
            .ok_or(TrainerError::UnknownNet(net))
    }

    pub fn net_exists(&self, net: NetId) -> bool {
        self.0.state.borrow().nets.contains_key(&net)
    }

    /// Permanently remove a net from the arena. This is the other half of
    /// `merge_nets`'s destruction story: where a merge destroys the
    /// absorbed net because its drivers/listeners moved into the survivor,
    /// a wiring split destroys the *old* net once every pin that used to
    /// reference it has been remapped onto a freshly created one — per
    /// spec §3/§9, a stale `NetId` held across a split must fail with
    /// `UnknownNet`, not keep resolving against an orphaned, frozen entry.
    pub fn destroy_net(&self, net: NetId) -> Result<(), TrainerError> {
        self.0.state.borrow_mut().nets.remove(&net).ok_or(TrainerError::UnknownNet(net))?;
        tracing::debug!(net = %net, "destroyed orphaned net");
        Ok(())
    }

    /// Attach a driver and enqueue an update at delay 0 so dependents
    /// observe the change (spec §4.1/§4.3).
    pub fn add_driver(&self, net: NetId, driver: Driver) -> Result<(), TrainerError> {
        {
            let mut state = self.0.state.borrow_mut();
            state
                .nets
                .get_mut(&net)
                .ok_or(TrainerError::UnknownNet(net))?
                .add_driver(driver);
        }
        self.schedule_node_update(net, 0);
        Ok(())
    }

    /// Attach a listener and invoke it once immediately with the net's
    /// current state (spec §4.3).
    pub fn add_listener(&self, net: NetId, listener: Listener) -> Result<(), TrainerError> {
        let current = {
            let mut state = self.0.state.borrow_mut();
            let n = state.nets.get_mut(&net).ok_or(TrainerError::UnknownNet(net))?;
            n.add_listener(listener.clone());
            n.state()
        };
        listener(current);
        Ok(())
    }

    /// Enqueue `update(net)` at `current_time + delay`.
    pub fn schedule_node_update(&self, net: NetId, delay: TimeNs) {
        let engine = self.clone();
        self.0.scheduler.borrow_mut().schedule(delay, move || engine.fire_net_update(net));
    }

    /// Bare task scheduling (no net update semantics attached).
    pub fn schedule(&self, delay: TimeNs, task: impl FnMut() + 'static) {
        self.0.scheduler.borrow_mut().schedule(delay, task);
    }

    /// Merge `b` into `a`: moves `b`'s drivers and listeners into `a`,
    /// deletes `b`, and schedules `a` to re-resolve. Returns the
    /// surviving id (`a`).
    pub fn merge_nets(&self, a: NetId, b: NetId) -> Result<NetId, TrainerError> {
        if a == b {
            return Ok(a);
        }
        {
            let mut state = self.0.state.borrow_mut();
            let removed = state.nets.remove(&b).ok_or(TrainerError::UnknownNet(b))?;
            let survivor = match state.nets.get_mut(&a) {
                Some(s) => s,
                None => {
                    // Put `b` back so the failed merge doesn't lose state.
                    state.nets.insert(b, removed);
                    return Err(TrainerError::UnknownNet(a));
                }
            };
            survivor.absorb(removed);
        }
        tracing::debug!(survivor = %a, absorbed = %b, "merged nets");
        self.schedule_node_update(a, 0);
        Ok(a)
    }

    /// Advance simulated time by `dt` nanoseconds, draining every task
    /// (including the net updates that chain from it) that becomes ripe.
    pub fn step(&self, dt: TimeNs) {
        {
            let mut scheduler = self.0.scheduler.borrow_mut();
            scheduler.advance_time(dt);
        }
        self.drain_ripe();
    }

    /// Advance in event-sized jumps up to `current_time + duration`.
    /// Equivalent to `step(duration)` for this synchronous kernel — see
    /// `EventScheduler::run`'s doc comment.
    pub fn run(&self, duration: TimeNs) {
        self.step(duration);
    }

    pub fn now(&self) -> TimeNs {
        self.0.scheduler.borrow().now()
    }

    /// Drain every ripe scheduled task one at a time, releasing the
    /// scheduler's borrow before running each one so a task that
    /// schedules further work (almost every net-update listener does)
    /// doesn't conflict with the borrow used to pop it.
    fn drain_ripe(&self) {
        loop {
            let next = self.0.scheduler.borrow_mut().pop_ripe();
            match next {
                Some(mut task) => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| task()));
                    if let Err(payload) = result {
                        let message = crate::scheduler::panic_message(&payload);
                        tracing::error!("scheduled task panicked: {message}");
                    }
                }
                None => break,
            }
        }
    }

    fn fire_net_update(&self, net: NetId) {
        let transition = {
            let mut state = self.0.state.borrow_mut();
            state.nets.get_mut(&net).and_then(Net::begin_update)
        };
        if let Some((new_state, listeners)) = transition {
            for listener in listeners {
                listener(new_state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn fresh_net_is_float_and_unpowered_rail_floats() {
        let engine = CircuitEngine::default();
        let n = engine.create_net();
        assert_eq!(engine.state_of(n).unwrap(), LogicState::Float);

        let (vcc, gnd) = engine.rails();
        engine.step(1);
        assert_eq!(engine.state_of(vcc).unwrap(), LogicState::Float);
        assert_eq!(engine.state_of(gnd).unwrap(), LogicState::Float);
    }

    #[test]
    fn power_on_drives_rails() {
        let engine = CircuitEngine::default();
        let (vcc, gnd) = engine.rails();
        engine.set_power(true);
        engine.step(1);
        assert_eq!(engine.state_of(vcc).unwrap(), LogicState::High);
        assert_eq!(engine.state_of(gnd).unwrap(), LogicState::Low);

        engine.set_power(false);
        engine.step(1);
        assert_eq!(engine.state_of(vcc).unwrap(), LogicState::Float);
        assert_eq!(engine.state_of(gnd).unwrap(), LogicState::Float);
    }

    #[test]
    fn add_listener_fires_immediately_with_current_state() {
        let engine = CircuitEngine::default();
        let net = engine.create_net();
        engine.add_driver(net, Driver::ConstantHigh).unwrap();
        engine.step(1);

        let seen = Rc::new(StdRefCell::new(Vec::new()));
        let seen2 = seen.clone();
        engine.add_listener(net, Rc::new(move |s| seen2.borrow_mut().push(s))).unwrap();
        assert_eq!(*seen.borrow(), vec![LogicState::High]);
    }

    #[test]
    fn merge_nets_unions_drivers_and_can_produce_contention() {
        let engine = CircuitEngine::default();
        let a = engine.create_net();
        let b = engine.create_net();
        engine.add_driver(a, Driver::ConstantHigh).unwrap();
        engine.add_driver(b, Driver::ConstantLow).unwrap();
        let survivor = engine.merge_nets(a, b).unwrap();
        assert_eq!(survivor, a);
        engine.step(1);
        assert_eq!(engine.state_of(a).unwrap(), LogicState::Error);
        assert!(!engine.net_exists(b));
    }

    #[test]
    fn listener_can_reentrantly_schedule_more_work() {
        // A listener that schedules a further update must not panic on a
        // double RefCell borrow.
        let engine = CircuitEngine::default();
        let driven = engine.create_net();
        let observer = engine.create_net();
        engine.add_driver(observer, Driver::ConstantLow).unwrap();

        let e2 = engine.clone();
        engine
            .add_listener(driven, Rc::new(move |_| {
                e2.schedule_node_update(observer, 5);
            }))
            .unwrap();
        engine.add_driver(driven, Driver::ConstantHigh).unwrap();
        engine.step(10);
        assert_eq!(engine.state_of(observer).unwrap(), LogicState::Low);
    }

    #[test]
    fn destroy_net_removes_it_from_the_arena() {
        let engine = CircuitEngine::default();
        let net = engine.create_net();
        assert!(engine.net_exists(net));
        engine.destroy_net(net).unwrap();
        assert!(!engine.net_exists(net));
        assert!(matches!(engine.state_of(net), Err(TrainerError::UnknownNet(_))));
        assert!(matches!(engine.destroy_net(net), Err(TrainerError::UnknownNet(_))));
    }

    #[test]
    fn unknown_net_is_an_error_not_a_panic() {
        let engine = CircuitEngine::default();
        let bogus = NetId(9999);
        assert!(matches!(engine.state_of(bogus), Err(TrainerError::UnknownNet(_))));
        assert!(matches!(engine.add_driver(bogus, Driver::ConstantHigh), Err(TrainerError::UnknownNet(_))));
    }
}
