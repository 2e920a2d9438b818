/*!
External signal sources: concrete, independently testable collaborators
that sit at the edges of a simulated circuit — a human's finger on a
switch, a crystal's clock, a momentary pushbutton, an LED.

Spec §4.7 specifies these by contract only; a complete reference crate
ships working instances the way the teacher ships `Controller`
(src/controller.rs) as a concrete input-device type alongside the
CPU/PPU/Bus core rather than leaving "controller" as a trait for callers
to implement themselves. These four types play that role here: each owns
the net id(s) it drives or observes and exposes the narrow
constructor/mutator surface spec §4.7 lists, nothing more.
*/

use std::cell::Cell;
use std::rc::Rc;

use crate::chip::read_raw;
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::{Driver, NetId};

/// Re-resolve `net` whenever system power toggles — every external
/// collaborator's driver closure reads `engine.is_power_on()` directly,
/// but nothing re-triggers that read on its own; a listener on the VCC
/// rail is what actually wakes the net up, the same role `PlacedChip`'s
/// power-pin listener plays for catalogue chips (`chip/placed.rs`).
fn subscribe_to_power(engine: &CircuitEngine, net: NetId) {
    let (vcc, _gnd) = engine.rails();
    let engine_for_listener = engine.clone();
    let _ = engine.add_listener(vcc, Rc::new(move |_| engine_for_listener.schedule_node_update(net, 0)));
}

/// A toggle switch: owns a net and a boolean position. Its driver reads
/// HIGH/LOW from the boolean when system power is on, else FLOAT — a
/// switch with no power behind it can't impose a level on anything.
pub struct Switch {
    net: NetId,
    engine: CircuitEngine,
    on: Rc<Cell<bool>>,
}

impl Switch {
    /// Create a switch driving `net`, initially in position `on`.
    pub fn new(engine: &CircuitEngine, net: NetId, on: bool) -> Switch {
        let on = Rc::new(Cell::new(on));
        let on_for_driver = on.clone();
        let engine_for_driver = engine.clone();
        let _ = engine.add_driver(
            net,
            Driver::closure(move || {
                if engine_for_driver.is_power_on() {
                    if on_for_driver.get() {
                        LogicState::High
                    } else {
                        LogicState::Low
                    }
                } else {
                    LogicState::Float
                }
            }),
        );
        subscribe_to_power(engine, net);
        Switch { net, engine: engine.clone(), on }
    }

    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn is_on(&self) -> bool {
        self.on.get()
    }

    /// Flip the switch and re-resolve its net immediately.
    pub fn set(&self, on: bool) {
        if self.on.get() == on {
            return;
        }
        self.on.set(on);
        self.engine.schedule_node_update(self.net, 0);
    }

    pub fn toggle(&self) {
        self.set(!self.is_on());
    }
}

/// A periodic clock: self-reschedules through the engine's scheduler
/// rather than owning a wall-clock timer (spec §4.7 — "there is no
/// wall-clock timer inside the kernel"). `half_period_ns` toggles the
/// output every half period, yielding a 50% duty cycle square wave at
/// `frequency_hz = 1 / (2 * half_period_ns)` once converted to seconds.
pub struct ClockGenerator {
    net: NetId,
    running: Rc<Cell<bool>>,
}

impl ClockGenerator {
    /// Start a clock driving `net` with the given half-period, in
    /// nanoseconds. The first edge fires `half_period_ns` after this call
    /// (not immediately).
    pub fn start(engine: &CircuitEngine, net: NetId, half_period_ns: u64) -> ClockGenerator {
        let phase = Rc::new(Cell::new(false));
        let running = Rc::new(Cell::new(true));
        let phase_for_driver = phase.clone();
        let engine_for_driver = engine.clone();
        let _ = engine.add_driver(
            net,
            Driver::closure(move || {
                if engine_for_driver.is_power_on() {
                    if phase_for_driver.get() {
                        LogicState::High
                    } else {
                        LogicState::Low
                    }
                } else {
                    LogicState::Float
                }
            }),
        );

        subscribe_to_power(engine, net);

        let running_for_tick = running.clone();
        schedule_tick(engine.clone(), net, half_period_ns, phase, running_for_tick);

        ClockGenerator { net, running }
    }

    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Stop rescheduling. The net holds its last driven level (subject to
    /// power) until started again via a fresh `ClockGenerator`.
    pub fn stop(&self) {
        self.running.set(false);
    }
}

fn schedule_tick(engine: CircuitEngine, net: NetId, half_period_ns: u64, phase: Rc<Cell<bool>>, running: Rc<Cell<bool>>) {
    let engine_for_task = engine.clone();
    engine.schedule(half_period_ns, move || {
        if !running.get() {
            return;
        }
        phase.set(!phase.get());
        engine_for_task.schedule_node_update(net, 0);
        schedule_tick(engine_for_task.clone(), net, half_period_ns, phase.clone(), running.clone());
    });
}

/// A momentary pushbutton: pressing it drives the net HIGH for a fixed
/// window, then it reverts to LOW. A press during the active window does
/// not retrigger or extend it (spec §4.7 — "no retrigger during the
/// active window").
pub struct PulseButton {
    net: NetId,
    engine: CircuitEngine,
    active: Rc<Cell<bool>>,
    window_ns: u64,
}

impl PulseButton {
    pub fn new(engine: &CircuitEngine, net: NetId, window_ns: u64) -> PulseButton {
        let active = Rc::new(Cell::new(false));
        let active_for_driver = active.clone();
        let engine_for_driver = engine.clone();
        let _ = engine.add_driver(
            net,
            Driver::closure(move || {
                if !engine_for_driver.is_power_on() {
                    return LogicState::Float;
                }
                if active_for_driver.get() {
                    LogicState::High
                } else {
                    LogicState::Low
                }
            }),
        );
        subscribe_to_power(engine, net);
        PulseButton { net, engine: engine.clone(), active, window_ns }
    }

    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Press the button. A press while already active is a no-op.
    pub fn press(&self) {
        if self.active.get() {
            return;
        }
        self.active.set(true);
        self.engine.schedule_node_update(self.net, 0);

        let active = self.active.clone();
        let engine = self.engine.clone();
        let net = self.net;
        self.engine.schedule(self.window_ns, move || {
            active.set(false);
            engine.schedule_node_update(net, 0);
        });
    }
}

/// Observed level of an LED sink, collapsing FLOAT and LOW into the same
/// visible "off" state while keeping ERROR distinguishable as a fault
/// indicator (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    On,
    Off,
    Fault,
}

fn classify(state: LogicState) -> LedState {
    match state {
        LogicState::High => LedState::On,
        LogicState::Low | LogicState::Float => LedState::Off,
        LogicState::Error => LedState::Fault,
    }
}

/// An LED: a listener on a net that reflects its resolved state as
/// ON/OFF/fault. Holds its own current reading so a caller can poll
/// `state()` without needing to intercept every transition itself.
pub struct LedSink {
    net: NetId,
    state: Rc<Cell<LedState>>,
}

impl LedSink {
    pub fn new(engine: &CircuitEngine, net: NetId) -> LedSink {
        let state = Rc::new(Cell::new(classify(read_raw(engine, net))));
        let state_for_listener = state.clone();
        let _ = engine.add_listener(
            net,
            Rc::new(move |level| {
                state_for_listener.set(classify(level));
            }),
        );
        LedSink { net, state }
    }

    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn state(&self) -> LedState {
        self.state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_floats_unpowered_and_follows_position_when_powered() {
        let engine = CircuitEngine::default();
        let net = engine.create_net();
        let switch = Switch::new(&engine, net, true);
        engine.step(1);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::Float);

        engine.set_power(true);
        engine.step(1);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::High);

        switch.set(false);
        engine.step(1);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::Low);
    }

    #[test]
    fn clock_generator_toggles_every_half_period() {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let net = engine.create_net();
        let clock = ClockGenerator::start(&engine, net, 100);
        engine.step(1);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::Low);

        engine.step(100);
        let after_one = engine.state_of(net).unwrap();
        engine.step(100);
        let after_two = engine.state_of(net).unwrap();
        assert_ne!(after_one, after_two);
        clock.stop();
    }

    #[test]
    fn clock_generator_stop_halts_further_edges() {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let net = engine.create_net();
        let clock = ClockGenerator::start(&engine, net, 100);
        engine.step(100);
        clock.stop();
        let before = engine.state_of(net).unwrap();
        engine.step(10_000);
        assert_eq!(engine.state_of(net).unwrap(), before);
    }

    #[test]
    fn pulse_button_returns_low_after_window_and_does_not_retrigger() {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let net = engine.create_net();
        let button = PulseButton::new(&engine, net, 100);
        button.press();
        engine.step(1);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::High);

        button.press(); // no-op while active
        engine.step(50);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::High);

        engine.step(60);
        assert_eq!(engine.state_of(net).unwrap(), LogicState::Low);
    }

    #[test]
    fn led_sink_classifies_contention_as_fault() {
        let engine = CircuitEngine::default();
        let net = engine.create_net();
        let led = LedSink::new(&engine, net);
        assert_eq!(led.state(), LedState::Off);

        engine.add_driver(net, Driver::ConstantHigh).unwrap();
        engine.add_driver(net, Driver::ConstantLow).unwrap();
        engine.step(1);
        assert_eq!(led.state(), LedState::Fault);
    }
}
