/*!
Chip framework: the common pin-typing, TTL input coercion, and output
propagation machinery every catalogue part builds on.

Grounded on the teacher's `Mapper` trait (src/mapper.rs): a small trait
with an identifying accessor (`mapper_id` there, `part_number` here), a
handful of required behavior methods, and a couple of default no-op
methods (`reset`, `irq_pending`) that most but not all implementations
override. `ChipKind` plays the same role for the sixteen catalogue parts
in `chip::catalogue`.

Where `Mapper` is driven directly by `Bus` (no per-mapper event hookup —
the Bus just calls `cpu_read`/`cpu_write` on demand), a `ChipKind` is
event-driven: something external (the `Board` assembler) wires each of its
pins to a net and subscribes `trigger_evaluation` to the net(s) that
matter, because TTL parts are push, not pull — an input changing must
*cause* an output recompute, not wait to be asked.
*/

pub mod catalogue;
pub mod placed;

use std::fmt;

use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

pub use placed::PlacedChip;

/// Stable identifier for one placed chip instance, e.g. `"u3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChipId(pub String);

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChipId {
    fn from(s: &str) -> Self {
        ChipId(s.to_string())
    }
}

/// Electrical role of one pin on a chip package, independent of the
/// wiring graph's own `PinType` (this is the chip's *declared* role;
/// `wiring::PinType` is what gets registered for a given physical pin id
/// once the chip is placed — the two line up 1:1 via `catalogue::install`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Input,
    Output,
    Clock,
    Vcc,
    Gnd,
    Nc,
}

/// One entry in a chip's fixed pinout.
#[derive(Debug, Clone, Copy)]
pub struct PinSpec {
    pub index: u8,
    pub role: PinRole,
}

pub const fn pin(index: u8, role: PinRole) -> PinSpec {
    PinSpec { index, role }
}

/// TTL inputs read HIGH when left floating (spec §4.5's defining quirk of
/// the logic family being modeled). Outputs, power pins, and clocks are
/// read as-is; an unbound pin is wired to nothing and reads FLOAT->HIGH
/// the same as any other floating input.
pub fn read_input(engine: &CircuitEngine, net: NetId) -> LogicState {
    match engine.state_of(net) {
        Ok(LogicState::Float) => LogicState::High,
        Ok(other) => other,
        Err(_) => LogicState::High,
    }
}

/// Read a pin without the floating-high coercion — used for power pins,
/// which must see a genuine FLOAT (unpowered) rather than a coerced HIGH.
pub fn read_raw(engine: &CircuitEngine, net: NetId) -> LogicState {
    engine.state_of(net).unwrap_or(LogicState::Float)
}

pub fn is_rising_edge(prev: LogicState, now: LogicState) -> bool {
    prev != LogicState::High && now == LogicState::High
}

pub fn is_falling_edge(prev: LogicState, now: LogicState) -> bool {
    prev == LogicState::High && now != LogicState::High
}

/// A placed, evaluable TTL part. Every catalogue chip (`chip::catalogue`)
/// implements this. Pin indices are 1-based DIP package numbers, matching
/// the part's datasheet, so `pin_spec` reads the same as the silkscreen.
pub trait ChipKind {
    fn part_number(&self) -> &'static str;
    fn pin_spec(&self) -> &'static [PinSpec];
    fn propagation_delay_ns(&self) -> TimeNs {
        10
    }

    /// Bind a package pin to a net. Called once per pin during placement.
    fn set_pin_node(&mut self, pin_index: u8, net: NetId);
    fn pin_node(&self, pin_index: u8) -> Option<NetId>;

    /// Power validation (spec §4.5): true iff the declared VCC pin's net is
    /// HIGH and the declared GND pin's net is LOW. A pin not yet bound, or
    /// any other combination (either rail FLOAT, or swapped), is unpowered.
    /// VCC/GND pin indices come straight out of `pin_spec` — a part with a
    /// non-default rail pinout (LS76/90/93) just declares different
    /// `PinRole::Vcc`/`PinRole::Gnd` entries and gets the right answer here
    /// for free.
    fn is_powered(&self, engine: &CircuitEngine) -> bool {
        let vcc = self
            .pin_spec()
            .iter()
            .find(|p| p.role == PinRole::Vcc)
            .and_then(|p| self.pin_node(p.index));
        let gnd = self
            .pin_spec()
            .iter()
            .find(|p| p.role == PinRole::Gnd)
            .and_then(|p| self.pin_node(p.index));
        match (vcc, gnd) {
            (Some(v), Some(g)) => read_raw(engine, v) == LogicState::High && read_raw(engine, g) == LogicState::Low,
            _ => false,
        }
    }

    /// Current value of the chip's internal output register for an
    /// OUTPUT-role pin. The driver installed on that pin's net reads this
    /// directly; it is never itself the thing that re-resolves the net —
    /// `trigger_evaluation` does that by calling `CircuitEngine::schedule_node_update`
    /// after writing the register.
    fn output_state(&self, pin_index: u8) -> LogicState;

    /// Re-read every input/clock/power pin, recompute outputs into the
    /// output register, and schedule the engine to re-resolve each output
    /// pin's net after this part's propagation delay. Called whenever any
    /// bound input, clock, or power pin's net transitions, and once up
    /// front during placement.
    fn trigger_evaluation(&mut self, engine: &CircuitEngine);

    /// Reset internal state (registers, counters) to the part's
    /// documented power-on default, then re-evaluate.
    fn reset(&mut self, engine: &CircuitEngine);
}
