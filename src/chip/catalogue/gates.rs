//! Quad 2-input gates (00/02/08/32/86) and the hex inverter (04). All six
//! parts share one package shape — 14 pins, four independent 2-input
//! gates plus VCC/GND, or six inverters plus VCC/GND — so one generic
//! struct per shape covers all of them; only the truth function and (for
//! 02 vs. the rest) the pin layout differ.

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

fn truth(kind: GateFn, a: LogicState, b: LogicState) -> LogicState {
    if a == LogicState::Error || b == LogicState::Error {
        return LogicState::Error;
    }
    let hi = |x: LogicState| x == LogicState::High;
    let out = match kind {
        GateFn::And => hi(a) && hi(b),
        GateFn::Or => hi(a) || hi(b),
        GateFn::Nand => !(hi(a) && hi(b)),
        GateFn::Nor => !(hi(a) || hi(b)),
        GateFn::Xor => hi(a) != hi(b),
    };
    if out {
        LogicState::High
    } else {
        LogicState::Low
    }
}

#[derive(Clone, Copy)]
enum GateFn {
    And,
    Or,
    Nand,
    Nor,
    Xor,
}

/// (A pin, B pin, Y pin) for each of the four gates in a package.
const STANDARD_LAYOUT: [(u8, u8, u8); 4] = [(1, 2, 3), (4, 5, 6), (9, 10, 8), (12, 13, 11)];
const NOR_LAYOUT: [(u8, u8, u8); 4] = [(2, 3, 1), (5, 6, 4), (8, 9, 10), (11, 12, 13)];

fn standard_pin_spec() -> &'static [PinSpec] {
    use PinRole::*;
    &[
        pin(1, Input), pin(2, Input), pin(3, Output),
        pin(4, Input), pin(5, Input), pin(6, Output),
        pin(7, Gnd),
        pin(8, Output), pin(9, Input), pin(10, Input),
        pin(11, Output), pin(12, Input), pin(13, Input),
        pin(14, Vcc),
    ]
}

fn nor_pin_spec() -> &'static [PinSpec] {
    use PinRole::*;
    &[
        pin(1, Output), pin(2, Input), pin(3, Input),
        pin(4, Output), pin(5, Input), pin(6, Input),
        pin(7, Gnd),
        pin(8, Input), pin(9, Input), pin(10, Output),
        pin(11, Input), pin(12, Input), pin(13, Output),
        pin(14, Vcc),
    ]
}

pub struct QuadGate2 {
    part_number: &'static str,
    func: GateFn,
    layout: &'static [(u8, u8, u8); 4],
    pin_spec: &'static [PinSpec],
    pins: [Option<NetId>; 15],
    outputs: [LogicState; 15],
    delay_ns: TimeNs,
}

impl QuadGate2 {
    fn new(part_number: &'static str, func: GateFn, layout: &'static [(u8, u8, u8); 4], pin_spec: &'static [PinSpec]) -> Self {
        QuadGate2 {
            part_number,
            func,
            layout,
            pin_spec,
            pins: [None; 15],
            outputs: [LogicState::Float; 15],
            delay_ns: 10,
        }
    }

    pub fn nand00() -> Self {
        Self::new("74LS00", GateFn::Nand, &STANDARD_LAYOUT, standard_pin_spec())
    }
    pub fn nor02() -> Self {
        Self::new("74LS02", GateFn::Nor, &NOR_LAYOUT, nor_pin_spec())
    }
    pub fn and08() -> Self {
        Self::new("74LS08", GateFn::And, &STANDARD_LAYOUT, standard_pin_spec())
    }
    pub fn or32() -> Self {
        Self::new("74LS32", GateFn::Or, &STANDARD_LAYOUT, standard_pin_spec())
    }
    pub fn xor86() -> Self {
        Self::new("74LS86", GateFn::Xor, &STANDARD_LAYOUT, standard_pin_spec())
    }

    fn read(&self, engine: &CircuitEngine, pin_index: u8) -> LogicState {
        match self.pins[pin_index as usize] {
            Some(net) => crate::chip::read_input(engine, net),
            None => LogicState::High,
        }
    }

    fn set_output(&mut self, engine: &CircuitEngine, pin_index: u8, value: LogicState) {
        if self.outputs[pin_index as usize] != value {
            self.outputs[pin_index as usize] = value;
            if let Some(net) = self.pins[pin_index as usize] {
                engine.schedule_node_update(net, self.delay_ns);
            }
        }
    }
}

impl ChipKind for QuadGate2 {
    fn part_number(&self) -> &'static str {
        self.part_number
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        self.pin_spec
    }
    fn propagation_delay_ns(&self) -> TimeNs {
        self.delay_ns
    }
    fn set_pin_node(&mut self, pin_index: u8, net: NetId) {
        self.pins[pin_index as usize] = Some(net);
    }
    fn pin_node(&self, pin_index: u8) -> Option<NetId> {
        self.pins[pin_index as usize]
    }
    fn output_state(&self, pin_index: u8) -> LogicState {
        self.outputs[pin_index as usize]
    }
    fn trigger_evaluation(&mut self, engine: &CircuitEngine) {
        if !self.is_powered(engine) {
            for &(_, _, y) in self.layout {
                self.set_output(engine, y, LogicState::Float);
            }
            return;
        }
        for &(a, b, y) in self.layout {
            let value = truth(self.func, self.read(engine, a), self.read(engine, b));
            self.set_output(engine, y, value);
        }
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 15];
        self.trigger_evaluation(engine);
    }
}

pub struct HexInverter04 {
    pins: [Option<NetId>; 15],
    outputs: [LogicState; 15],
    delay_ns: TimeNs,
}

const INVERTER_LAYOUT: [(u8, u8); 6] = [(1, 2), (3, 4), (5, 6), (9, 8), (11, 10), (13, 12)];

impl HexInverter04 {
    pub fn new() -> Self {
        HexInverter04 {
            pins: [None; 15],
            outputs: [LogicState::Float; 15],
            delay_ns: 10,
        }
    }

    fn read(&self, engine: &CircuitEngine, pin_index: u8) -> LogicState {
        match self.pins[pin_index as usize] {
            Some(net) => crate::chip::read_input(engine, net),
            None => LogicState::High,
        }
    }

    fn set_output(&mut self, engine: &CircuitEngine, pin_index: u8, value: LogicState) {
        if self.outputs[pin_index as usize] != value {
            self.outputs[pin_index as usize] = value;
            if let Some(net) = self.pins[pin_index as usize] {
                engine.schedule_node_update(net, self.delay_ns);
            }
        }
    }
}

impl Default for HexInverter04 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for HexInverter04 {
    fn part_number(&self) -> &'static str {
        "74LS04"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Output),
            pin(3, Input), pin(4, Output),
            pin(5, Input), pin(6, Output),
            pin(7, Gnd),
            pin(8, Output), pin(9, Input),
            pin(10, Output), pin(11, Input),
            pin(12, Output), pin(13, Input),
            pin(14, Vcc),
        ]
    }
    fn propagation_delay_ns(&self) -> TimeNs {
        self.delay_ns
    }
    fn set_pin_node(&mut self, pin_index: u8, net: NetId) {
        self.pins[pin_index as usize] = Some(net);
    }
    fn pin_node(&self, pin_index: u8) -> Option<NetId> {
        self.pins[pin_index as usize]
    }
    fn output_state(&self, pin_index: u8) -> LogicState {
        self.outputs[pin_index as usize]
    }
    fn trigger_evaluation(&mut self, engine: &CircuitEngine) {
        if !self.is_powered(engine) {
            for &(_, y) in &INVERTER_LAYOUT {
                self.set_output(engine, y, LogicState::Float);
            }
            return;
        }
        for &(a, y) in &INVERTER_LAYOUT {
            let input = self.read(engine, a);
            let value = if input == LogicState::Error {
                LogicState::Error
            } else if input == LogicState::High {
                LogicState::Low
            } else {
                LogicState::High
            };
            self.set_output(engine, y, value);
        }
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 15];
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_engine() -> CircuitEngine {
        let engine = CircuitEngine::default();
        engine.rails();
        engine.set_power(true);
        engine
    }

    fn wire_two_inputs(chip: &mut dyn ChipKind, engine: &CircuitEngine, a_pin: u8, b_pin: u8, y_pin: u8) -> (NetId, NetId, NetId) {
        let a = engine.create_net();
        let b = engine.create_net();
        let y = engine.create_net();
        chip.set_pin_node(a_pin, a);
        chip.set_pin_node(b_pin, b);
        chip.set_pin_node(y_pin, y);
        let (vcc, gnd) = engine.rails();
        chip.set_pin_node(14, vcc);
        chip.set_pin_node(7, gnd);
        (a, b, y)
    }

    #[test]
    fn nand_floating_inputs_read_high_so_output_is_low() {
        let engine = powered_engine();
        let mut chip = QuadGate2::nand00();
        let (_a, _b, _y) = wire_two_inputs(&mut chip, &engine, 1, 2, 3);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(3), LogicState::Low);
    }

    #[test]
    fn nand_with_one_low_input_drives_high() {
        let engine = powered_engine();
        let mut chip = QuadGate2::nand00();
        let (a, b, _y) = wire_two_inputs(&mut chip, &engine, 1, 2, 3);
        engine.add_driver(a, crate::net::Driver::ConstantLow).unwrap();
        engine.add_driver(b, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(3), LogicState::High);
    }

    #[test]
    fn inverter_flips_level() {
        let engine = powered_engine();
        let mut chip = HexInverter04::new();
        let a = engine.create_net();
        let y = engine.create_net();
        chip.set_pin_node(1, a);
        chip.set_pin_node(2, y);
        let (vcc, gnd) = engine.rails();
        chip.set_pin_node(14, vcc);
        chip.set_pin_node(7, gnd);
        engine.add_driver(a, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(2), LogicState::Low);
    }

    #[test]
    fn contention_on_an_input_propagates_as_error() {
        let engine = powered_engine();
        let mut chip = QuadGate2::and08();
        let (a, b, _y) = wire_two_inputs(&mut chip, &engine, 1, 2, 3);
        engine.add_driver(a, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(a, crate::net::Driver::ConstantLow).unwrap();
        engine.add_driver(b, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(3), LogicState::Error);
    }

    #[test]
    fn unpowered_chip_floats_all_outputs() {
        let engine = CircuitEngine::default();
        let mut chip = QuadGate2::nand00();
        let (_a, _b, _y) = wire_two_inputs(&mut chip, &engine, 1, 2, 3);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(3), LogicState::Float);
    }
}
