//! 74LS153: dual 4-to-1 data selector/multiplexer. Both halves share the
//! same two select lines; each half has its own active-low enable.

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_G1: u8 = 1; // enable, section 1, active low
const PIN_G2: u8 = 15; // enable, section 2, active low
const PIN_S1: u8 = 2; // B, shared select
const PIN_S0: u8 = 14; // A, shared select

/// (C0, C1, C2, C3, Y) for each half.
const HALVES: [[u8; 5]; 2] = [[3, 4, 5, 6, 7], [13, 12, 11, 10, 9]];

pub struct Mux153 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    delay_ns: TimeNs,
}

impl Mux153 {
    pub fn new() -> Self {
        Mux153 {
            pins: [None; 17],
            outputs: [LogicState::Float; 17],
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

    fn evaluate_half(&mut self, engine: &CircuitEngine, enable_pin: u8, half: [u8; 5], select: Option<usize>) {
        let [c0, c1, c2, c3, y] = half;
        let enable = self.read(engine, enable_pin);
        if enable == LogicState::Error {
            self.set_output(engine, y, LogicState::Error);
            return;
        }
        if enable == LogicState::High {
            self.set_output(engine, y, LogicState::Low);
            return;
        }
        let select = match select {
            Some(s) => s,
            None => {
                self.set_output(engine, y, LogicState::Error);
                return;
            }
        };
        let channels = [c0, c1, c2, c3];
        let value = self.read(engine, channels[select]);
        self.set_output(engine, y, value);
    }
}

impl Default for Mux153 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Mux153 {
    fn part_number(&self) -> &'static str {
        "74LS153"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Input), pin(3, Input), pin(4, Input),
            pin(5, Input), pin(6, Input), pin(7, Output),
            pin(8, Gnd),
            pin(9, Output), pin(10, Input), pin(11, Input),
            pin(12, Input), pin(13, Input), pin(14, Input), pin(15, Input),
            pin(16, Vcc),
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
            for half in HALVES {
                self.set_output(engine, half[4], LogicState::Float);
            }
            return;
        }
        let s0 = self.read(engine, PIN_S0);
        let s1 = self.read(engine, PIN_S1);
        let select = if [s0, s1].contains(&LogicState::Error) {
            None
        } else {
            Some((s0 == LogicState::High) as usize | ((s1 == LogicState::High) as usize) << 1)
        };
        self.evaluate_half(engine, PIN_G1, HALVES[0], select);
        self.evaluate_half(engine, PIN_G2, HALVES[1], select);
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 17];
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> (CircuitEngine, Mux153, [NetId; 4], [NetId; 4], NetId, NetId, [NetId; 2]) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Mux153::new();
        chip.set_pin_node(16, vcc);
        chip.set_pin_node(8, gnd);
        let c1 = [engine.create_net(), engine.create_net(), engine.create_net(), engine.create_net()];
        for (i, &p) in [3u8, 4, 5, 6].iter().enumerate() {
            chip.set_pin_node(p, c1[i]);
        }
        let c2 = [engine.create_net(), engine.create_net(), engine.create_net(), engine.create_net()];
        for (i, &p) in [13u8, 12, 11, 10].iter().enumerate() {
            chip.set_pin_node(p, c2[i]);
        }
        let y1 = engine.create_net();
        let y2 = engine.create_net();
        chip.set_pin_node(7, y1);
        chip.set_pin_node(9, y2);
        let s = [engine.create_net(), engine.create_net()];
        chip.set_pin_node(PIN_S0, s[0]);
        chip.set_pin_node(PIN_S1, s[1]);
        let g = [engine.create_net(), engine.create_net()];
        chip.set_pin_node(PIN_G1, g[0]);
        chip.set_pin_node(PIN_G2, g[1]);
        for &n in &g {
            engine.add_driver(n, crate::net::Driver::ConstantLow).unwrap();
        }
        for &n in &s {
            engine.add_driver(n, crate::net::Driver::ConstantLow).unwrap();
        }
        (engine, chip, c1, c2, y1, y2, g)
    }

    #[test]
    fn both_halves_select_channel_zero() {
        let (engine, mut chip, c1, c2, _y1, _y2, _g) = place();
        engine.add_driver(c1[0], crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(c2[0], crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(7), LogicState::High);
        assert_eq!(chip.output_state(9), LogicState::Low);
    }

    #[test]
    fn disabled_half_drives_low_other_half_unaffected() {
        let (engine, mut chip, c1, _c2, _y1, _y2, g) = place();
        engine.add_driver(g[0], crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(c1[0], crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(7), LogicState::Low);
        assert_eq!(chip.output_state(9), LogicState::Low);
    }
}
