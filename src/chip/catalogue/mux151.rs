//! 74LS151: 8-to-1 data selector/multiplexer with complementary outputs.

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_D0: u8 = 4;
const PIN_D1: u8 = 3;
const PIN_D2: u8 = 2;
const PIN_D3: u8 = 1;
const PIN_D4: u8 = 15;
const PIN_D5: u8 = 14;
const PIN_D6: u8 = 13;
const PIN_D7: u8 = 12;
const DATA_PINS: [u8; 8] = [PIN_D0, PIN_D1, PIN_D2, PIN_D3, PIN_D4, PIN_D5, PIN_D6, PIN_D7];
const PIN_Y: u8 = 5;
const PIN_W: u8 = 6;
const PIN_STROBE: u8 = 7;
const PIN_S0: u8 = 11; // A
const PIN_S1: u8 = 10; // B
const PIN_S2: u8 = 9; // C

pub struct Mux151 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    delay_ns: TimeNs,
}

impl Mux151 {
    pub fn new() -> Self {
        Mux151 {
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

    fn set_both(&mut self, engine: &CircuitEngine, y: LogicState) {
        let w = invert(y);
        self.set_output(engine, PIN_Y, y);
        self.set_output(engine, PIN_W, w);
    }
}

fn invert(s: LogicState) -> LogicState {
    match s {
        LogicState::High => LogicState::Low,
        LogicState::Low => LogicState::High,
        other => other,
    }
}

impl Default for Mux151 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Mux151 {
    fn part_number(&self) -> &'static str {
        "74LS151"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Input), pin(3, Input), pin(4, Input),
            pin(5, Output), pin(6, Output), pin(7, Input),
            pin(8, Gnd),
            pin(9, Input), pin(10, Input), pin(11, Input),
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
            self.set_output(engine, PIN_Y, LogicState::Float);
            self.set_output(engine, PIN_W, LogicState::Float);
            return;
        }
        let strobe = self.read(engine, PIN_STROBE);
        if strobe == LogicState::Error {
            self.set_both(engine, LogicState::Error);
            return;
        }
        if strobe == LogicState::High {
            self.set_both(engine, LogicState::Low);
            return;
        }
        let s0 = self.read(engine, PIN_S0);
        let s1 = self.read(engine, PIN_S1);
        let s2 = self.read(engine, PIN_S2);
        if [s0, s1, s2].contains(&LogicState::Error) {
            self.set_both(engine, LogicState::Error);
            return;
        }
        let select = (s0 == LogicState::High) as usize
            | ((s1 == LogicState::High) as usize) << 1
            | ((s2 == LogicState::High) as usize) << 2;
        let value = self.read(engine, DATA_PINS[select]);
        self.set_both(engine, value);
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 17];
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> (CircuitEngine, Mux151, Vec<NetId>, NetId, [NetId; 3]) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Mux151::new();
        chip.set_pin_node(16, vcc);
        chip.set_pin_node(8, gnd);
        let mut data = Vec::with_capacity(8);
        for &p in &DATA_PINS {
            let n = engine.create_net();
            chip.set_pin_node(p, n);
            data.push(n);
        }
        let y = engine.create_net();
        let w = engine.create_net();
        chip.set_pin_node(PIN_Y, y);
        chip.set_pin_node(PIN_W, w);
        let strobe = engine.create_net();
        chip.set_pin_node(PIN_STROBE, strobe);
        let s = [engine.create_net(), engine.create_net(), engine.create_net()];
        chip.set_pin_node(PIN_S0, s[0]);
        chip.set_pin_node(PIN_S1, s[1]);
        chip.set_pin_node(PIN_S2, s[2]);
        (engine, chip, data, strobe, s)
    }

    #[test]
    fn selects_channel_zero_by_default() {
        let (engine, mut chip, data, strobe, s) = place();
        engine.add_driver(strobe, crate::net::Driver::ConstantLow).unwrap();
        for &n in &s {
            engine.add_driver(n, crate::net::Driver::ConstantLow).unwrap();
        }
        engine.add_driver(data[0], crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(PIN_Y), LogicState::High);
        assert_eq!(chip.output_state(PIN_W), LogicState::Low);
    }

    #[test]
    fn strobe_high_forces_y_low_w_high() {
        let (engine, mut chip, data, strobe, s) = place();
        engine.add_driver(strobe, crate::net::Driver::ConstantHigh).unwrap();
        for &n in &s {
            engine.add_driver(n, crate::net::Driver::ConstantLow).unwrap();
        }
        engine.add_driver(data[0], crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(PIN_Y), LogicState::Low);
        assert_eq!(chip.output_state(PIN_W), LogicState::High);
    }
}
