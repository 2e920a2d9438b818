//! 74LS157: quad 2-to-1 data selector/multiplexer with a shared select
//! line and a single active-low strobe (enable).

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_SELECT: u8 = 1;
const PIN_STROBE: u8 = 15;

/// (A, B, Y) per channel.
const CHANNELS: [[u8; 3]; 4] = [[2, 3, 4], [5, 6, 7], [11, 10, 9], [14, 13, 12]];

pub struct Mux157 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    delay_ns: TimeNs,
}

impl Mux157 {
    pub fn new() -> Self {
        Mux157 {
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
}

impl Default for Mux157 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Mux157 {
    fn part_number(&self) -> &'static str {
        "74LS157"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Input), pin(3, Input), pin(4, Output),
            pin(5, Input), pin(6, Input), pin(7, Output),
            pin(8, Gnd),
            pin(9, Output), pin(10, Input), pin(11, Input),
            pin(12, Output), pin(13, Input), pin(14, Input), pin(15, Input),
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
            for ch in CHANNELS {
                self.set_output(engine, ch[2], LogicState::Float);
            }
            return;
        }
        let strobe = self.read(engine, PIN_STROBE);
        if strobe == LogicState::Error {
            for ch in CHANNELS {
                self.set_output(engine, ch[2], LogicState::Error);
            }
            return;
        }
        if strobe == LogicState::High {
            for ch in CHANNELS {
                self.set_output(engine, ch[2], LogicState::Low);
            }
            return;
        }
        let select = self.read(engine, PIN_SELECT);
        for ch in CHANNELS {
            let [a, b, y] = ch;
            let value = if select == LogicState::Error {
                LogicState::Error
            } else if select == LogicState::High {
                self.read(engine, b)
            } else {
                self.read(engine, a)
            };
            self.set_output(engine, y, value);
        }
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 17];
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> (CircuitEngine, Mux157) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Mux157::new();
        chip.set_pin_node(16, vcc);
        chip.set_pin_node(8, gnd);
        for ch in CHANNELS {
            for &p in &ch {
                chip.set_pin_node(p, engine.create_net());
            }
        }
        let select = engine.create_net();
        chip.set_pin_node(PIN_SELECT, select);
        let strobe = engine.create_net();
        chip.set_pin_node(PIN_STROBE, strobe);
        (engine, chip)
    }

    #[test]
    fn select_low_routes_a_inputs() {
        let (engine, mut chip) = place();
        let select = chip.pin_node(PIN_SELECT).unwrap();
        engine.add_driver(select, crate::net::Driver::ConstantLow).unwrap();
        let strobe = chip.pin_node(PIN_STROBE).unwrap();
        engine.add_driver(strobe, crate::net::Driver::ConstantLow).unwrap();
        let a0 = chip.pin_node(CHANNELS[0][0]).unwrap();
        engine.add_driver(a0, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(CHANNELS[0][2]), LogicState::High);
    }

    #[test]
    fn select_high_routes_b_inputs() {
        let (engine, mut chip) = place();
        let select = chip.pin_node(PIN_SELECT).unwrap();
        engine.add_driver(select, crate::net::Driver::ConstantHigh).unwrap();
        let strobe = chip.pin_node(PIN_STROBE).unwrap();
        engine.add_driver(strobe, crate::net::Driver::ConstantLow).unwrap();
        let b0 = chip.pin_node(CHANNELS[0][1]).unwrap();
        engine.add_driver(b0, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(CHANNELS[0][2]), LogicState::Low);
    }

    #[test]
    fn strobe_high_forces_all_outputs_low() {
        let (engine, mut chip) = place();
        let strobe = chip.pin_node(PIN_STROBE).unwrap();
        engine.add_driver(strobe, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        for ch in CHANNELS {
            assert_eq!(chip.output_state(ch[2]), LogicState::Low);
        }
    }
}
