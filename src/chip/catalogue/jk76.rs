//! 74LS76: dual negative-edge-triggered JK flip-flop with asynchronous
//! active-low preset and clear. Non-standard rail placement per the
//! catalogue contract (VCC on pin 5, GND on pin 7); the pinout below is
//! this crate's own resolution of that note — see DESIGN.md's Open
//! Question entry for the reasoning, since independent datasheet
//! mirrors of this particular part disagree on pin order.

use crate::chip::{is_falling_edge, pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

#[derive(Clone, Copy)]
struct HalfState {
    q: bool,
    last_clk: LogicState,
}

pub struct Jk76 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    halves: [HalfState; 2],
    delay_ns: TimeNs,
}

impl Jk76 {
    pub fn new() -> Self {
        Jk76 {
            pins: [None; 17],
            outputs: [LogicState::Float; 17],
            halves: [HalfState { q: false, last_clk: LogicState::Float }; 2],
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

    fn evaluate_half(&mut self, engine: &CircuitEngine, half_index: usize, clk_pin: u8, pr_pin: u8, clr_pin: u8, j_pin: u8, k_pin: u8, q_pin: u8, qbar_pin: u8) {
        let clk = self.read(engine, clk_pin);
        let pr = self.read(engine, pr_pin);
        let clr = self.read(engine, clr_pin);
        let j = self.read(engine, j_pin);
        let k = self.read(engine, k_pin);

        if [clk, pr, clr, j, k].contains(&LogicState::Error) {
            self.set_output(engine, q_pin, LogicState::Error);
            self.set_output(engine, qbar_pin, LogicState::Error);
            self.halves[half_index].last_clk = clk;
            return;
        }

        if pr == LogicState::Low && clr == LogicState::Low {
            self.halves[half_index].q = true;
            self.set_output(engine, q_pin, LogicState::High);
            self.set_output(engine, qbar_pin, LogicState::High);
            self.halves[half_index].last_clk = clk;
            return;
        }
        if pr == LogicState::Low {
            self.halves[half_index].q = true;
            self.set_output(engine, q_pin, LogicState::High);
            self.set_output(engine, qbar_pin, LogicState::Low);
            self.halves[half_index].last_clk = clk;
            return;
        }
        if clr == LogicState::Low {
            self.halves[half_index].q = false;
            self.set_output(engine, q_pin, LogicState::Low);
            self.set_output(engine, qbar_pin, LogicState::High);
            self.halves[half_index].last_clk = clk;
            return;
        }

        let prev_clk = self.halves[half_index].last_clk;
        if is_falling_edge(prev_clk, clk) {
            let j_set = j == LogicState::High;
            let k_set = k == LogicState::High;
            let q = self.halves[half_index].q;
            self.halves[half_index].q = match (j_set, k_set) {
                (false, false) => q,
                (false, true) => false,
                (true, false) => true,
                (true, true) => !q,
            };
        }
        self.halves[half_index].last_clk = clk;

        let q = self.halves[half_index].q;
        let (qv, qbarv) = if q { (LogicState::High, LogicState::Low) } else { (LogicState::Low, LogicState::High) };
        self.set_output(engine, q_pin, qv);
        self.set_output(engine, qbar_pin, qbarv);
    }
}

impl Default for Jk76 {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-half pin numbers for this 16-pin JK flip-flop pair (VCC=5, GND=7).
const H0_CLK: u8 = 1;
const H0_PR: u8 = 2;
const H0_CLR: u8 = 3;
const H0_J: u8 = 4;
const H0_K: u8 = 6;
const H0_QBAR: u8 = 15;
const H0_Q: u8 = 16;

const H1_CLK: u8 = 8;
const H1_PR: u8 = 9;
const H1_CLR: u8 = 10;
const H1_Q: u8 = 11;
const H1_K: u8 = 12;
const H1_QBAR: u8 = 13;
const H1_J: u8 = 14;

impl ChipKind for Jk76 {
    fn part_number(&self) -> &'static str {
        "74LS76"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Clock), pin(2, Input), pin(3, Input), pin(4, Input),
            pin(5, Vcc), pin(6, Input),
            pin(7, Gnd),
            pin(8, Clock), pin(9, Input), pin(10, Input), pin(11, Output), pin(12, Input),
            pin(13, Output), pin(14, Input), pin(15, Output), pin(16, Output),
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
            for &p in &[H0_Q, H0_QBAR, H1_Q, H1_QBAR] {
                self.set_output(engine, p, LogicState::Float);
            }
            return;
        }
        self.evaluate_half(engine, 0, H0_CLK, H0_PR, H0_CLR, H0_J, H0_K, H0_Q, H0_QBAR);
        self.evaluate_half(engine, 1, H1_CLK, H1_PR, H1_CLR, H1_J, H1_K, H1_Q, H1_QBAR);
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 17];
        self.halves = [HalfState { q: false, last_clk: LogicState::Float }; 2];
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> (CircuitEngine, Jk76, NetId, NetId, NetId, NetId, NetId) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Jk76::new();
        chip.set_pin_node(5, vcc);
        chip.set_pin_node(7, gnd);
        let clk = engine.create_net();
        let j = engine.create_net();
        let k = engine.create_net();
        let pr = engine.create_net();
        let clr = engine.create_net();
        chip.set_pin_node(H0_CLK, clk);
        chip.set_pin_node(H0_J, j);
        chip.set_pin_node(H0_K, k);
        chip.set_pin_node(H0_PR, pr);
        chip.set_pin_node(H0_CLR, clr);
        chip.set_pin_node(H0_Q, engine.create_net());
        chip.set_pin_node(H0_QBAR, engine.create_net());
        engine.add_driver(pr, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(clr, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(clk, crate::net::Driver::ConstantHigh).unwrap();
        (engine, chip, clk, j, k, pr, clr)
    }

    #[test]
    fn toggle_mode_flips_on_falling_edge() {
        let (engine, mut chip, clk, j, k, _pr, _clr) = place();
        engine.add_driver(j, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(k, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        let initial = chip.output_state(H0_Q);

        engine.add_driver(clk, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        let after = chip.output_state(H0_Q);
        assert_ne!(initial, after);
    }

    #[test]
    fn rising_edge_does_not_toggle() {
        let (engine, mut chip, clk, j, k, _pr, _clr) = place();
        engine.add_driver(j, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(k, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(clk, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        let initial = chip.output_state(H0_Q);

        engine.add_driver(clk, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(H0_Q), initial);
    }
}
