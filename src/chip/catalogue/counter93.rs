//! 74LS93: 4-bit ripple counter, built from an independent mod-2 section
//! (CKA/QA) and a mod-8 section (CKB/QB..QD), plus a gated async reset
//! (R0, both inputs HIGH). No set-to-value input, unlike the 74LS90.

use crate::chip::{is_falling_edge, pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_CKB: u8 = 1;
const PIN_R0_1: u8 = 2;
const PIN_R0_2: u8 = 3;
const PIN_QC: u8 = 8;
const PIN_QB: u8 = 9;
const PIN_QD: u8 = 11;
const PIN_QA: u8 = 12;
const PIN_CKA: u8 = 14;

pub struct Counter93 {
    pins: [Option<NetId>; 15],
    outputs: [LogicState; 15],
    qa: bool,
    count: u8, // mod-8 section's own count, 0..=7
    last_cka: LogicState,
    last_ckb: LogicState,
    delay_ns: TimeNs,
}

impl Counter93 {
    pub fn new() -> Self {
        Counter93 {
            pins: [None; 15],
            outputs: [LogicState::Float; 15],
            qa: false,
            count: 0,
            last_cka: LogicState::Float,
            last_ckb: LogicState::Float,
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

    fn drive_outputs(&mut self, engine: &CircuitEngine) {
        let qa = level(self.qa);
        let qb = level(self.count & 1 != 0);
        let qc = level(self.count & 2 != 0);
        let qd = level(self.count & 4 != 0);
        self.set_output(engine, PIN_QA, qa);
        self.set_output(engine, PIN_QB, qb);
        self.set_output(engine, PIN_QC, qc);
        self.set_output(engine, PIN_QD, qd);
    }

    fn float_outputs(&mut self, engine: &CircuitEngine) {
        for &p in &[PIN_QA, PIN_QB, PIN_QC, PIN_QD] {
            self.set_output(engine, p, LogicState::Float);
        }
    }

    fn error_outputs(&mut self, engine: &CircuitEngine) {
        for &p in &[PIN_QA, PIN_QB, PIN_QC, PIN_QD] {
            self.set_output(engine, p, LogicState::Error);
        }
    }
}

fn level(bit: bool) -> LogicState {
    if bit {
        LogicState::High
    } else {
        LogicState::Low
    }
}

impl Default for Counter93 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Counter93 {
    fn part_number(&self) -> &'static str {
        "74LS93"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Clock), pin(2, Input), pin(3, Input), pin(4, Nc),
            pin(5, Vcc), pin(6, Nc), pin(7, Nc),
            pin(8, Output), pin(9, Output),
            pin(10, Gnd),
            pin(11, Output), pin(12, Output), pin(13, Nc),
            pin(14, Clock),
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
            self.float_outputs(engine);
            return;
        }
        let r0_1 = self.read(engine, PIN_R0_1);
        let r0_2 = self.read(engine, PIN_R0_2);
        let cka = self.read(engine, PIN_CKA);
        let ckb = self.read(engine, PIN_CKB);

        if [r0_1, r0_2, cka, ckb].contains(&LogicState::Error) {
            self.error_outputs(engine);
            self.last_cka = cka;
            self.last_ckb = ckb;
            return;
        }

        let reset = r0_1 == LogicState::High && r0_2 == LogicState::High;
        if reset {
            self.qa = false;
            self.count = 0;
        } else {
            if is_falling_edge(self.last_cka, cka) {
                self.qa = !self.qa;
            }
            if is_falling_edge(self.last_ckb, ckb) {
                self.count = (self.count + 1) % 8;
            }
        }
        self.last_cka = cka;
        self.last_ckb = ckb;
        self.drive_outputs(engine);
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 15];
        self.qa = false;
        self.count = 0;
        self.last_cka = LogicState::Float;
        self.last_ckb = LogicState::Float;
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> (CircuitEngine, Counter93, NetId, NetId, NetId, NetId) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Counter93::new();
        chip.set_pin_node(5, vcc);
        chip.set_pin_node(10, gnd);
        let cka = engine.create_net();
        let ckb = engine.create_net();
        let r0a = engine.create_net();
        let r0b = engine.create_net();
        chip.set_pin_node(PIN_CKA, cka);
        chip.set_pin_node(PIN_CKB, ckb);
        chip.set_pin_node(PIN_R0_1, r0a);
        chip.set_pin_node(PIN_R0_2, r0b);
        for &p in &[PIN_QA, PIN_QB, PIN_QC, PIN_QD] {
            chip.set_pin_node(p, engine.create_net());
        }
        engine.add_driver(r0a, crate::net::Driver::ConstantLow).unwrap();
        engine.add_driver(r0b, crate::net::Driver::ConstantLow).unwrap();
        engine.add_driver(cka, crate::net::Driver::ConstantLow).unwrap();
        engine.add_driver(ckb, crate::net::Driver::ConstantLow).unwrap();
        (engine, chip, cka, ckb, r0a, r0b)
    }

    fn pulse(engine: &CircuitEngine, chip: &mut Counter93, net: NetId) {
        engine.add_driver(net, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        engine.add_driver(net, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
    }

    #[test]
    fn mod_eight_section_wraps_after_eight_pulses() {
        let (engine, mut chip, _cka, ckb, _r0a, _r0b) = place();
        for _ in 0..8 {
            pulse(&engine, &mut chip, ckb);
        }
        assert_eq!(chip.output_state(PIN_QB), LogicState::Low);
        assert_eq!(chip.output_state(PIN_QC), LogicState::Low);
        assert_eq!(chip.output_state(PIN_QD), LogicState::Low);
    }

    #[test]
    fn gated_reset_requires_both_r0_inputs_high() {
        let (engine, mut chip, cka, _ckb, r0a, r0b) = place();
        pulse(&engine, &mut chip, cka);
        assert_eq!(chip.output_state(PIN_QA), LogicState::High);

        engine.add_driver(r0a, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        // Only one R0 input HIGH: no reset yet.
        assert_eq!(chip.output_state(PIN_QA), LogicState::High);

        engine.add_driver(r0b, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(PIN_QA), LogicState::Low);
    }
}
