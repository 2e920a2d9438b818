//! 74LS90: decade ripple counter, built from an independent mod-2 section
//! (CKA/QA) and a mod-5 section (CKB/QB..QD), plus two async gated
//! controls (R0 reset-to-zero, R9 set-to-nine) that take priority over
//! both sections' clocking. Pin layout and VCC(5)/GND(10) placement match
//! the real part's datasheet.

use crate::chip::{is_falling_edge, pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_CKB: u8 = 1;
const PIN_R0_1: u8 = 2;
const PIN_R0_2: u8 = 3;
const PIN_R9_1: u8 = 6;
const PIN_R9_2: u8 = 7;
const PIN_QC: u8 = 8;
const PIN_QB: u8 = 9;
const PIN_QD: u8 = 11;
const PIN_QA: u8 = 12;
const PIN_CKA: u8 = 14;

pub struct Counter90 {
    pins: [Option<NetId>; 15],
    outputs: [LogicState; 15],
    qa: bool,
    bcd: u8, // mod-5 section's own count, 0..=4
    last_cka: LogicState,
    last_ckb: LogicState,
    delay_ns: TimeNs,
}

impl Counter90 {
    pub fn new() -> Self {
        Counter90 {
            pins: [None; 15],
            outputs: [LogicState::Float; 15],
            qa: false,
            bcd: 0,
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
        let qb = level(self.bcd & 1 != 0);
        let qc = level(self.bcd & 2 != 0);
        let qd = level(self.bcd & 4 != 0);
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

impl Default for Counter90 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Counter90 {
    fn part_number(&self) -> &'static str {
        "74LS90"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Clock), pin(2, Input), pin(3, Input), pin(4, Nc),
            pin(5, Vcc), pin(6, Input), pin(7, Input),
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
        let r9_1 = self.read(engine, PIN_R9_1);
        let r9_2 = self.read(engine, PIN_R9_2);
        let cka = self.read(engine, PIN_CKA);
        let ckb = self.read(engine, PIN_CKB);

        if [r0_1, r0_2, r9_1, r9_2, cka, ckb].contains(&LogicState::Error) {
            self.error_outputs(engine);
            self.last_cka = cka;
            self.last_ckb = ckb;
            return;
        }

        let reset = r0_1 == LogicState::High && r0_2 == LogicState::High;
        let set9 = r9_1 == LogicState::High && r9_2 == LogicState::High;

        // R0 (reset) takes priority over R9 (set-to-nine) when both are
        // asserted at once; the datasheet leaves this case unspecified.
        if reset {
            self.qa = false;
            self.bcd = 0;
        } else if set9 {
            self.qa = true;
            self.bcd = 4; // QD QC QB = 100, QA = 1 => 1001 decimal 9
        } else {
            if is_falling_edge(self.last_cka, cka) {
                self.qa = !self.qa;
            }
            if is_falling_edge(self.last_ckb, ckb) {
                self.bcd = (self.bcd + 1) % 5;
            }
        }
        self.last_cka = cka;
        self.last_ckb = ckb;
        self.drive_outputs(engine);
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 15];
        self.qa = false;
        self.bcd = 0;
        self.last_cka = LogicState::Float;
        self.last_ckb = LogicState::Float;
        self.trigger_evaluation(engine);
    }
}
