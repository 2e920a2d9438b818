//! 74LS283: 4-bit binary full adder with fast (look-ahead) carry. Unusual
//! rail placement versus the rest of the catalogue — VCC is pin 4, GND is
//! pin 9 — straight off the real part's datasheet, which this struct's
//! `pin_spec` simply declares as-is; `ChipKind::is_powered`'s default
//! reads whichever pins carry `PinRole::Vcc`/`PinRole::Gnd`, so no special
//! casing is needed here.

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_A: [u8; 4] = [6, 2, 16, 12];
const PIN_B: [u8; 4] = [7, 3, 15, 11];
const PIN_SUM: [u8; 4] = [5, 1, 14, 10];
const PIN_C0: u8 = 8;
const PIN_C4: u8 = 13;

pub struct Adder283 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    delay_ns: TimeNs,
}

impl Adder283 {
    pub fn new() -> Self {
        Adder283 {
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

    fn float_all(&mut self, engine: &CircuitEngine) {
        for &p in PIN_SUM.iter().chain(std::iter::once(&PIN_C4)) {
            self.set_output(engine, p, LogicState::Float);
        }
    }

    fn error_all(&mut self, engine: &CircuitEngine) {
        for &p in PIN_SUM.iter().chain(std::iter::once(&PIN_C4)) {
            self.set_output(engine, p, LogicState::Error);
        }
    }
}

impl Default for Adder283 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Adder283 {
    fn part_number(&self) -> &'static str {
        "74LS283"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Output), pin(2, Input), pin(3, Input),
            pin(4, Vcc),
            pin(5, Output), pin(6, Input), pin(7, Input), pin(8, Input),
            pin(9, Gnd),
            pin(10, Output), pin(11, Input), pin(12, Input), pin(13, Output),
            pin(14, Output), pin(15, Input), pin(16, Input),
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
            self.float_all(engine);
            return;
        }
        let mut bits = Vec::with_capacity(9);
        bits.push(self.read(engine, PIN_C0));
        for i in 0..4 {
            bits.push(self.read(engine, PIN_A[i]));
            bits.push(self.read(engine, PIN_B[i]));
        }
        if bits.contains(&LogicState::Error) {
            self.error_all(engine);
            return;
        }

        let mut sums = [false; 4];
        let mut carry = self.read(engine, PIN_C0) == LogicState::High;
        for i in 0..4 {
            let a = self.read(engine, PIN_A[i]) == LogicState::High;
            let b = self.read(engine, PIN_B[i]) == LogicState::High;
            let sum = a ^ b ^ carry;
            let next_carry = (a && b) || (carry && (a ^ b));
            sums[i] = sum;
            carry = next_carry;
        }
        for i in 0..4 {
            let value = if sums[i] { LogicState::High } else { LogicState::Low };
            self.set_output(engine, PIN_SUM[i], value);
        }
        self.set_output(engine, PIN_C4, if carry { LogicState::High } else { LogicState::Low });
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 17];
        self.trigger_evaluation(engine);
    }
}
