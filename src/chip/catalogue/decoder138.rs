//! 74LS138: 3-to-8 line decoder/demultiplexer with three enable inputs.
//! Exactly one of Y0..Y7 goes LOW (active-low outputs) when enabled;
//! otherwise all outputs float HIGH.

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_A: u8 = 1;
const PIN_B: u8 = 2;
const PIN_C: u8 = 3;
const PIN_G2A: u8 = 4; // active low
const PIN_G2B: u8 = 5; // active low
const PIN_G1: u8 = 6; // active high
const OUTPUT_PINS: [u8; 8] = [15, 14, 13, 12, 11, 10, 9, 7]; // Y0..Y7

pub struct Decoder138 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    delay_ns: TimeNs,
}

impl Decoder138 {
    pub fn new() -> Self {
        Decoder138 {
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

impl Default for Decoder138 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Decoder138 {
    fn part_number(&self) -> &'static str {
        "74LS138"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Input), pin(3, Input),
            pin(4, Input), pin(5, Input), pin(6, Input),
            pin(7, Output), pin(8, Gnd),
            pin(9, Output), pin(10, Output), pin(11, Output), pin(12, Output),
            pin(13, Output), pin(14, Output), pin(15, Output),
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
            for &y in &OUTPUT_PINS {
                self.set_output(engine, y, LogicState::Float);
            }
            return;
        }
        let g1 = self.read(engine, PIN_G1);
        let g2a = self.read(engine, PIN_G2A);
        let g2b = self.read(engine, PIN_G2B);
        let enabled = g1 == LogicState::High && g2a == LogicState::Low && g2b == LogicState::Low;
        let contended = [g1, g2a, g2b].contains(&LogicState::Error);

        if contended {
            for &y in &OUTPUT_PINS {
                self.set_output(engine, y, LogicState::Error);
            }
            return;
        }

        if !enabled {
            for &y in &OUTPUT_PINS {
                self.set_output(engine, y, LogicState::High);
            }
            return;
        }

        let a = self.read(engine, PIN_A);
        let b = self.read(engine, PIN_B);
        let c = self.read(engine, PIN_C);
        if [a, b, c].contains(&LogicState::Error) {
            for &y in &OUTPUT_PINS {
                self.set_output(engine, y, LogicState::Error);
            }
            return;
        }
        let selected = (a == LogicState::High) as usize
            | ((b == LogicState::High) as usize) << 1
            | ((c == LogicState::High) as usize) << 2;

        for (index, &y) in OUTPUT_PINS.iter().enumerate() {
            let value = if index == selected { LogicState::Low } else { LogicState::High };
            self.set_output(engine, y, value);
        }
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 17];
        self.trigger_evaluation(engine);
    }
}
