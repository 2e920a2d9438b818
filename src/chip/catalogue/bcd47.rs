//! 74LS47: BCD-to-seven-segment decoder/driver. Segment outputs are
//! active-LOW (a driven LOW output lights that segment on a common-anode
//! display). `LT`/`BI`/`RBI` are the three blanking controls; per spec
//! §1's non-goal on bidirectional pins, `BI` is modeled as input-only
//! (the real part's `BI/RBO` pin is open-collector and bidirectional).

use crate::chip::{pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

const PIN_B: u8 = 1;
const PIN_C: u8 = 2;
const PIN_LT: u8 = 3;
const PIN_BI: u8 = 4;
const PIN_RBI: u8 = 5;
const PIN_D: u8 = 6;
const PIN_A: u8 = 7;

/// Segment output pins in a..g order.
const SEGMENT_PINS: [u8; 7] = [13, 12, 11, 10, 9, 15, 14];

/// Segment-on bitmasks (bit 0 = a, .. bit 6 = g) for digits 0..9. A set bit
/// means that segment is lit, i.e. driven LOW (active-low outputs).
const DIGIT_SEGMENTS: [u8; 10] = [
    0b011_1111, // 0: a b c d e f
    0b000_0110, // 1: b c
    0b101_1011, // 2: a b d e g
    0b100_1111, // 3: a b c d g
    0b110_0110, // 4: b c f g
    0b110_1101, // 5: a c d f g
    0b111_1101, // 6: a c d e f g
    0b000_0111, // 7: a b c
    0b111_1111, // 8: a b c d e f g
    0b110_1111, // 9: a b c d f g
];

pub struct Bcd47 {
    pins: [Option<NetId>; 17],
    outputs: [LogicState; 17],
    delay_ns: TimeNs,
}

impl Bcd47 {
    pub fn new() -> Self {
        Bcd47 {
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

    fn set_segment(&mut self, engine: &CircuitEngine, segment: usize, lit: bool) {
        let value = if lit { LogicState::Low } else { LogicState::High };
        self.set_output(engine, SEGMENT_PINS[segment], value);
    }

    fn set_all_segments(&mut self, engine: &CircuitEngine, value: LogicState) {
        for &p in &SEGMENT_PINS {
            self.set_output(engine, p, value);
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

impl Default for Bcd47 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Bcd47 {
    fn part_number(&self) -> &'static str {
        "74LS47"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Input), pin(3, Input),
            pin(4, Input), pin(5, Input), pin(6, Input), pin(7, Input),
            pin(8, Gnd),
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
            self.set_all_segments(engine, LogicState::Float);
            return;
        }

        let lt = self.read(engine, PIN_LT);
        let bi = self.read(engine, PIN_BI);
        let rbi = self.read(engine, PIN_RBI);
        let a = self.read(engine, PIN_A);
        let b = self.read(engine, PIN_B);
        let c = self.read(engine, PIN_C);
        let d = self.read(engine, PIN_D);

        if [lt, bi, rbi, a, b, c, d].contains(&LogicState::Error) {
            self.set_all_segments(engine, LogicState::Error);
            return;
        }

        if lt == LogicState::Low {
            self.set_all_segments(engine, LogicState::Low);
            return;
        }
        if bi == LogicState::Low {
            self.set_all_segments(engine, LogicState::High);
            return;
        }

        let value = (a == LogicState::High) as u8
            | ((b == LogicState::High) as u8) << 1
            | ((c == LogicState::High) as u8) << 2
            | ((d == LogicState::High) as u8) << 3;

        if value == 0 && rbi == LogicState::Low {
            self.set_all_segments(engine, LogicState::High);
            return;
        }

        if value > 9 {
            self.set_all_segments(engine, LogicState::High);
            return;
        }

        let mask = DIGIT_SEGMENTS[value as usize];
        for segment in 0..7 {
            self.set_segment(engine, segment, (mask >> segment) & 1 == 1);
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

    fn powered_place() -> (CircuitEngine, Bcd47, Vec<NetId>) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Bcd47::new();
        chip.set_pin_node(16, vcc);
        chip.set_pin_node(8, gnd);
        let mut segments = Vec::with_capacity(7);
        for &p in SEGMENT_PINS.iter() {
            let n = engine.create_net();
            chip.set_pin_node(p, n);
            segments.push(n);
        }
        (engine, chip, segments)
    }

    fn drive_bcd(engine: &CircuitEngine, chip: &mut Bcd47, value: u8) {
        let bits = [(PIN_A, value & 1), (PIN_B, (value >> 1) & 1), (PIN_C, (value >> 2) & 1), (PIN_D, (value >> 3) & 1)];
        for (pin_index, bit) in bits {
            let net = engine.create_net();
            chip.set_pin_node(pin_index, net);
            let driver = if bit == 1 { crate::net::Driver::ConstantHigh } else { crate::net::Driver::ConstantLow };
            engine.add_driver(net, driver).unwrap();
        }
    }

    #[test]
    fn digit_zero_lights_abcdef_not_g() {
        let (engine, mut chip, segments) = powered_place();
        drive_bcd(&engine, &mut chip, 0);
        engine.step(1);
        chip.trigger_evaluation(&engine);
        let expected_lit = [true, true, true, true, true, true, false]; // a..g
        for (i, &lit) in expected_lit.iter().enumerate() {
            let expected = if lit { LogicState::Low } else { LogicState::High };
            assert_eq!(chip.output_state(SEGMENT_PINS[i]), expected, "segment {i}");
        }
        let _ = segments;
    }

    #[test]
    fn lamp_test_lights_every_segment() {
        let (engine, mut chip, _segments) = powered_place();
        let lt = engine.create_net();
        chip.set_pin_node(PIN_LT, lt);
        engine.add_driver(lt, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        for &p in &SEGMENT_PINS {
            assert_eq!(chip.output_state(p), LogicState::Low);
        }
    }

    #[test]
    fn blanking_input_low_turns_everything_off() {
        let (engine, mut chip, _segments) = powered_place();
        let bi = engine.create_net();
        chip.set_pin_node(PIN_BI, bi);
        engine.add_driver(bi, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        for &p in &SEGMENT_PINS {
            assert_eq!(chip.output_state(p), LogicState::High);
        }
    }

    #[test]
    fn unpowered_floats_segments() {
        let engine = CircuitEngine::default();
        let mut chip = Bcd47::new();
        chip.trigger_evaluation(&engine);
        for &p in &SEGMENT_PINS {
            assert_eq!(chip.output_state(p), LogicState::Float);
        }
    }
}
