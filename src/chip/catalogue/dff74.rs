//! 74LS74: dual positive-edge-triggered D flip-flop with asynchronous
//! active-low preset and clear. Edge detection follows the same
//! compare-against-the-previous-sample idiom the `avremu` shift-register
//! model uses for its `ClockState` transitions, adapted to this crate's
//! four-valued `LogicState` via `chip::is_rising_edge`.

use crate::chip::{is_rising_edge, pin, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::logic::LogicState;
use crate::net::NetId;
use crate::scheduler::TimeNs;

/// (CLR, D, CLK, PR, Q, QBAR) per half.
struct HalfLayout {
    clr: u8,
    d: u8,
    clk: u8,
    pr: u8,
    q: u8,
    qbar: u8,
}

const HALVES: [HalfLayout; 2] = [
    HalfLayout { clr: 1, d: 2, clk: 3, pr: 4, q: 5, qbar: 6 },
    HalfLayout { clr: 13, d: 12, clk: 11, pr: 10, q: 9, qbar: 8 },
];

#[derive(Clone, Copy)]
struct HalfState {
    q: bool,
    last_clk: LogicState,
}

pub struct Dff74 {
    pins: [Option<NetId>; 15],
    outputs: [LogicState; 15],
    halves: [HalfState; 2],
    delay_ns: TimeNs,
}

impl Dff74 {
    pub fn new() -> Self {
        Dff74 {
            pins: [None; 15],
            outputs: [LogicState::Float; 15],
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

    fn drive_qq(&mut self, engine: &CircuitEngine, half_index: usize, q: LogicState, qbar: LogicState) {
        let layout = &HALVES[half_index];
        self.set_output(engine, layout.q, q);
        self.set_output(engine, layout.qbar, qbar);
    }

    fn evaluate_half(&mut self, engine: &CircuitEngine, half_index: usize) {
        let layout_clr = HALVES[half_index].clr;
        let layout_pr = HALVES[half_index].pr;
        let layout_clk = HALVES[half_index].clk;
        let layout_d = HALVES[half_index].d;

        let clr = self.read(engine, layout_clr);
        let pr = self.read(engine, layout_pr);
        let clk = self.read(engine, layout_clk);
        let d = self.read(engine, layout_d);

        if [clr, pr, clk, d].contains(&LogicState::Error) {
            self.drive_qq(engine, half_index, LogicState::Error, LogicState::Error);
            self.halves[half_index].last_clk = clk;
            return;
        }

        // Both async inputs asserted simultaneously is documented
        // undefined on the real part; this model forces Q/QBAR both HIGH,
        // matching the teacher pack's preference for a deterministic,
        // visibly-anomalous result over a silent pick.
        if pr == LogicState::Low && clr == LogicState::Low {
            self.halves[half_index].q = true;
            self.drive_qq(engine, half_index, LogicState::High, LogicState::High);
            self.halves[half_index].last_clk = clk;
            return;
        }
        if pr == LogicState::Low {
            self.halves[half_index].q = true;
            self.drive_qq(engine, half_index, LogicState::High, LogicState::Low);
            self.halves[half_index].last_clk = clk;
            return;
        }
        if clr == LogicState::Low {
            self.halves[half_index].q = false;
            self.drive_qq(engine, half_index, LogicState::Low, LogicState::High);
            self.halves[half_index].last_clk = clk;
            return;
        }

        let prev_clk = self.halves[half_index].last_clk;
        if is_rising_edge(prev_clk, clk) {
            self.halves[half_index].q = d == LogicState::High;
        }
        self.halves[half_index].last_clk = clk;

        let q = self.halves[half_index].q;
        let (qv, qbarv) = if q { (LogicState::High, LogicState::Low) } else { (LogicState::Low, LogicState::High) };
        self.drive_qq(engine, half_index, qv, qbarv);
    }
}

impl Default for Dff74 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipKind for Dff74 {
    fn part_number(&self) -> &'static str {
        "74LS74"
    }
    fn pin_spec(&self) -> &'static [PinSpec] {
        use PinRole::*;
        &[
            pin(1, Input), pin(2, Input), pin(3, Clock), pin(4, Input),
            pin(5, Output), pin(6, Output),
            pin(7, Gnd),
            pin(8, Output), pin(9, Output), pin(10, Input),
            pin(11, Clock), pin(12, Input), pin(13, Input),
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
            for layout in &HALVES {
                self.set_output(engine, layout.q, LogicState::Float);
                self.set_output(engine, layout.qbar, LogicState::Float);
            }
            return;
        }
        for i in 0..2 {
            self.evaluate_half(engine, i);
        }
    }
    fn reset(&mut self, engine: &CircuitEngine) {
        self.outputs = [LogicState::Float; 15];
        self.halves = [HalfState { q: false, last_clk: LogicState::Float }; 2];
        self.trigger_evaluation(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> (CircuitEngine, Dff74, NetId, NetId, NetId, NetId) {
        let engine = CircuitEngine::default();
        engine.set_power(true);
        let (vcc, gnd) = engine.rails();
        let mut chip = Dff74::new();
        chip.set_pin_node(14, vcc);
        chip.set_pin_node(7, gnd);
        let d = engine.create_net();
        let clk = engine.create_net();
        let clr = engine.create_net();
        let pr = engine.create_net();
        chip.set_pin_node(HALVES[0].d, d);
        chip.set_pin_node(HALVES[0].clk, clk);
        chip.set_pin_node(HALVES[0].clr, clr);
        chip.set_pin_node(HALVES[0].pr, pr);
        chip.set_pin_node(HALVES[0].q, engine.create_net());
        chip.set_pin_node(HALVES[0].qbar, engine.create_net());
        engine.add_driver(clr, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(pr, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(clk, crate::net::Driver::ConstantLow).unwrap();
        (engine, chip, d, clk, clr, pr)
    }

    #[test]
    fn rising_edge_latches_d() {
        let (engine, mut chip, d, clk, _clr, _pr) = place();
        engine.add_driver(d, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(HALVES[0].q), LogicState::Low);

        engine.add_driver(clk, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(HALVES[0].q), LogicState::High);
        assert_eq!(chip.output_state(HALVES[0].qbar), LogicState::Low);
    }

    #[test]
    fn async_clear_wins_regardless_of_clock() {
        let (engine, mut chip, d, clk, clr, _pr) = place();
        engine.add_driver(d, crate::net::Driver::ConstantHigh).unwrap();
        engine.add_driver(clk, crate::net::Driver::ConstantHigh).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(HALVES[0].q), LogicState::High);

        engine.add_driver(clr, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(HALVES[0].q), LogicState::Low);
        assert_eq!(chip.output_state(HALVES[0].qbar), LogicState::High);
    }

    #[test]
    fn both_async_inputs_low_forces_q_and_qbar_high() {
        let (engine, mut chip, _d, _clk, clr, pr) = place();
        engine.add_driver(clr, crate::net::Driver::ConstantLow).unwrap();
        engine.add_driver(pr, crate::net::Driver::ConstantLow).unwrap();
        engine.step(1);
        chip.trigger_evaluation(&engine);
        assert_eq!(chip.output_state(HALVES[0].q), LogicState::High);
        assert_eq!(chip.output_state(HALVES[0].qbar), LogicState::High);
    }
}
