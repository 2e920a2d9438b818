//! `trainer-cli`: a small demo binary that runs one of the spec's §8
//! end-to-end scenarios against the kernel and prints the resulting net
//! states. Not part of the public API — `ic_trainer_core` is a library;
//! this binary exists to give the kernel a runnable, observable front end
//! without pulling in any rendering surface (spec §1's out-of-scope list).

use clap::{Parser, ValueEnum};
use ic_trainer_core::board::Board;
use ic_trainer_core::chip::ChipId;
use ic_trainer_core::external::Switch;
use ic_trainer_core::wiring::PinType;
use ic_trainer_core::{CircuitEngine, LogicState};

#[derive(Parser)]
#[command(name = "trainer-cli")]
#[command(about = "Run one of the TTL trainer kernel's reference demo circuits")]
struct Cli {
    /// Which demo circuit to assemble and run.
    #[arg(value_enum)]
    scenario: Scenario,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    /// 74LS00 with both inputs left floating: output reads LOW.
    NandFloat,
    /// 74LS74 wired D<-QBAR: ten clock edges, ten toggles.
    DivideByTwo,
    /// Two 74LS04 outputs shorted onto one junction: net resolves ERROR.
    ShortCircuit,
    /// 74LS283 adding 5 + 3.
    Adder,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.scenario {
        Scenario::NandFloat => nand_float(),
        Scenario::DivideByTwo => divide_by_two(),
        Scenario::ShortCircuit => short_circuit(),
        Scenario::Adder => adder(),
    }
}

fn board_with_rails() -> Board {
    let engine = CircuitEngine::default();
    let board = Board::new(engine);
    board.register_rails().expect("rails register exactly once on a fresh board");
    board.engine().set_power(true);
    board
}

fn nand_float() {
    let board = board_with_rails();
    board.place_chip("u1", "74LS00").expect("74LS00 is in the catalogue");
    board.wire("u1-pin-14", "vcc", "red").expect("fresh chip's VCC pin is unwired");
    board.wire("u1-pin-7", "gnd", "black").expect("fresh chip's GND pin is unwired");
    board.engine().step(100);

    let chip = board.chip(&ChipId::from("u1")).expect("just placed");
    let y = chip.pin_node(3).expect("pin 3 is declared in 74LS00's pinout");
    println!("74LS00, pins 1 & 2 floating: Y = {}", board.engine().state_of(y).unwrap());
}

fn divide_by_two() {
    let board = board_with_rails();
    board.place_chip("u1", "74LS74").expect("74LS74 is in the catalogue");
    board.wire("u1-pin-14", "vcc", "red").unwrap();
    board.wire("u1-pin-7", "gnd", "black").unwrap();
    board.wire("u1-pin-1", "vcc", "red").unwrap();
    board.wire("u1-pin-4", "vcc", "red").unwrap();
    board.wire("u1-pin-2", "u1-pin-6", "yellow").unwrap();

    let clk_net = board.chip(&ChipId::from("u1")).unwrap().pin_node(3).unwrap();
    board.register_external_pin("clk", clk_net, PinType::Clock).unwrap();
    let clock = Switch::new(board.engine(), clk_net, false);
    board.engine().step(100);

    let q_net = board.chip(&ChipId::from("u1")).unwrap().pin_node(5).unwrap();
    for edge in 1..=10 {
        clock.toggle();
        board.engine().step(100);
        clock.toggle();
        board.engine().step(100);
        println!("after rising edge {edge}: Q = {}", board.engine().state_of(q_net).unwrap());
    }
}

fn short_circuit() {
    let board = board_with_rails();
    board.place_chip("u1", "74LS04").unwrap();
    board.place_chip("u2", "74LS04").unwrap();
    for id in ["u1", "u2"] {
        board.wire(format!("{id}-pin-14"), "vcc", "red").unwrap();
        board.wire(format!("{id}-pin-7"), "gnd", "black").unwrap();
    }
    board.wire("u1-pin-1", "gnd", "black").unwrap(); // output HIGH
    board.wire("u2-pin-1", "vcc", "red").unwrap(); // output LOW

    let junction = board.engine().create_net();
    board.register_external_pin("junction-1", junction, PinType::Nc).unwrap();
    board.wire("u1-pin-2", "junction-1", "orange").unwrap();
    board.wire("u2-pin-2", "junction-1", "orange").unwrap();
    board.engine().step(100);

    println!("shorted junction: {}", board.engine().state_of(junction).unwrap());
}

fn adder() {
    let board = board_with_rails();
    board.place_chip("u1", "74LS283").unwrap();
    board.wire("u1-pin-4", "vcc", "red").unwrap();
    board.wire("u1-pin-9", "gnd", "black").unwrap();

    let a_bits = [true, false, true, false]; // 5
    let b_bits = [true, true, false, false]; // 3
    for (pin, bit) in [6u8, 2, 16, 12].into_iter().zip(a_bits) {
        board.wire(format!("u1-pin-{pin}"), if bit { "vcc" } else { "gnd" }, "red").unwrap();
    }
    for (pin, bit) in [7u8, 3, 15, 11].into_iter().zip(b_bits) {
        board.wire(format!("u1-pin-{pin}"), if bit { "vcc" } else { "gnd" }, "red").unwrap();
    }
    board.wire("u1-pin-8", "gnd", "black").unwrap();
    board.engine().step(100);

    let chip = board.chip(&ChipId::from("u1")).unwrap();
    let sum_bits: Vec<LogicState> = [5u8, 1, 14, 10]
        .into_iter()
        .map(|pin| board.engine().state_of(chip.pin_node(pin).unwrap()).unwrap())
        .collect();
    let carry = board.engine().state_of(chip.pin_node(13).unwrap()).unwrap();
    println!("5 + 3: SUM1..SUM4 = {sum_bits:?}, C4 = {carry}");
}
