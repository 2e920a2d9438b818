#![doc = r#"
TTL 74LS-series digital logic trainer: a discrete-event simulation
kernel for breadboard-style circuits built from classic 7400-series
parts, toggle switches, clock generators, pushbuttons, and LEDs.

Modules:
- logic: four-valued `LogicState` and its resolution rule
- net: `NetId`-addressed electrical nodes, drivers, and listeners
- scheduler: the min-heap discrete-event queue the engine runs on
- engine: `CircuitEngine`, the net arena + scheduler + power rails
- wiring: the pin/wire graph and its net merge/split bookkeeping
- chip: the `ChipKind` trait, `PlacedChip` runtime wrapper, and the
  74LS-series catalogue (`chip::catalogue`)
- external: concrete switch/clock/button/LED collaborator types
- board: the assembler tying wiring and placed chips together
- error: the closed `TrainerError`/`WireErrorKind` taxonomy
"#]

pub mod board;
pub mod chip;
pub mod engine;
pub mod error;
pub mod external;
pub mod logic;
pub mod net;
pub mod scheduler;
pub mod wiring;

pub use board::Board;
pub use engine::CircuitEngine;
pub use error::{TrainerError, WireErrorKind};
pub use logic::LogicState;
pub use wiring::WiringGraph;
