//! The sixteen TTL parts this trainer knows how to place, one file per
//! family. Mirrors the teacher's `src/mappers/` layout (one file per
//! mapper variant, a registry module tying the part numbers to
//! constructors) — see `registry.rs`.

pub mod adder283;
pub mod bcd47;
pub mod counter90;
pub mod counter93;
pub mod decoder138;
pub mod dff74;
pub mod gates;
pub mod jk76;
pub mod mux151;
pub mod mux153;
pub mod mux157;
pub mod registry;

pub use registry::{instantiate, lookup, part_numbers, ChipFactory};
