//! Catalogue registry: maps a 74LSxx part number string to a constructor.
//!
//! Grounded on the teacher's `Cartridge::from_ines_bytes` mapper dispatch
//! (src/cartridge.rs:180-191), which matches a numeric mapper id against a
//! fixed list and either returns the right `Box<dyn Mapper>` or an error
//! for anything unsupported. This registry is the same shape, keyed by
//! part-number string instead of mapper id, and split into the three
//! queries spec §4.6 calls for: listing what exists, checking whether a
//! part number is known, and actually building one.

use crate::chip::catalogue::{
    adder283::Adder283, bcd47::Bcd47, counter90::Counter90, counter93::Counter93,
    decoder138::Decoder138, dff74::Dff74, gates::HexInverter04, gates::QuadGate2, jk76::Jk76,
    mux151::Mux151, mux153::Mux153, mux157::Mux157,
};
use crate::chip::{ChipId, ChipKind, PlacedChip};

/// Every part number this catalogue can place, in datasheet order.
pub const PART_NUMBERS: &[&str] = &[
    "74LS00", "74LS02", "74LS04", "74LS08", "74LS32", "74LS47", "74LS74", "74LS76", "74LS86",
    "74LS90", "74LS93", "74LS138", "74LS151", "74LS153", "74LS157", "74LS283",
];

pub fn part_numbers() -> &'static [&'static str] {
    PART_NUMBERS
}

/// A zero-argument factory for one part number. Returned by `lookup` so a
/// caller can check whether a part is known before committing to build
/// it, without allocating the chip itself.
pub type ChipFactory = fn() -> Box<dyn ChipKind>;

pub fn lookup(part_number: &str) -> Option<ChipFactory> {
    let factory: ChipFactory = match part_number {
        "74LS00" => || Box::new(QuadGate2::nand00()),
        "74LS02" => || Box::new(QuadGate2::nor02()),
        "74LS04" => || Box::new(HexInverter04::new()),
        "74LS08" => || Box::new(QuadGate2::and08()),
        "74LS32" => || Box::new(QuadGate2::or32()),
        "74LS86" => || Box::new(QuadGate2::xor86()),
        "74LS47" => || Box::new(Bcd47::new()),
        "74LS74" => || Box::new(Dff74::new()),
        "74LS76" => || Box::new(Jk76::new()),
        "74LS90" => || Box::new(Counter90::new()),
        "74LS93" => || Box::new(Counter93::new()),
        "74LS138" => || Box::new(Decoder138::new()),
        "74LS151" => || Box::new(Mux151::new()),
        "74LS153" => || Box::new(Mux153::new()),
        "74LS157" => || Box::new(Mux157::new()),
        "74LS283" => || Box::new(Adder283::new()),
        _ => return None,
    };
    Some(factory)
}

/// Build and place a fresh chip instance for `part_number` under `id`, or
/// `None` if the catalogue doesn't carry that part. The returned
/// `PlacedChip` still needs its pins bound and `setup()` called by the
/// board assembler before it does anything — this only constructs it.
pub fn instantiate(part_number: &str, id: ChipId) -> Option<PlacedChip> {
    let chip: Box<dyn ChipKind> = lookup(part_number)?();
    Some(PlacedChip::new(id, chip))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_part_number_is_instantiable() {
        for &part in part_numbers() {
            let placed = instantiate(part, ChipId::from("u1")).unwrap_or_else(|| panic!("{part} missing from registry"));
            assert_eq!(placed.part_number(), part);
        }
    }

    #[test]
    fn unknown_part_number_returns_none() {
        assert!(lookup("74LS999").is_none());
        assert!(instantiate("not-a-real-part", ChipId::from("u1")).is_none());
    }
}
