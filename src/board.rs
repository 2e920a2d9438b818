/*!
`Board`: the assembler that ties the Wiring Graph and the placed-chip
registry together.

`WiringGraph` only knows about pins and nets; it has no idea a pin
belongs to a chip that needs `rebind_pin` called on it when `on_net_update`
fires (wiring.rs's own doc comments call this out as a forward
dependency). `Board` is the missing piece: it owns a `CircuitEngine`, a
`WiringGraph`, and a `ChipId → PlacedChip` table, and is the thing that
actually implements the "`on_net_update` consumer uses the
`<socket_id>-pin-<N>` convention to find the owning chip" behavior spec
§6 describes.

Grounded on the teacher's `Bus` (src/bus.rs / src/bus/mod.rs): the bus
doesn't know how the CPU, PPU or APU work internally, it only knows how
to route reads and writes between components it holds handles to. `Board`
plays the same connective role one level up — it doesn't know how any
given chip evaluates, only how to keep each chip's pin bindings in sync
with the wiring graph's current net assignments.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::chip::catalogue;
use crate::chip::{ChipId, PlacedChip};
use crate::engine::CircuitEngine;
use crate::error::TrainerError;
use crate::net::NetId;
use crate::wiring::{PinId, PinType, WireErrorKind, WireId, WiringGraph};

/// Parses the `<socket_id>-pin-<N>` convention spec §6 names. Returns
/// `None` for pin ids that don't follow it (rail and external-collaborator
/// pins legitimately don't).
fn parse_chip_pin(pin: &PinId) -> Option<(String, u8)> {
    let s = &pin.0;
    let idx = s.find("-pin-")?;
    let (socket, rest) = s.split_at(idx);
    let n: u8 = rest["-pin-".len()..].parse().ok()?;
    Some((socket.to_string(), n))
}

struct BoardState {
    chips: HashMap<ChipId, PlacedChip>,
}

struct BoardShared {
    engine: CircuitEngine,
    wiring: WiringGraph,
    state: RefCell<BoardState>,
}

/// Cheap-to-clone handle, same shape as `CircuitEngine` and `WiringGraph`.
#[derive(Clone)]
pub struct Board(Rc<BoardShared>);

impl Board {
    pub fn new(engine: CircuitEngine) -> Board {
        let wiring = WiringGraph::new(engine.clone());
        let board = Board(Rc::new(BoardShared {
            engine,
            wiring,
            state: RefCell::new(BoardState { chips: HashMap::new() }),
        }));
        board.install_rebind_hook();
        board
    }

    pub fn engine(&self) -> &CircuitEngine {
        &self.0.engine
    }

    pub fn wiring(&self) -> &WiringGraph {
        &self.0.wiring
    }

    fn install_rebind_hook(&self) {
        let board = self.clone();
        self.0.wiring.on_net_update(Rc::new(move |pins, net| {
            board.rebind_affected_chips(pins, net);
        }));
    }

    fn rebind_affected_chips(&self, pins: &[PinId], net: NetId) {
        let state = self.0.state.borrow();
        for pin in pins {
            let Some((socket, pin_index)) = parse_chip_pin(pin) else { continue };
            let Some(chip) = state.chips.get(&ChipId::from(socket.as_str())) else { continue };
            chip.rebind_pin(&self.0.engine, pin_index, net);
        }
    }

    /// Place a fresh chip instance under `id`, register each of its pins
    /// with the wiring graph under the `<id>-pin-<N>` convention, and run
    /// its setup protocol. The chip starts out wired to nothing but its
    /// own fresh nets — callers add wires afterward with `wire`.
    pub fn place_chip(&self, id: impl Into<String>, part_number: &str) -> Result<ChipId, TrainerError> {
        let id = ChipId(id.into());
        let placed = catalogue::instantiate(part_number, id.clone()).ok_or(TrainerError::UnknownPart)?;

        for spec in placed.pin_spec() {
            let net = self.0.engine.create_net();
            placed.set_pin_node(spec.index, net);
            let pin = PinId::from(format!("{id}-pin-{}", spec.index));
            let pin_type = pin_type_for_role(spec.role);
            self.0.wiring.register_pin(pin, net, pin_type, Some(id.clone()))?;
        }
        placed.setup(&self.0.engine)?;

        self.0.state.borrow_mut().chips.insert(id.clone(), placed);
        Ok(id)
    }

    pub fn chip(&self, id: &ChipId) -> Option<PlacedChip> {
        self.0.state.borrow().chips.get(id).cloned()
    }

    /// Register the VCC/GND rail pins under the conventional `"vcc"`/`"gnd"`
    /// pin ids so a wire can be dropped onto either one (spec §6).
    pub fn register_rails(&self) -> Result<(), TrainerError> {
        let (vcc, gnd) = self.0.engine.rails();
        self.0.wiring.register_pin(PinId::from("vcc"), vcc, PinType::Power, None)?;
        self.0.wiring.register_pin(PinId::from("gnd"), gnd, PinType::Power, None)?;
        Ok(())
    }

    /// Register a pin that belongs to an external collaborator rather
    /// than a catalogue chip — e.g. `"switch-1"` driving a `Switch`'s net.
    pub fn register_external_pin(&self, pin: impl Into<PinId>, net: NetId, pin_type: PinType) -> Result<(), TrainerError> {
        self.0.wiring.register_pin(pin.into(), net, pin_type, None)
    }

    pub fn wire(&self, source: impl Into<PinId>, target: impl Into<PinId>, color: impl Into<String>) -> Result<WireId, WireErrorKind> {
        self.0.wiring.add_wire(source.into(), target.into(), color)
    }

    pub fn unwire(&self, id: WireId) -> Result<(), TrainerError> {
        self.0.wiring.remove_wire(id)
    }
}

fn pin_type_for_role(role: crate::chip::PinRole) -> PinType {
    use crate::chip::PinRole::*;
    match role {
        Output => PinType::Output,
        Input => PinType::Input,
        Clock => PinType::Clock,
        Vcc | Gnd => PinType::Power,
        Nc => PinType::Nc,
    }
}
