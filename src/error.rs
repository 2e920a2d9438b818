/*!
Closed error taxonomy for caller-facing API misuse.

Electrical failure (contention, power loss) is never an `Err` — it is an
in-band `LogicState` value, per spec §7. The errors here cover the other
half of that taxonomy: a caller handed the engine a stale or unknown
handle, or tried to register the same pin twice. The reference engine
expresses this boundary as `Result<_, String>` (`Cartridge::from_ines_bytes`);
this port closes that over a `thiserror` enum instead of ad hoc strings.
*/

use thiserror::Error;

use crate::net::NetId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainerError {
    #[error("no net registered with id {0}")]
    UnknownNet(NetId),

    #[error("pin {0:?} is not registered with the wiring graph")]
    UnknownPin(crate::wiring::PinId),

    #[error("pin {0:?} is already registered")]
    DuplicatePinRegistration(crate::wiring::PinId),

    #[error("unknown chip part number")]
    UnknownPart,

    #[error("chip {0} has no pin index {1}")]
    UnknownChipPin(crate::chip::ChipId, u8),

    #[error("no wire registered with id {0}")]
    UnknownWire(crate::wiring::WireId),
}

/// Reasons `WiringGraph::add_wire` can refuse a wire, per spec §4.4.
/// Distinct from `TrainerError`: these are everyday, expected outcomes of
/// a user dragging a wire between the wrong two pins, not programming
/// errors, so they are surfaced both as an `Err` return and via the
/// `on_wire_error` callback rather than being folded into `TrainerError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireErrorKind {
    #[error("a pin cannot be wired to itself")]
    SelfConnect,
    #[error("a wire already connects these two pins")]
    Duplicate,
    #[error("both pins are OUTPUT type (physical short)")]
    OutputOutput,
    #[error("one pin is the VCC rail and the other is the GND rail")]
    RailShort,
}
