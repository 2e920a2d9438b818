/*!
`PlacedChip`: the runtime wrapper that turns a bare `ChipKind` into the
live, event-driven object described by spec §4.5's setup protocol.

A `ChipKind` impl only knows how to evaluate itself given bound pins; it
has no way to hand out a driver closure that can call back into its own
`trigger_evaluation` (that needs a stable, shareable handle to `self`,
which `&mut self` can't provide) and no shared re-entrancy flag. Those two
things belong to a wrapper the same way the teacher's `cpu::dispatch`
module (src/cpu/dispatch/mod.rs) centralizes "one authoritative step,
defer side paths" above the raw opcode table instead of putting re-entrancy
bookkeeping in every opcode handler.

`PlacedChip` is that wrapper: an `Rc<RefCell<Box<dyn ChipKind>>>` plus a
shared re-entrancy flag, with inherent methods matching the external
interface spec §6 names almost verbatim (`setup`, `trigger_evaluation`,
`reset`), plus `rebind_pin` for the Wiring Graph's net-rebind protocol.
*/

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::chip::{ChipId, ChipKind, PinRole, PinSpec};
use crate::engine::CircuitEngine;
use crate::error::TrainerError;
use crate::net::{Driver, NetId};

/// Shareable, evaluable handle onto a placed chip instance. Cheap to
/// clone; every clone shares the same inner chip and re-entrancy flag.
#[derive(Clone)]
pub struct PlacedChip {
    id: ChipId,
    inner: Rc<std::cell::RefCell<Box<dyn ChipKind>>>,
    evaluating: Rc<Cell<bool>>,
}

impl PlacedChip {
    pub fn new(id: ChipId, chip: Box<dyn ChipKind>) -> PlacedChip {
        PlacedChip {
            id,
            inner: Rc::new(std::cell::RefCell::new(chip)),
            evaluating: Rc::new(Cell::new(false)),
        }
    }

    pub fn id(&self) -> &ChipId {
        &self.id
    }

    pub fn part_number(&self) -> &'static str {
        self.inner.borrow().part_number()
    }

    pub fn pin_spec(&self) -> &'static [PinSpec] {
        self.inner.borrow().pin_spec()
    }

    pub fn set_pin_node(&self, pin_index: u8, net: NetId) {
        self.inner.borrow_mut().set_pin_node(pin_index, net);
    }

    pub fn pin_node(&self, pin_index: u8) -> Option<NetId> {
        self.inner.borrow().pin_node(pin_index)
    }

    pub fn is_powered(&self, engine: &CircuitEngine) -> bool {
        self.inner.borrow().is_powered(engine)
    }

    /// Setup protocol (spec §4.5): every pin in `pin_spec()` must already
    /// be bound via `set_pin_node` before calling this. Installs the
    /// output driver / input-listener wiring and fires the first
    /// evaluation.
    pub fn setup(&self, engine: &CircuitEngine) -> Result<(), TrainerError> {
        for spec in self.pin_spec() {
            self.bind_role(engine, spec)?;
        }
        self.trigger_evaluation(engine);
        Ok(())
    }

    fn bind_role(&self, engine: &CircuitEngine, spec: &PinSpec) -> Result<(), TrainerError> {
        match spec.role {
            PinRole::Output => {
                let net = self
                    .pin_node(spec.index)
                    .ok_or_else(|| TrainerError::UnknownChipPin(self.id.clone(), spec.index))?;
                self.install_output_driver(engine, net, spec.index);
            }
            PinRole::Input | PinRole::Clock | PinRole::Vcc | PinRole::Gnd => {
                if let Some(net) = self.pin_node(spec.index) {
                    self.install_trigger_listener(engine, net);
                }
            }
            PinRole::Nc => {}
        }
        Ok(())
    }

    /// Net-rebind protocol (spec §4.4/§4.5): called by the board-level
    /// `on_net_update` consumer when one of this chip's pins has moved to
    /// a fresh net (a wire add/remove merged or split its component). Binds
    /// the new net, re-registers whatever driver or listener that pin's
    /// role needs, and re-evaluates.
    pub fn rebind_pin(&self, engine: &CircuitEngine, pin_index: u8, net: NetId) {
        self.set_pin_node(pin_index, net);
        let role = self.pin_spec().iter().find(|p| p.index == pin_index).map(|p| p.role);
        if let Some(role) = role {
            let spec = PinSpec { index: pin_index, role };
            let _ = self.bind_role(engine, &spec);
        }
        self.trigger_evaluation(engine);
    }

    fn install_output_driver(&self, engine: &CircuitEngine, net: NetId, pin_index: u8) {
        let inner = self.inner.clone();
        let engine_for_driver = engine.clone();
        let _ = engine.add_driver(
            net,
            Driver::closure(move || {
                let chip = inner.borrow();
                if chip.is_powered(&engine_for_driver) {
                    chip.output_state(pin_index)
                } else {
                    crate::logic::LogicState::Float
                }
            }),
        );
    }

    fn install_trigger_listener(&self, engine: &CircuitEngine, net: NetId) {
        let inner = self.inner.clone();
        let evaluating = self.evaluating.clone();
        let engine_for_listener = engine.clone();
        let _ = engine.add_listener(
            net,
            Rc::new(move |_state| {
                trigger(&inner, &evaluating, &engine_for_listener);
            }),
        );
    }

    /// Re-entrancy-guarded evaluation (spec §4.5/§5): a chip that
    /// re-triggers itself synchronously while already evaluating (e.g. via
    /// a power-pin listener it installs on itself) is dropped; the outer
    /// evaluation's proposals stand. Evaluator panics are caught, logged,
    /// and leave the output register unchanged for this cycle (spec §7).
    pub fn trigger_evaluation(&self, engine: &CircuitEngine) {
        trigger(&self.inner, &self.evaluating, engine);
    }

    pub fn reset(&self, engine: &CircuitEngine) {
        self.inner.borrow_mut().reset(engine);
    }
}

fn trigger(
    inner: &Rc<std::cell::RefCell<Box<dyn ChipKind>>>,
    evaluating: &Rc<Cell<bool>>,
    engine: &CircuitEngine,
) {
    if evaluating.get() {
        return;
    }
    evaluating.set(true);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        inner.borrow_mut().trigger_evaluation(engine);
    }));
    evaluating.set(false);
    if let Err(payload) = result {
        let message = crate::scheduler::panic_message(&payload);
        tracing::error!(part = %inner.borrow().part_number(), "chip evaluator panicked: {message}");
    }
}
