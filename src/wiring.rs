/*!
Wiring graph: the physical multigraph of pin-to-pin wires, and the
pin-to-net bookkeeping that keeps it synchronized with the circuit engine.

Shape
=====
Structurally this plays the same role the teacher engine's `Cartridge`
plays for its mapper: `Cartridge::from_ines_bytes` validates a header
*completely* before constructing anything (src/cartridge.rs), so a bad ROM
never leaves a half-built cartridge lying around. `add_wire` does the same:
every validation rule runs before any adjacency, net, or hook state is
touched, so a rejected wire leaves the graph byte-for-byte as it was.

Net merge vs. split
====================
Adding a wire only ever *merges* two nets (or no-ops if they're already the
same net) — cheap, and there is exactly one survivor. Removing a wire can
*split* a net's connected component, which this module resolves by
flood-fill-and-rebuild (spec §4.4's "destroy and recreate" design note)
rather than attempting an incremental topological diff.

Sharing model
=============
Like `CircuitEngine`, `WiringGraph` is a cheap `Rc`-backed handle: the
`on_net_update` hook needs to look up which chip owns a pin from *within*
the graph's own notification path, and a `Board`-level chip registry needs
to subscribe to that hook while also holding its own handle to the graph —
see `board.rs`.
*/

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::chip::ChipId;
use crate::engine::CircuitEngine;
use crate::error::{TrainerError, WireErrorKind};
use crate::net::NetId;

/// A logical pin identifier, e.g. `"ic-3-pin-5"`, `"switch-2"`, `"vcc"`.
/// Free-form; the kernel does not interpret the string beyond equality,
/// though the `<socket_id>-pin-<N>` convention (spec §6) is what lets a
/// `Board`-level consumer find the owning chip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub String);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PinId {
    fn from(s: &str) -> Self {
        PinId(s.to_string())
    }
}

impl From<String> for PinId {
    fn from(s: String) -> Self {
        PinId(s)
    }
}

/// Electrical role of a pin, used for wiring validation (§4.4) and TTL
/// input coercion (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinType {
    Input,
    Output,
    Clock,
    Power,
    Nc,
}

/// Stable handle identifying one added wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireId(u64);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire#{}", self.0)
    }
}

/// A physical wire between two pins, with a cosmetic color label the
/// kernel never interprets.
#[derive(Debug, Clone)]
pub struct Wire {
    pub id: WireId,
    pub source: PinId,
    pub target: PinId,
    pub color: String,
}

pub type WireAddedHook = Rc<dyn Fn(&Wire)>;
pub type WireRemovedHook = Rc<dyn Fn(WireId)>;
pub type NetUpdateHook = Rc<dyn Fn(&[PinId], NetId)>;
pub type WireErrorHook = Rc<dyn Fn(&PinId, &PinId, WireErrorKind)>;

struct GraphState {
    wires: Vec<Wire>,
    next_wire_id: u64,
    adjacency: HashMap<PinId, HashSet<PinId>>,
    pin_to_net: HashMap<PinId, NetId>,
    pin_type: HashMap<PinId, PinType>,
    pin_to_chip: HashMap<PinId, ChipId>,
    on_wire_added: Vec<WireAddedHook>,
    on_wire_removed: Vec<WireRemovedHook>,
    on_net_update: Vec<NetUpdateHook>,
    on_wire_error: Vec<WireErrorHook>,
}

struct GraphShared {
    engine: CircuitEngine,
    state: RefCell<GraphState>,
}

/// Cheap-to-clone handle onto the wiring graph; see module docs.
#[derive(Clone)]
pub struct WiringGraph(Rc<GraphShared>);

impl WiringGraph {
    pub fn new(engine: CircuitEngine) -> WiringGraph {
        WiringGraph(Rc::new(GraphShared {
            engine,
            state: RefCell::new(GraphState {
                wires: Vec::new(),
                next_wire_id: 0,
                adjacency: HashMap::new(),
                pin_to_net: HashMap::new(),
                pin_type: HashMap::new(),
                pin_to_chip: HashMap::new(),
                on_wire_added: Vec::new(),
                on_wire_removed: Vec::new(),
                on_net_update: Vec::new(),
                on_wire_error: Vec::new(),
            }),
        }))
    }

    pub fn engine(&self) -> &CircuitEngine {
        &self.0.engine
    }

    pub fn on_wire_added(&self, hook: WireAddedHook) {
        self.0.state.borrow_mut().on_wire_added.push(hook);
    }
    pub fn on_wire_removed(&self, hook: WireRemovedHook) {
        self.0.state.borrow_mut().on_wire_removed.push(hook);
    }
    pub fn on_net_update(&self, hook: NetUpdateHook) {
        self.0.state.borrow_mut().on_net_update.push(hook);
    }
    pub fn on_wire_error(&self, hook: WireErrorHook) {
        self.0.state.borrow_mut().on_wire_error.push(hook);
    }

    /// Register a pin's identity: which net it starts life on, what
    /// electrical role it plays, and (optionally) which chip owns it.
    /// Fails if the pin id was already registered.
    pub fn register_pin(
        &self,
        pin: PinId,
        net: NetId,
        pin_type: PinType,
        chip: Option<ChipId>,
    ) -> Result<(), TrainerError> {
        let mut state = self.0.state.borrow_mut();
        if state.pin_to_net.contains_key(&pin) {
            return Err(TrainerError::DuplicatePinRegistration(pin));
        }
        state.pin_to_net.insert(pin.clone(), net);
        state.pin_type.insert(pin.clone(), pin_type);
        if let Some(chip) = chip {
            state.pin_to_chip.insert(pin.clone(), chip);
        }
        state.adjacency.entry(pin).or_default();
        Ok(())
    }

    pub fn pin_to_net(&self, pin: &PinId) -> Option<NetId> {
        self.0.state.borrow().pin_to_net.get(pin).copied()
    }

    pub fn pin_type(&self, pin: &PinId) -> Option<PinType> {
        self.0.state.borrow().pin_type.get(pin).copied()
    }

    pub fn owning_chip(&self, pin: &PinId) -> Option<ChipId> {
        self.0.state.borrow().pin_to_chip.get(pin).cloned()
    }

    pub fn wire_count(&self) -> usize {
        self.0.state.borrow().wires.len()
    }

    fn pins_already_wired(state: &GraphState, s: &PinId, t: &PinId) -> bool {
        state
            .adjacency
            .get(s)
            .map(|neighbors| neighbors.contains(t))
            .unwrap_or(false)
    }

    /// Validate and add a wire between two registered pins. On success,
    /// fires `on_wire_added` and merges the two pins' nets (if distinct).
    /// On failure, fires `on_wire_error` and leaves all state unchanged.
    pub fn add_wire(&self, source: PinId, target: PinId, color: impl Into<String>) -> Result<WireId, WireErrorKind> {
        let kind = {
            let state = self.0.state.borrow();
            if source == target {
                Some(WireErrorKind::SelfConnect)
            } else if Self::pins_already_wired(&state, &source, &target) {
                Some(WireErrorKind::Duplicate)
            } else {
                let s_type = state.pin_type.get(&source).copied();
                let t_type = state.pin_type.get(&target).copied();
                if s_type == Some(PinType::Output) && t_type == Some(PinType::Output) {
                    Some(WireErrorKind::OutputOutput)
                } else {
                    let s_net = state.pin_to_net.get(&source).copied();
                    let t_net = state.pin_to_net.get(&target).copied();
                    let rail_short = match (s_net, t_net) {
                        (Some(sn), Some(tn)) => {
                            let vcc = self.0.engine.vcc_net();
                            let gnd = self.0.engine.gnd_net();
                            (Some(sn) == vcc && Some(tn) == gnd) || (Some(sn) == gnd && Some(tn) == vcc)
                        }
                        _ => false,
                    };
                    if rail_short {
                        Some(WireErrorKind::RailShort)
                    } else {
                        None
                    }
                }
            }
        };
        if let Some(kind) = kind {
            tracing::debug!(?source, ?target, ?kind, "wire rejected");
            for hook in self.0.state.borrow().on_wire_error.clone() {
                hook(&source, &target, kind);
            }
            return Err(kind);
        }

        let id = {
            let mut state = self.0.state.borrow_mut();
            let id = WireId(state.next_wire_id);
            state.next_wire_id += 1;
            state
                .adjacency
                .entry(source.clone())
                .or_default()
                .insert(target.clone());
            state
                .adjacency
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
            state.wires.push(Wire {
                id,
                source: source.clone(),
                target: target.clone(),
                color: color.into(),
            });
            id
        };

        self.merge_nets_for_pins(&source, &target);

        let wire = self.0.state.borrow().wires.iter().find(|w| w.id == id).cloned_wire();
        for hook in self.0.state.borrow().on_wire_added.clone() {
            hook(&wire);
        }
        Ok(id)
    }

    /// Flood-fill from `s` over the *current* adjacency (which already
    /// includes the just-added edge) and make every visited pin point at
    /// the surviving net.
    fn merge_nets_for_pins(&self, s: &PinId, t: &PinId) {
        let (net_s, net_t) = {
            let state = self.0.state.borrow();
            (state.pin_to_net.get(s).copied(), state.pin_to_net.get(t).copied())
        };
        let (Some(net_s), Some(net_t)) = (net_s, net_t) else {
            return;
        };
        if net_s != net_t {
            if let Err(e) = self.0.engine.merge_nets(net_s, net_t) {
                tracing::error!(error = %e, "merge_nets failed during wiring");
                return;
            }
        }
        let survivor = net_s;
        let visited = self.flood_fill(s);
        {
            let mut state = self.0.state.borrow_mut();
            for pin in &visited {
                state.pin_to_net.insert(pin.clone(), survivor);
            }
        }
        for hook in self.0.state.borrow().on_net_update.clone() {
            hook(&visited, survivor);
        }
    }

    fn flood_fill(&self, start: &PinId) -> Vec<PinId> {
        let state = self.0.state.borrow();
        let mut visited: HashSet<PinId> = HashSet::new();
        let mut stack = vec![start.clone()];
        while let Some(pin) = stack.pop() {
            if !visited.insert(pin.clone()) {
                continue;
            }
            if let Some(neighbors) = state.adjacency.get(&pin) {
                for n in neighbors {
                    if !visited.contains(n) {
                        stack.push(n.clone());
                    }
                }
            }
        }
        visited.into_iter().collect()
    }

    /// Remove a wire by id. Because removal may split a connected
    /// component, the two former endpoints are rebuilt independently.
    pub fn remove_wire(&self, id: WireId) -> Result<(), TrainerError> {
        let wire = {
            let mut state = self.0.state.borrow_mut();
            let idx = state
                .wires
                .iter()
                .position(|w| w.id == id)
                .ok_or(TrainerError::UnknownWire(id))?;
            let wire = state.wires.remove(idx);
            if let Some(set) = state.adjacency.get_mut(&wire.source) {
                set.remove(&wire.target);
            }
            if let Some(set) = state.adjacency.get_mut(&wire.target) {
                set.remove(&wire.source);
            }
            wire
        };

        for hook in self.0.state.borrow().on_wire_removed.clone() {
            hook(id);
        }

        self.rebuild_net(&wire.source);
        self.rebuild_net(&wire.target);
        Ok(())
    }

    /// Flood-fill the still-connected component from `pin`, give it a
    /// fresh net, remap every pin in the component to that net, destroy
    /// the net the component used to belong to, and fire `on_net_update`.
    /// This is the "destroy and recreate" rebuild the spec prefers over an
    /// incremental topological diff (§4.4 design note): simpler, and
    /// O(component size) is negligible at trainer scale. Destruction keeps
    /// a `NetId` held from before the split from resolving against a
    /// frozen, orphaned `Net` forever (spec §3/§9) — mirroring how
    /// `CircuitEngine::merge_nets` destroys the absorbed net on the merge
    /// side of wiring.
    fn rebuild_net(&self, pin: &PinId) {
        let Some(old_net) = self.pin_to_net(pin) else {
            return;
        };
        let component = self.flood_fill(pin);
        let fresh = self.0.engine.create_net();
        {
            let mut state = self.0.state.borrow_mut();
            for p in &component {
                state.pin_to_net.insert(p.clone(), fresh);
            }
        }
        for hook in self.0.state.borrow().on_net_update.clone() {
            hook(&component, fresh);
        }
        // A removed wire's two endpoints shared `old_net` before the
        // split; when the split leaves them in disjoint components, both
        // endpoints' rebuilds see the same `old_net` and the first one to
        // run destroys it, so the second sees it already gone. That's
        // expected, not an error.
        if self.0.engine.net_exists(old_net) {
            if let Err(e) = self.0.engine.destroy_net(old_net) {
                tracing::error!(error = %e, "destroy_net failed during wire-removal rebuild");
            }
        }
    }
}

trait FoundWire {
    fn cloned_wire(self) -> Wire;
}
impl FoundWire for Option<&Wire> {
    fn cloned_wire(self) -> Wire {
        self.expect("wire was just inserted").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CircuitEngine;

    fn graph_with_two_pins() -> (WiringGraph, PinId, PinId) {
        let engine = CircuitEngine::default();
        let wiring = WiringGraph::new(engine.clone());
        let a = PinId::from("a");
        let b = PinId::from("b");
        wiring.register_pin(a.clone(), engine.create_net(), PinType::Output, None).unwrap();
        wiring.register_pin(b.clone(), engine.create_net(), PinType::Input, None).unwrap();
        (wiring, a, b)
    }

    #[test]
    fn add_wire_merges_nets() {
        let (wiring, a, b) = graph_with_two_pins();
        let net_a = wiring.pin_to_net(&a).unwrap();
        wiring.add_wire(a.clone(), b.clone(), "red").unwrap();
        assert_eq!(wiring.pin_to_net(&a), wiring.pin_to_net(&b));
        assert_eq!(wiring.pin_to_net(&a), Some(net_a));
    }

    #[test]
    fn self_connect_rejected() {
        let (wiring, a, _b) = graph_with_two_pins();
        let err = wiring.add_wire(a.clone(), a.clone(), "red").unwrap_err();
        assert_eq!(err, WireErrorKind::SelfConnect);
        assert_eq!(wiring.wire_count(), 0);
    }

    #[test]
    fn duplicate_wire_rejected() {
        let (wiring, a, b) = graph_with_two_pins();
        wiring.add_wire(a.clone(), b.clone(), "red").unwrap();
        let err = wiring.add_wire(b.clone(), a.clone(), "blue").unwrap_err();
        assert_eq!(err, WireErrorKind::Duplicate);
        assert_eq!(wiring.wire_count(), 1);
    }

    #[test]
    fn output_output_rejected() {
        let engine = CircuitEngine::default();
        let wiring = WiringGraph::new(engine.clone());
        let a = PinId::from("a");
        let b = PinId::from("b");
        wiring.register_pin(a.clone(), engine.create_net(), PinType::Output, None).unwrap();
        wiring.register_pin(b.clone(), engine.create_net(), PinType::Output, None).unwrap();
        let err = wiring.add_wire(a, b, "red").unwrap_err();
        assert_eq!(err, WireErrorKind::OutputOutput);
    }

    #[test]
    fn rail_short_rejected() {
        let engine = CircuitEngine::default();
        let (vcc, gnd) = engine.rails();
        let wiring = WiringGraph::new(engine.clone());
        let vcc_pin = PinId::from("vcc");
        let gnd_pin = PinId::from("gnd");
        wiring.register_pin(vcc_pin.clone(), vcc, PinType::Power, None).unwrap();
        wiring.register_pin(gnd_pin.clone(), gnd, PinType::Power, None).unwrap();
        let err = wiring.add_wire(vcc_pin, gnd_pin, "red").unwrap_err();
        assert_eq!(err, WireErrorKind::RailShort);
    }

    #[test]
    fn transitivity_across_two_wires() {
        let engine = CircuitEngine::default();
        let wiring = WiringGraph::new(engine.clone());
        let a = PinId::from("a");
        let b = PinId::from("b");
        let c = PinId::from("c");
        for p in [&a, &b, &c] {
            wiring.register_pin(p.clone(), engine.create_net(), PinType::Input, None).unwrap();
        }
        wiring.add_wire(a.clone(), b.clone(), "r").unwrap();
        wiring.add_wire(b.clone(), c.clone(), "r").unwrap();
        assert_eq!(wiring.pin_to_net(&a), wiring.pin_to_net(&c));
    }

    #[test]
    fn remove_wire_splits_net() {
        let engine = CircuitEngine::default();
        let wiring = WiringGraph::new(engine.clone());
        let a = PinId::from("a");
        let b = PinId::from("b");
        let c = PinId::from("c");
        for p in [&a, &b, &c] {
            wiring.register_pin(p.clone(), engine.create_net(), PinType::Input, None).unwrap();
        }
        let w1 = wiring.add_wire(a.clone(), b.clone(), "r").unwrap();
        wiring.add_wire(b.clone(), c.clone(), "r").unwrap();
        assert_eq!(wiring.pin_to_net(&a), wiring.pin_to_net(&c));
        let merged_net = wiring.pin_to_net(&a).unwrap();

        wiring.remove_wire(w1).unwrap();
        assert_ne!(wiring.pin_to_net(&a), wiring.pin_to_net(&b));
        assert_eq!(wiring.pin_to_net(&b), wiring.pin_to_net(&c));
        assert!(!engine.net_exists(merged_net));
    }

    #[test]
    fn validation_failure_leaves_state_unchanged() {
        let (wiring, a, b) = graph_with_two_pins();
        wiring.add_wire(a.clone(), b.clone(), "red").unwrap();
        let before = wiring.wire_count();
        let _ = wiring.add_wire(a, b, "blue");
        assert_eq!(wiring.wire_count(), before);
    }
}
