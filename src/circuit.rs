use crate::connection::{Connection, ConnectionRegistry};
use crate::error::CircuitError;
use crate::gate::{Gate, GateType, InputSource};
use crate::types::{GateId, InputSlot, LayerRank};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace, warn};

/// Gate 0 always outputs false, gate 1 always outputs true.
pub const CONST_FALSE: GateId = GateId::new(0);
pub const CONST_TRUE: GateId = GateId::new(1);

/// Upper bound on the input and output counts accepted by [`Circuit::try_new`].
pub const MAX_PINS: usize = 1 << 16;

#[derive(Clone, Debug, Default)]
pub struct Layer {
    gates: BTreeSet<GateId>,
}

/// A layered combinational circuit.
///
/// Gates are owned by an arena keyed by id; layers and gate inputs only refer
/// to gates by id. Every connection runs from a lower ranked layer to a
/// strictly higher one, so evaluating layers in rank order resolves every
/// input before it is read.
#[derive(Clone, Debug)]
pub struct Circuit {
    pub(crate) gates: BTreeMap<GateId, Gate>,
    pub(crate) layers: BTreeMap<LayerRank, Layer>,
    gate_layers: HashMap<GateId, LayerRank>,
    connections: ConnectionRegistry,
    pub(crate) inputs: Vec<bool>,
    num_outputs: usize,
    next_gate_id: usize,
}

/// Result of clearing both sides of a gate. The two halves succeed or fail
/// independently.
#[derive(Debug)]
pub struct GateConnectionsOutcome {
    pub inputs: Result<usize, CircuitError>,
    pub outputs: Result<usize, CircuitError>,
}

impl Layer {
    pub fn gates(&self) -> impl Iterator<Item = GateId> + '_ {
        self.gates.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn contains(&self, id: GateId) -> bool {
        self.gates.contains(&id)
    }
}

impl GateConnectionsOutcome {
    pub fn is_ok(&self) -> bool {
        self.inputs.is_ok() && self.outputs.is_ok()
    }
}

impl Circuit {
    /// Builds the input and output layers. Counts coming from outside the
    /// program should go through [`Circuit::try_new`] instead.
    pub fn new(num_inputs: usize, num_outputs: usize) -> Circuit {
        let mut circuit = Circuit {
            gates: BTreeMap::new(),
            layers: BTreeMap::new(),
            gate_layers: HashMap::new(),
            connections: ConnectionRegistry::new(),
            inputs: vec![false; num_inputs],
            num_outputs,
            next_gate_id: 0,
        };
        circuit.layers.insert(LayerRank::Input, Layer::default());
        circuit.layers.insert(LayerRank::Output, Layer::default());
        for _ in 0..num_inputs + 2 {
            circuit.alloc_gate(GateType::Buffer, LayerRank::Input);
        }
        for _ in 0..num_outputs {
            circuit.alloc_gate(GateType::Buffer, LayerRank::Output);
        }
        circuit.apply_inputs();
        circuit
    }

    /// Like [`Circuit::new`], but rejects counts above [`MAX_PINS`].
    pub fn try_new(num_inputs: usize, num_outputs: usize) -> Result<Circuit, CircuitError> {
        if num_inputs > MAX_PINS || num_outputs > MAX_PINS {
            return Err(CircuitError::TooManyPins {
                inputs: num_inputs,
                outputs: num_outputs,
                max: MAX_PINS,
            });
        }
        Ok(Circuit::new(num_inputs, num_outputs))
    }

    /// Discards the whole circuit and starts over with the given interface.
    /// Out of range counts leave the circuit as it was.
    pub fn set_io(&mut self, num_inputs: usize, num_outputs: usize) -> Result<(), CircuitError> {
        *self = Circuit::try_new(num_inputs, num_outputs)?;
        debug!(num_inputs, num_outputs, "reset circuit");
        Ok(())
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(&id)
    }

    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    pub fn layer(&self, rank: LayerRank) -> Option<&Layer> {
        self.layers.get(&rank)
    }

    /// Layers in evaluation order.
    pub fn layers(&self) -> impl Iterator<Item = (LayerRank, &Layer)> {
        self.layers.iter().map(|(rank, layer)| (*rank, layer))
    }

    pub fn rank_of(&self, id: GateId) -> Option<LayerRank> {
        self.gate_layers.get(&id).copied()
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn next_gate_id(&self) -> GateId {
        GateId::new(self.next_gate_id)
    }

    /// Ids of the buffers mirroring the external inputs, in input order.
    pub fn input_gates(&self) -> impl Iterator<Item = GateId> {
        (2..self.num_inputs() + 2).map(GateId::new)
    }

    pub fn output_gates(&self) -> impl Iterator<Item = GateId> + '_ {
        self.layers
            .get(&LayerRank::Output)
            .into_iter()
            .flat_map(|layer| layer.gates())
    }

    fn alloc_gate(&mut self, type_: GateType, rank: LayerRank) -> GateId {
        let id = GateId::new(self.next_gate_id);
        self.next_gate_id += 1;
        self.insert_gate(id, type_, rank);
        id
    }

    fn insert_gate(&mut self, id: GateId, type_: GateType, rank: LayerRank) {
        self.gates.insert(id, Gate::new(id, type_));
        self.gate_layers.insert(id, rank);
        if let Some(layer) = self.layers.get_mut(&rank) {
            layer.gates.insert(id);
        }
    }

    fn find_rank(&self, id: GateId) -> Result<LayerRank, CircuitError> {
        self.rank_of(id).ok_or(CircuitError::GateNotFound(id))
    }

    /// Rank of `id`, checked against `stated` when one is given.
    fn locate(&self, id: GateId, stated: Option<LayerRank>) -> Result<LayerRank, CircuitError> {
        let actual = self.find_rank(id)?;
        match stated {
            Some(stated) if stated != actual => Err(CircuitError::LayerMismatch {
                gate: id,
                stated,
                actual,
            }),
            _ => Ok(actual),
        }
    }

    fn user_layer(&self, rank: LayerRank) -> Result<(), CircuitError> {
        if rank.is_reserved() {
            return Err(CircuitError::ReservedLayer(rank));
        }
        if !self.layers.contains_key(&rank) {
            return Err(CircuitError::LayerNotFound(rank));
        }
        Ok(())
    }

    pub fn add_layer(&mut self, rank: LayerRank) -> Result<(), CircuitError> {
        if self.layers.contains_key(&rank) {
            return Err(CircuitError::LayerExists(rank));
        }
        self.layers.insert(rank, Layer::default());
        debug!(%rank, "added layer");
        Ok(())
    }

    pub fn add_gate(&mut self, type_: GateType, rank: LayerRank) -> Result<GateId, CircuitError> {
        self.user_layer(rank)?;
        if self.next_gate_id.checked_add(1).is_none() {
            return Err(CircuitError::GateIdOverflow(self.next_gate_id()));
        }
        let id = self.alloc_gate(type_, rank);
        debug!(%id, %type_, %rank, "added gate");
        Ok(id)
    }

    /// Adds a gate under a caller chosen id. Used when rebuilding a saved
    /// circuit; the id counter moves past `id` so it is never handed out again.
    pub(crate) fn add_gate_with_id(
        &mut self,
        id: GateId,
        type_: GateType,
        rank: LayerRank,
    ) -> Result<(), CircuitError> {
        self.user_layer(rank)?;
        if self.gates.contains_key(&id) {
            return Err(CircuitError::DuplicateGate(id));
        }
        let next = id
            .index()
            .checked_add(1)
            .ok_or(CircuitError::GateIdOverflow(id))?;
        self.insert_gate(id, type_, rank);
        self.next_gate_id = self.next_gate_id.max(next);
        Ok(())
    }

    pub fn add_connection(
        &mut self,
        source: GateId,
        invert: bool,
        dest: GateId,
        slot: InputSlot,
    ) -> Result<(), CircuitError> {
        self.connect(None, source, invert, None, dest, slot)
    }

    /// Same as [`Circuit::add_connection`], additionally checking that each
    /// gate sits in the stated layer.
    pub fn add_connection_in_layers(
        &mut self,
        source_rank: LayerRank,
        source: GateId,
        invert: bool,
        dest_rank: LayerRank,
        dest: GateId,
        slot: InputSlot,
    ) -> Result<(), CircuitError> {
        self.connect(Some(source_rank), source, invert, Some(dest_rank), dest, slot)
    }

    fn connect(
        &mut self,
        source_rank: Option<LayerRank>,
        source: GateId,
        invert: bool,
        dest_rank: Option<LayerRank>,
        dest: GateId,
        slot: InputSlot,
    ) -> Result<(), CircuitError> {
        self.find_rank(source)?;
        self.find_rank(dest)?;
        for rank in source_rank.iter().chain(dest_rank.iter()) {
            if !self.layers.contains_key(rank) {
                return Err(CircuitError::LayerNotFound(*rank));
            }
        }
        let source_rank = self.locate(source, source_rank)?;
        let dest_rank = self.locate(dest, dest_rank)?;
        if source_rank >= dest_rank {
            return Err(CircuitError::DirectionViolation {
                source_gate: source,
                source_rank,
                dest_gate: dest,
                dest_rank,
            });
        }
        if let Some(gate) = self.gates.get_mut(&dest) {
            gate.set_source(slot, Some(InputSource { gate: source, invert }));
        }
        let connection = Connection {
            source,
            invert,
            dest,
            slot,
        };
        if let Some(replaced) = self.connections.upsert(connection) {
            trace!(%replaced, "replaced connection");
        }
        debug!(%connection, "added connection");
        Ok(())
    }

    /// Clears the source of a destination slot if it still points at `connection`.
    fn detach(&mut self, connection: &Connection) {
        if let Some(gate) = self.gates.get_mut(&connection.dest) {
            if gate.source(connection.slot).map(|s| s.gate) == Some(connection.source) {
                gate.set_source(connection.slot, None);
            }
        }
    }

    /// Disconnects input `slot` of `dest`, whatever drives it. Disconnecting an
    /// unconnected slot succeeds.
    pub fn delete_connection_to(&mut self, dest: GateId, slot: InputSlot) -> Result<(), CircuitError> {
        self.find_rank(dest)?;
        if let Some(removed) = self.connections.remove_to(dest, slot) {
            self.detach(&removed);
            debug!(connection = %removed, "deleted connection");
        }
        Ok(())
    }

    /// Deletes the connection from `source` to `dest`'s `slot` if it exists
    /// with exactly this polarity.
    pub fn delete_connection(
        &mut self,
        source: GateId,
        invert: bool,
        dest: GateId,
        slot: InputSlot,
    ) -> Result<(), CircuitError> {
        self.disconnect(None, source, invert, None, dest, slot)
    }

    pub fn delete_connection_in_layers(
        &mut self,
        source_rank: LayerRank,
        source: GateId,
        invert: bool,
        dest_rank: LayerRank,
        dest: GateId,
        slot: InputSlot,
    ) -> Result<(), CircuitError> {
        self.disconnect(Some(source_rank), source, invert, Some(dest_rank), dest, slot)
    }

    fn disconnect(
        &mut self,
        source_rank: Option<LayerRank>,
        source: GateId,
        invert: bool,
        dest_rank: Option<LayerRank>,
        dest: GateId,
        slot: InputSlot,
    ) -> Result<(), CircuitError> {
        self.find_rank(source)?;
        self.find_rank(dest)?;
        self.locate(source, source_rank)?;
        self.locate(dest, dest_rank)?;
        let target = Connection {
            source,
            invert,
            dest,
            slot,
        };
        for removed in self.connections.remove_where(|c| *c == target) {
            self.detach(&removed);
            debug!(connection = %removed, "deleted connection");
        }
        Ok(())
    }

    /// Disconnects both inputs of a gate, returning how many connections went.
    pub fn delete_connections_to_gate_inputs(
        &mut self,
        id: GateId,
        rank: Option<LayerRank>,
    ) -> Result<usize, CircuitError> {
        self.locate(id, rank)?;
        let removed = self.connections.remove_where(|c| c.dest == id);
        for connection in &removed {
            self.detach(connection);
        }
        Ok(removed.len())
    }

    /// Disconnects every gate input driven by this gate.
    pub fn delete_connections_from_gate_outputs(
        &mut self,
        id: GateId,
        rank: Option<LayerRank>,
    ) -> Result<usize, CircuitError> {
        self.locate(id, rank)?;
        let removed = self.connections.remove_where(|c| c.source == id);
        for connection in &removed {
            self.detach(connection);
        }
        Ok(removed.len())
    }

    pub fn delete_connections_of_gate(
        &mut self,
        id: GateId,
        rank: Option<LayerRank>,
    ) -> GateConnectionsOutcome {
        GateConnectionsOutcome {
            inputs: self.delete_connections_to_gate_inputs(id, rank),
            outputs: self.delete_connections_from_gate_outputs(id, rank),
        }
    }

    /// Deletes a logic gate together with every connection touching it.
    pub fn delete_gate(&mut self, id: GateId, rank: Option<LayerRank>) -> Result<(), CircuitError> {
        let rank = self.locate(id, rank)?;
        if rank.is_reserved() {
            return Err(CircuitError::ReservedLayer(rank));
        }
        let inputs = self.delete_connections_to_gate_inputs(id, Some(rank))?;
        let outputs = self.delete_connections_from_gate_outputs(id, Some(rank))?;
        if let Some(layer) = self.layers.get_mut(&rank) {
            layer.gates.remove(&id);
        }
        self.gates.remove(&id);
        self.gate_layers.remove(&id);
        debug!(%id, %rank, inputs, outputs, "deleted gate");
        Ok(())
    }

    /// Deletes a logic layer and all of its gates. If a gate can't be deleted
    /// the layer stays, minus whatever gates were already removed.
    pub fn delete_layer(&mut self, rank: LayerRank) -> Result<(), CircuitError> {
        if rank.is_reserved() {
            return Err(CircuitError::ReservedLayer(rank));
        }
        let ids: Vec<GateId> = match self.layers.get(&rank) {
            Some(layer) => layer.gates().collect(),
            None => return Err(CircuitError::LayerNotFound(rank)),
        };
        for id in ids {
            if let Err(err) = self.delete_gate(id, Some(rank)) {
                warn!(%id, %rank, %err, "couldn't delete gate while deleting layer");
            }
        }
        // only reached when a gate of the layer is missing from the rank index
        let remaining = self.layers.get(&rank).map_or(0, |layer| layer.len());
        if remaining > 0 {
            return Err(CircuitError::NotEmpty { rank, remaining });
        }
        self.layers.remove(&rank);
        debug!(%rank, "deleted layer");
        Ok(())
    }
}

#[cfg(test)]
fn assert_consistent(circuit: &Circuit) {
    for c in circuit.connections() {
        let source_rank = circuit.rank_of(c.source).unwrap();
        let dest_rank = circuit.rank_of(c.dest).unwrap();
        assert!(source_rank < dest_rank, "{}", c);
        let gate = circuit.gate(c.dest).unwrap();
        assert_eq!(
            gate.source(c.slot),
            Some(InputSource {
                gate: c.source,
                invert: c.invert
            })
        );
    }
    for gate in circuit.gates() {
        for (slot, source) in gate.sources() {
            assert!(circuit.gate(source.gate).is_some());
            assert!(circuit.connections().to(gate.id, slot).is_some());
        }
    }
}

#[test]
fn test_new_circuit_layout() {
    let circuit = Circuit::new(3, 2);
    let inputs: Vec<usize> = circuit
        .layer(LayerRank::Input)
        .unwrap()
        .gates()
        .map(usize::from)
        .collect();
    assert_eq!(inputs, vec![0, 1, 2, 3, 4]);
    let outputs: Vec<usize> = circuit.output_gates().map(usize::from).collect();
    assert_eq!(outputs, vec![5, 6]);
    assert_eq!(circuit.input_gates().count(), 3);
    assert_eq!(circuit.next_gate_id(), GateId::new(7));
    assert!(circuit.gates().all(|g| g.type_ == GateType::Buffer));
}

#[test]
fn test_add_layer_and_gate() {
    let mut circuit = Circuit::new(2, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    assert!(matches!(
        circuit.add_layer(LayerRank::from(1)),
        Err(CircuitError::LayerExists(_))
    ));
    assert!(matches!(
        circuit.add_layer(LayerRank::Input),
        Err(CircuitError::LayerExists(_))
    ));
    assert!(matches!(
        circuit.add_layer(LayerRank::Output),
        Err(CircuitError::LayerExists(_))
    ));
    let id = circuit.add_gate(GateType::And, LayerRank::from(1)).unwrap();
    assert_eq!(id, GateId::new(5));
    assert_eq!(circuit.rank_of(id), Some(LayerRank::Numbered(1)));
    assert!(matches!(
        circuit.add_gate(GateType::And, LayerRank::from(2)),
        Err(CircuitError::LayerNotFound(_))
    ));
    assert!(matches!(
        circuit.add_gate(GateType::And, LayerRank::Input),
        Err(CircuitError::ReservedLayer(_))
    ));
    assert!(matches!(
        circuit.add_gate(GateType::And, LayerRank::Output),
        Err(CircuitError::ReservedLayer(_))
    ));
}

#[test]
fn test_ids_are_not_reused() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let a = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    circuit.delete_gate(a, None).unwrap();
    let b = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    assert!(b > a);
}

#[test]
fn test_backward_connection_is_rejected() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(3)).unwrap();
    circuit.add_layer(LayerRank::from(5)).unwrap();
    let low = circuit.add_gate(GateType::Not, LayerRank::from(3)).unwrap();
    let high = circuit.add_gate(GateType::Not, LayerRank::from(5)).unwrap();
    let err = circuit
        .add_connection(high, false, low, InputSlot::In0)
        .unwrap_err();
    assert!(matches!(err, CircuitError::DirectionViolation { .. }));
    assert!(circuit.connections().is_empty());
    assert_eq!(circuit.gate(low).unwrap().source(InputSlot::In0), None);
    assert_eq!(circuit.gate(high).unwrap().source(InputSlot::In0), None);
    // same layer isn't forward either
    let peer = circuit.add_gate(GateType::Not, LayerRank::from(5)).unwrap();
    assert!(matches!(
        circuit.add_connection(high, false, peer, InputSlot::In0),
        Err(CircuitError::DirectionViolation { .. })
    ));
    // nothing may drive the input layer
    assert!(matches!(
        circuit.add_connection(low, false, GateId::new(2), InputSlot::In0),
        Err(CircuitError::DirectionViolation { .. })
    ));
    assert!(matches!(
        circuit.add_connection(GateId::new(99), false, low, InputSlot::In0),
        Err(CircuitError::GateNotFound(_))
    ));
}

#[test]
fn test_connection_replaces_slot() {
    let mut circuit = Circuit::new(2, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let and = circuit.add_gate(GateType::And, LayerRank::from(1)).unwrap();
    circuit.add_connection(GateId::new(2), false, and, InputSlot::In0).unwrap();
    circuit.add_connection(GateId::new(3), true, and, InputSlot::In0).unwrap();
    assert_eq!(circuit.connections().len(), 1);
    assert_eq!(
        circuit.gate(and).unwrap().source(InputSlot::In0),
        Some(InputSource {
            gate: GateId::new(3),
            invert: true
        })
    );
    assert_consistent(&circuit);
}

#[test]
fn test_connection_in_layers() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let not = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    let input = GateId::new(2);
    assert!(matches!(
        circuit.add_connection_in_layers(
            LayerRank::from(4),
            input,
            false,
            LayerRank::from(1),
            not,
            InputSlot::In0
        ),
        Err(CircuitError::LayerNotFound(_))
    ));
    assert!(matches!(
        circuit.add_connection_in_layers(
            LayerRank::Input,
            input,
            false,
            LayerRank::Output,
            not,
            InputSlot::In0
        ),
        Err(CircuitError::LayerMismatch { .. })
    ));
    circuit
        .add_connection_in_layers(
            LayerRank::Input,
            input,
            true,
            LayerRank::from(1),
            not,
            InputSlot::In1,
        )
        .unwrap();
    // wrong polarity doesn't match
    circuit
        .delete_connection_in_layers(
            LayerRank::Input,
            input,
            false,
            LayerRank::from(1),
            not,
            InputSlot::In1,
        )
        .unwrap();
    assert_eq!(circuit.connections().len(), 1);
    circuit
        .delete_connection_in_layers(
            LayerRank::Input,
            input,
            true,
            LayerRank::from(1),
            not,
            InputSlot::In1,
        )
        .unwrap();
    assert!(circuit.connections().is_empty());
    assert_eq!(circuit.gate(not).unwrap().source(InputSlot::In1), None);
}

#[test]
fn test_delete_connection_is_idempotent() {
    let mut circuit = Circuit::new(1, 1);
    let output = GateId::new(3);
    circuit.add_connection(GateId::new(2), false, output, InputSlot::In0).unwrap();
    circuit.delete_connection_to(output, InputSlot::In0).unwrap();
    circuit.delete_connection_to(output, InputSlot::In0).unwrap();
    circuit
        .delete_connection(GateId::new(2), false, output, InputSlot::In0)
        .unwrap();
    assert!(circuit.connections().is_empty());
    assert_eq!(circuit.gate(output).unwrap().source(InputSlot::In0), None);
    assert!(matches!(
        circuit.delete_connection_to(GateId::new(42), InputSlot::In0),
        Err(CircuitError::GateNotFound(_))
    ));
}

#[test]
fn test_delete_gate_cascades() {
    let mut circuit = Circuit::new(2, 2);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    circuit.add_layer(LayerRank::from(2)).unwrap();
    let xor = circuit.add_gate(GateType::Xor, LayerRank::from(1)).unwrap();
    let not = circuit.add_gate(GateType::Not, LayerRank::from(2)).unwrap();
    circuit.add_connection(GateId::new(2), false, xor, InputSlot::In0).unwrap();
    circuit.add_connection(GateId::new(3), false, xor, InputSlot::In1).unwrap();
    circuit.add_connection(xor, false, not, InputSlot::In0).unwrap();
    circuit.add_connection(xor, true, GateId::new(4), InputSlot::In0).unwrap();
    circuit.add_connection(not, false, GateId::new(5), InputSlot::In1).unwrap();

    assert!(matches!(
        circuit.delete_gate(xor, Some(LayerRank::from(2))),
        Err(CircuitError::LayerMismatch { .. })
    ));
    assert!(matches!(
        circuit.delete_gate(GateId::new(2), None),
        Err(CircuitError::ReservedLayer(_))
    ));
    circuit.delete_gate(xor, Some(LayerRank::from(1))).unwrap();

    assert!(circuit.gate(xor).is_none());
    assert_eq!(circuit.rank_of(xor), None);
    assert_eq!(circuit.connections().touching(xor).count(), 0);
    assert!(circuit
        .gates()
        .all(|g| g.sources().all(|(_, source)| source.gate != xor)));
    assert_eq!(circuit.connections().len(), 1);
    assert_consistent(&circuit);
    assert!(matches!(
        circuit.delete_gate(xor, None),
        Err(CircuitError::GateNotFound(_))
    ));
}

#[test]
fn test_delete_connections_of_gate() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let buf = circuit.add_gate(GateType::Buffer, LayerRank::from(1)).unwrap();
    circuit.add_connection(GateId::new(2), false, buf, InputSlot::In0).unwrap();
    circuit.add_connection(CONST_TRUE, false, buf, InputSlot::In1).unwrap();
    circuit.add_connection(buf, false, GateId::new(3), InputSlot::In0).unwrap();

    let outcome = circuit.delete_connections_of_gate(buf, None);
    assert!(outcome.is_ok());
    assert_eq!(outcome.inputs.unwrap(), 2);
    assert_eq!(outcome.outputs.unwrap(), 1);
    assert!(circuit.connections().is_empty());
    assert_consistent(&circuit);

    let outcome = circuit.delete_connections_of_gate(buf, Some(LayerRank::Output));
    assert!(matches!(outcome.inputs, Err(CircuitError::LayerMismatch { .. })));
    assert!(matches!(outcome.outputs, Err(CircuitError::LayerMismatch { .. })));
}

#[test]
fn test_delete_layer() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    circuit.add_layer(LayerRank::from(2)).unwrap();
    let a = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    let b = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    let c = circuit.add_gate(GateType::Or, LayerRank::from(2)).unwrap();
    circuit.add_connection(GateId::new(2), false, a, InputSlot::In0).unwrap();
    circuit.add_connection(a, false, c, InputSlot::In0).unwrap();
    circuit.add_connection(b, false, c, InputSlot::In1).unwrap();
    circuit.add_connection(c, false, GateId::new(3), InputSlot::In0).unwrap();

    circuit.delete_layer(LayerRank::from(1)).unwrap();
    assert!(circuit.layer(LayerRank::from(1)).is_none());
    assert!(circuit.gate(a).is_none() && circuit.gate(b).is_none());
    assert_eq!(circuit.connections().len(), 1);
    assert_eq!(circuit.gate(c).unwrap().missing_inputs().len(), 2);
    assert_consistent(&circuit);

    assert!(matches!(
        circuit.delete_layer(LayerRank::from(1)),
        Err(CircuitError::LayerNotFound(_))
    ));
    assert!(matches!(
        circuit.delete_layer(LayerRank::Input),
        Err(CircuitError::ReservedLayer(_))
    ));
    assert!(matches!(
        circuit.delete_layer(LayerRank::Output),
        Err(CircuitError::ReservedLayer(_))
    ));
}

#[test]
fn test_set_io_discards_graph() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    circuit.set_io(2, 3).unwrap();
    assert_eq!(circuit.num_inputs(), 2);
    assert_eq!(circuit.num_outputs(), 3);
    assert_eq!(circuit.layers().count(), 2);
    assert_eq!(circuit.gates().count(), 7);

    assert!(matches!(
        circuit.set_io(usize::MAX, 1),
        Err(CircuitError::TooManyPins { .. })
    ));
    assert!(matches!(
        circuit.set_io(1, MAX_PINS + 1),
        Err(CircuitError::TooManyPins { .. })
    ));
    assert_eq!(circuit.num_inputs(), 2);
    assert_eq!(circuit.gates().count(), 7);
}

#[test]
fn test_gate_id_at_the_top_of_the_range() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let top = GateId::new(usize::MAX);
    assert!(matches!(
        circuit.add_gate_with_id(top, GateType::Not, LayerRank::from(1)),
        Err(CircuitError::GateIdOverflow(id)) if id == top
    ));
    assert!(circuit.gate(top).is_none());
    assert_eq!(circuit.next_gate_id(), GateId::new(4));

    let high = GateId::new(usize::MAX - 1);
    circuit.add_gate_with_id(high, GateType::Not, LayerRank::from(1)).unwrap();
    assert_eq!(circuit.next_gate_id(), top);
    assert!(matches!(
        circuit.add_gate(GateType::Buffer, LayerRank::from(1)),
        Err(CircuitError::GateIdOverflow(_))
    ));
    assert_consistent(&circuit);
}

#[test]
fn test_delete_layer_with_unindexed_gate() {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let a = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    let b = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    circuit.gate_layers.remove(&b);

    assert!(matches!(
        circuit.delete_layer(LayerRank::from(1)),
        Err(CircuitError::NotEmpty { remaining: 1, .. })
    ));
    assert!(circuit.gate(a).is_none());
    assert!(circuit.layer(LayerRank::from(1)).unwrap().contains(b));
}
