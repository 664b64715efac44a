use crate::circuit::Circuit;
use crate::gate::Gate;
use crate::types::{InputSlot, LayerRank};
use std::fmt;

/// Human readable dump of a circuit, see [`Circuit::listing`].
pub struct Listing<'a> {
    circuit: &'a Circuit,
    summary: bool,
    connections: bool,
}

/// Gates whose required inputs are not all connected, see [`Circuit::unconnected`].
pub struct Unconnected<'a> {
    circuit: &'a Circuit,
}

impl Circuit {
    /// `summary` adds the input/output counts, `connections` lists what
    /// drives every gate input.
    pub fn listing(&self, summary: bool, connections: bool) -> Listing<'_> {
        Listing {
            circuit: self,
            summary,
            connections,
        }
    }

    pub fn unconnected(&self) -> Unconnected<'_> {
        Unconnected { circuit: self }
    }

    /// Ids of gates that would fail to evaluate, with the missing slots.
    pub fn unconnected_gates(&self) -> Vec<(&Gate, Vec<InputSlot>)> {
        self.layers()
            .filter(|(rank, _)| *rank != LayerRank::Input)
            .flat_map(|(_, layer)| layer.gates())
            .filter_map(|id| self.gate(id))
            .map(|gate| (gate, gate.missing_inputs()))
            .filter(|(_, missing)| !missing.is_empty())
            .collect()
    }
}

fn layer_title(rank: LayerRank) -> String {
    match rank {
        LayerRank::Input => "Input layer:".to_string(),
        LayerRank::Output => "Output layer:".to_string(),
        LayerRank::Numbered(x) => format!("Layer {}:", x),
    }
}

fn source_text(gate: &Gate, slot: InputSlot) -> String {
    match gate.source(slot) {
        Some(source) => format!("{}{}", if source.invert { "!" } else { "" }, source.gate),
        None => "nc".to_string(),
    }
}

impl<'a> fmt::Display for Listing<'a> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let circuit = self.circuit;
        if self.summary {
            writeln!(formatter, "Inputs  : {} (+2)", circuit.num_inputs())?;
            writeln!(formatter, "Outputs : {}", circuit.num_outputs())?;
        } else if self.connections {
            writeln!(formatter, "Connections")?;
        }
        for (rank, layer) in circuit.layers() {
            writeln!(formatter, "{}", layer_title(rank))?;
            let show_inputs = self.connections && rank != LayerRank::Input;
            for gate in layer.gates().filter_map(|id| circuit.gate(id)) {
                writeln!(
                    formatter,
                    "    {} ({}){}",
                    gate.type_.code(),
                    gate.id,
                    if show_inputs { ":" } else { "" }
                )?;
                if !show_inputs {
                    continue;
                }
                // a unary gate with one input connected only shows that one
                let partial = gate.type_.is_unary() && gate.sources().count() == 1;
                for &slot in InputSlot::BOTH.iter() {
                    if partial && gate.source(slot).is_none() {
                        continue;
                    }
                    writeln!(formatter, "        in_{}: {}", slot, source_text(gate, slot))?;
                }
            }
        }
        Ok(())
    }
}

impl<'a> fmt::Display for Unconnected<'a> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let circuit = self.circuit;
        writeln!(formatter, "Unconnected gates")?;
        for (rank, layer) in circuit.layers() {
            if rank == LayerRank::Input {
                continue;
            }
            writeln!(formatter, "{}", layer_title(rank))?;
            let mut any = false;
            for gate in layer.gates().filter_map(|id| circuit.gate(id)) {
                let missing = gate.missing_inputs();
                if missing.is_empty() {
                    continue;
                }
                any = true;
                if gate.type_.is_unary() {
                    writeln!(formatter, "    {} ({})", gate.type_.code(), gate.id)?;
                } else {
                    for slot in missing {
                        writeln!(
                            formatter,
                            "    {} ({}) - input {}",
                            gate.type_.code(),
                            gate.id,
                            slot
                        )?;
                    }
                }
            }
            if !any {
                writeln!(formatter, "    OK")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::gate::GateType;
#[cfg(test)]
use crate::types::GateId;

#[cfg(test)]
fn sample() -> Circuit {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(2)).unwrap();
    let and = circuit.add_gate(GateType::And, LayerRank::from(2)).unwrap();
    let not = circuit.add_gate(GateType::Not, LayerRank::from(2)).unwrap();
    circuit.add_connection(GateId::new(2), true, and, InputSlot::In1).unwrap();
    circuit.add_connection(GateId::new(2), false, not, InputSlot::In1).unwrap();
    circuit
}

#[test]
fn test_listing() {
    let circuit = sample();
    assert_eq!(
        circuit.listing(true, true).to_string(),
        "Inputs  : 1 (+2)
Outputs : 1
Input layer:
    BUF (0)
    BUF (1)
    BUF (2)
Layer 2:
    AND (4):
        in_0: nc
        in_1: !2
    NOT (5):
        in_1: 2
Output layer:
    BUF (3):
        in_0: nc
        in_1: nc
"
    );
    assert_eq!(
        circuit.listing(false, false).to_string(),
        "Input layer:
    BUF (0)
    BUF (1)
    BUF (2)
Layer 2:
    AND (4)
    NOT (5)
Output layer:
    BUF (3)
"
    );
}

#[test]
fn test_unconnected() {
    let circuit = sample();
    assert_eq!(
        circuit.unconnected().to_string(),
        "Unconnected gates
Layer 2:
    AND (4) - input 0
Output layer:
    BUF (3)
"
    );
    let ids: Vec<usize> = circuit
        .unconnected_gates()
        .iter()
        .map(|(gate, _)| gate.id.index())
        .collect();
    assert_eq!(ids, vec![4, 3]);
}
