use crate::circuit::{Circuit, CONST_FALSE, CONST_TRUE};
use crate::error::CircuitError;
use crate::gate::GateStatus;
use crate::types::LayerRank;
use std::fmt;
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TruthRow {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TruthTable {
    pub rows: Vec<TruthRow>,
}

pub fn format_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Binary counter step with bit 0 as the least significant bit. Returns
/// false once the counter wraps back to all zeros.
fn increment(bits: &mut [bool]) -> bool {
    for bit in bits.iter_mut() {
        *bit = !*bit;
        if *bit {
            return true;
        }
    }
    false
}

impl Circuit {
    /// Applies an input vector and marks every gate for recomputation.
    pub fn set_inputs(&mut self, inputs: &[bool]) -> Result<(), CircuitError> {
        if inputs.len() != self.num_inputs() {
            return Err(CircuitError::InputLength {
                expected: self.num_inputs(),
                actual: inputs.len(),
            });
        }
        self.inputs.clear();
        self.inputs.extend_from_slice(inputs);
        self.apply_inputs();
        trace!(inputs = %format_bits(inputs), "inputs set");
        Ok(())
    }

    pub(crate) fn apply_inputs(&mut self) {
        for gate in self.gates.values_mut() {
            gate.status = GateStatus::ToUpdate;
        }
        if let Some(gate) = self.gates.get_mut(&CONST_FALSE) {
            gate.drive(false);
        }
        if let Some(gate) = self.gates.get_mut(&CONST_TRUE) {
            gate.drive(true);
        }
        let ids: Vec<_> = self.input_gates().collect();
        for (id, &value) in ids.iter().zip(self.inputs.iter()) {
            if let Some(gate) = self.gates.get_mut(id) {
                gate.drive(value);
            }
        }
    }

    pub fn read_inputs(&self) -> &[bool] {
        &self.inputs
    }

    /// Outputs of the output layer in declaration order.
    pub fn read_outputs(&self) -> Vec<bool> {
        self.output_gates()
            .filter_map(|id| self.gate(id))
            .map(|gate| gate.output)
            .collect()
    }

    /// Evaluates every layer in rank order. Stops at the first gate with a
    /// missing input; gates computed before that keep their new values.
    pub fn simulate(&mut self) -> Result<(), CircuitError> {
        let gates = &mut self.gates;
        for (rank, layer) in self.layers.iter() {
            if *rank == LayerRank::Input {
                continue;
            }
            for id in layer.gates() {
                let mut gate = match gates.remove(&id) {
                    Some(gate) => gate,
                    None => continue,
                };
                let result = gate.calc_output(|source| {
                    gates
                        .get(&source)
                        .map(|source| (source.output, source.inv_output))
                });
                gates.insert(id, gate);
                if let Err(err) = result {
                    debug!(%id, %rank, "simulation aborted");
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    pub fn simulate_with(&mut self, inputs: &[bool]) -> Result<(), CircuitError> {
        self.set_inputs(inputs)?;
        self.simulate()
    }

    /// Runs the circuit on every input combination, counting up from all
    /// zeros, and hands each `(inputs, outputs)` row to `emit`. The previous
    /// input vector is restored afterwards, also when a simulation fails.
    pub fn gen_truth_table_with<F>(&mut self, mut emit: F) -> Result<usize, CircuitError>
    where
        F: FnMut(&[bool], &[bool]),
    {
        let saved = self.inputs.clone();
        let result = self.enumerate(&mut emit);
        let restored = self.set_inputs(&saved);
        let rows = result?;
        restored?;
        Ok(rows)
    }

    fn enumerate<F>(&mut self, emit: &mut F) -> Result<usize, CircuitError>
    where
        F: FnMut(&[bool], &[bool]),
    {
        let mut current = vec![false; self.num_inputs()];
        let mut rows = 0;
        loop {
            self.simulate_with(&current)?;
            emit(&current, &self.read_outputs());
            rows += 1;
            if !increment(&mut current) {
                break;
            }
        }
        Ok(rows)
    }

    pub fn gen_truth_table(&mut self) -> Result<TruthTable, CircuitError> {
        let mut table = TruthTable::default();
        self.gen_truth_table_with(|inputs, outputs| {
            table.rows.push(TruthRow {
                inputs: inputs.to_vec(),
                outputs: outputs.to_vec(),
            })
        })?;
        Ok(table)
    }
}

impl fmt::Display for TruthRow {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} | {}",
            format_bits(&self.inputs),
            format_bits(&self.outputs)
        )
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(formatter, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::gate::GateType;
#[cfg(test)]
use crate::types::{GateId, InputSlot};

#[cfg(test)]
fn inverter() -> Circuit {
    let mut circuit = Circuit::new(1, 1);
    circuit.add_layer(LayerRank::from(1)).unwrap();
    let not = circuit.add_gate(GateType::Not, LayerRank::from(1)).unwrap();
    circuit.add_connection(GateId::new(2), false, not, InputSlot::In0).unwrap();
    circuit.add_connection(not, false, GateId::new(3), InputSlot::In0).unwrap();
    circuit
}

/// Two inputs, outputs `[a & b, a ^ b, !a]`.
#[cfg(test)]
fn half_adder() -> Circuit {
    let mut circuit = Circuit::new(2, 3);
    let (a, b) = (GateId::new(2), GateId::new(3));
    circuit.add_layer(LayerRank::from(10)).unwrap();
    let and = circuit.add_gate(GateType::And, LayerRank::from(10)).unwrap();
    let xor = circuit.add_gate(GateType::Xor, LayerRank::from(10)).unwrap();
    circuit.add_connection(a, false, and, InputSlot::In0).unwrap();
    circuit.add_connection(b, false, and, InputSlot::In1).unwrap();
    circuit.add_connection(a, false, xor, InputSlot::In0).unwrap();
    circuit.add_connection(b, false, xor, InputSlot::In1).unwrap();
    circuit.add_connection(and, false, GateId::new(4), InputSlot::In0).unwrap();
    circuit.add_connection(xor, false, GateId::new(5), InputSlot::In1).unwrap();
    circuit.add_connection(a, true, GateId::new(6), InputSlot::In0).unwrap();
    circuit
}

#[test]
fn test_inverter() {
    let mut circuit = inverter();
    circuit.simulate_with(&[false]).unwrap();
    assert_eq!(circuit.read_outputs(), vec![true]);
    circuit.simulate_with(&[true]).unwrap();
    assert_eq!(circuit.read_outputs(), vec![false]);
    assert_eq!(circuit.read_inputs(), &[true]);
}

#[test]
fn test_fresh_circuit_can_simulate() {
    let mut circuit = inverter();
    circuit.simulate().unwrap();
    assert_eq!(circuit.read_outputs(), vec![true]);
}

#[test]
fn test_set_inputs_length() {
    let mut circuit = inverter();
    assert!(matches!(
        circuit.set_inputs(&[true, false]),
        Err(CircuitError::InputLength {
            expected: 1,
            actual: 2
        })
    ));
}

#[test]
fn test_set_inputs_is_idempotent() {
    let mut circuit = half_adder();
    circuit.simulate_with(&[true, false]).unwrap();
    let first = circuit.read_outputs();
    circuit.set_inputs(&[true, false]).unwrap();
    circuit.set_inputs(&[true, false]).unwrap();
    circuit.simulate().unwrap();
    assert_eq!(circuit.read_outputs(), first);
    assert_eq!(first, vec![false, true, false]);
}

#[test]
fn test_constants() {
    let mut circuit = Circuit::new(0, 2);
    circuit.add_connection(CONST_FALSE, false, GateId::new(2), InputSlot::In0).unwrap();
    circuit.add_connection(CONST_FALSE, true, GateId::new(3), InputSlot::In1).unwrap();
    circuit.set_inputs(&[]).unwrap();
    circuit.simulate().unwrap();
    assert_eq!(circuit.read_outputs(), vec![false, true]);
}

#[test]
fn test_unconnected_output_fails() {
    let mut circuit = Circuit::new(1, 2);
    circuit.add_connection(GateId::new(2), false, GateId::new(3), InputSlot::In0).unwrap();
    assert!(matches!(
        circuit.simulate_with(&[true]),
        Err(CircuitError::UnresolvedInputs(id)) if id == GateId::new(4)
    ));
    // gate 3 was evaluated before the pass stopped
    assert_eq!(circuit.gate(GateId::new(3)).unwrap().status, GateStatus::Updated);
}

#[test]
fn test_truth_table() {
    let mut circuit = half_adder();
    circuit.set_inputs(&[false, true]).unwrap();
    let table = circuit.gen_truth_table().unwrap();
    assert_eq!(
        table.to_string(),
        "00 | 001\n10 | 010\n01 | 011\n11 | 100\n"
    );
    assert_eq!(circuit.read_inputs(), &[false, true]);
}

#[test]
fn test_truth_table_covers_every_pattern() {
    let mut circuit = Circuit::new(4, 1);
    circuit.add_connection(GateId::new(5), false, GateId::new(6), InputSlot::In0).unwrap();
    let table = circuit.gen_truth_table().unwrap();
    assert_eq!(table.rows.len(), 16);
    let mut seen: Vec<String> = table.rows.iter().map(|r| format_bits(&r.inputs)).collect();
    assert_eq!(seen[0], "0000");
    assert_eq!(seen[1], "1000");
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 16);
    assert!(table.rows.iter().all(|r| r.outputs == vec![r.inputs[3]]));
}

#[test]
fn test_truth_table_without_inputs() {
    let mut circuit = Circuit::new(0, 1);
    circuit.add_connection(CONST_TRUE, false, GateId::new(2), InputSlot::In0).unwrap();
    assert_eq!(circuit.gen_truth_table().unwrap().to_string(), " | 1\n");
}

#[test]
fn test_truth_table_failure_restores_inputs() {
    let mut circuit = Circuit::new(2, 1);
    circuit.set_inputs(&[true, true]).unwrap();
    let mut rows = 0;
    let result = circuit.gen_truth_table_with(|_, _| rows += 1);
    assert!(matches!(result, Err(CircuitError::UnresolvedInputs(_))));
    assert_eq!(rows, 0);
    assert_eq!(circuit.read_inputs(), &[true, true]);
}
