use wasm_bindgen::prelude::*;

mod circuit;
mod codec;
mod connection;
pub mod console;
mod error;
mod gate;
mod help;
mod report;
mod simulate;
mod types;

pub use crate::circuit::{Circuit, GateConnectionsOutcome, Layer, CONST_FALSE, CONST_TRUE,
    MAX_PINS,
};
pub use crate::connection::{Connection, ConnectionRegistry};
pub use crate::error::CircuitError;
pub use crate::gate::{Gate, GateStatus, GateType, InputSource};
pub use crate::report::{Listing, Unconnected};
pub use crate::simulate::{format_bits, TruthRow, TruthTable};
pub use crate::types::{GateId, InputSlot, LayerRank};

/// Truth table of a circuit given in its saved text form.
#[wasm_bindgen]
pub fn truth_table(circuit: &str) -> String {
    match Circuit::from_text(circuit).and_then(|mut c| c.gen_truth_table()) {
        Ok(table) => table.to_string(),
        Err(err) => format!("ERR: {}", err),
    }
}

#[test]
fn test_truth_table_entry_point() {
    assert_eq!(
        truth_table("I 1\nO 1\nL 1\nG 4 BUF 1\nC 2 1 4 0\nC 4 0 3 0\n"),
        "0 | 1\n1 | 0\n"
    );
    assert!(truth_table("I 99999999\nO 1\n").starts_with("ERR: "));
    assert_eq!(
        truth_table("I 1\nO 1\n"),
        "ERR: gate 3 has unconnected inputs"
    );
    assert!(truth_table("bogus").starts_with("ERR: line 1"));
}
