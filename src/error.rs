use crate::types::{GateId, LayerRank};
use std::io;
use std::path::PathBuf;

/// Failure of a circuit operation. None of these leave a dangling reference
/// behind; the circuit is either unchanged or in the state the message names.
#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    #[error("gate {0} is not present in the circuit")]
    GateNotFound(GateId),
    #[error("layer {0} is not present in the circuit")]
    LayerNotFound(LayerRank),
    #[error("layer {0} already exists")]
    LayerExists(LayerRank),
    #[error("gate {0} already exists")]
    DuplicateGate(GateId),
    #[error("the {0} layer is reserved")]
    ReservedLayer(LayerRank),
    #[error("only forward connections are allowed: gate {source_gate} (layer {source_rank}) -> gate {dest_gate} (layer {dest_rank})")]
    DirectionViolation {
        source_gate: GateId,
        source_rank: LayerRank,
        dest_gate: GateId,
        dest_rank: LayerRank,
    },
    #[error("gate {gate} is in layer {actual}, not in layer {stated}")]
    LayerMismatch {
        gate: GateId,
        stated: LayerRank,
        actual: LayerRank,
    },
    #[error("layer {rank} still holds {remaining} gate(s)")]
    NotEmpty { rank: LayerRank, remaining: usize },
    #[error("gate {0} has unconnected inputs")]
    UnresolvedInputs(GateId),
    #[error("no gate ids are left after {0}")]
    GateIdOverflow(GateId),
    #[error("{inputs} inputs and {outputs} outputs requested, at most {max} of each are supported")]
    TooManyPins {
        inputs: usize,
        outputs: usize,
        max: usize,
    },
    #[error("expected {expected} input bits, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[error("line {line}: unrecognised record {text:?}")]
    MalformedRecord { line: usize, text: String },
    #[error("line {line}: record out of order, records must go I, O, Ls, Gs and then Cs")]
    OutOfOrderRecord { line: usize },
    #[error("line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: Box<CircuitError>,
    },
    #[error("can't open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CircuitError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> CircuitError {
        CircuitError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn at_line(self, line: usize) -> CircuitError {
        CircuitError::InvalidRecord {
            line,
            source: Box::new(self),
        }
    }
}
