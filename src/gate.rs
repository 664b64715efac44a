use crate::error::CircuitError;
use crate::types::{GateId, InputSlot};
use std::fmt;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GateType {
    Buffer,
    Not,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Nxor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateStatus {
    ToUpdate,
    Updated,
}

/// Where a gate input is driven from: the normal or inverted output of
/// another gate, addressed by id.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct InputSource {
    pub gate: GateId,
    pub invert: bool,
}

#[derive(Clone, Debug)]
pub struct Gate {
    pub id: GateId,
    pub type_: GateType,
    pub status: GateStatus,
    pub input_0: bool,
    pub input_1: bool,
    pub output: bool,
    pub inv_output: bool,
    sources: [Option<InputSource>; 2],
}

impl GateType {
    pub const ALL: [GateType; 8] = [
        GateType::Buffer,
        GateType::Not,
        GateType::And,
        GateType::Or,
        GateType::Xor,
        GateType::Nand,
        GateType::Nor,
        GateType::Nxor,
    ];

    /// Three character code used by the save format and the circuit listing.
    pub fn code(&self) -> &'static str {
        match self {
            GateType::Buffer => "BUF",
            GateType::Not => "NOT",
            GateType::And => "AND",
            GateType::Or => " OR",
            GateType::Xor => "XOR",
            GateType::Nand => "NND",
            GateType::Nor => "NOR",
            GateType::Nxor => "NXR",
        }
    }

    /// Buffers and inverters work with any one input connected, the rest need both.
    pub fn is_unary(&self) -> bool {
        match self {
            GateType::Buffer | GateType::Not => true,
            _ => false,
        }
    }

    /// Case insensitive name as typed on the console.
    pub fn from_name(name: &str) -> Option<GateType> {
        match name.to_ascii_lowercase().as_str() {
            "buf" => Some(GateType::Buffer),
            "not" => Some(GateType::Not),
            "and" => Some(GateType::And),
            "or" => Some(GateType::Or),
            "xor" | "exor" => Some(GateType::Xor),
            "nand" => Some(GateType::Nand),
            "nor" => Some(GateType::Nor),
            "nxor" | "nexor" => Some(GateType::Nxor),
            _ => None,
        }
    }

    fn eval(&self, in0: Option<bool>, in1: Option<bool>) -> bool {
        let a = in0.unwrap_or(false);
        let b = in1.unwrap_or(false);
        match self {
            GateType::Buffer => a || b,
            GateType::Not => !(a || b),
            GateType::And => a && b,
            GateType::Or => a || b,
            GateType::Xor => a ^ b,
            GateType::Nand => !(a && b),
            GateType::Nor => !(a || b),
            GateType::Nxor => !(a ^ b),
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

impl Gate {
    pub fn new(id: GateId, type_: GateType) -> Gate {
        Gate {
            id,
            type_,
            status: GateStatus::ToUpdate,
            input_0: false,
            input_1: false,
            output: false,
            inv_output: true,
            sources: [None, None],
        }
    }

    pub fn source(&self, slot: InputSlot) -> Option<InputSource> {
        self.sources[slot.index()]
    }

    pub fn sources(&self) -> impl Iterator<Item = (InputSlot, InputSource)> + '_ {
        InputSlot::BOTH
            .iter()
            .filter_map(move |&slot| self.source(slot).map(|source| (slot, source)))
    }

    pub(crate) fn set_source(&mut self, slot: InputSlot, source: Option<InputSource>) {
        self.sources[slot.index()] = source;
    }

    /// Slots that must be connected before the gate can be evaluated.
    pub fn missing_inputs(&self) -> Vec<InputSlot> {
        let in0 = self.sources[0].is_none();
        let in1 = self.sources[1].is_none();
        if self.type_.is_unary() {
            if in0 && in1 {
                vec![InputSlot::In0, InputSlot::In1]
            } else {
                Vec::new()
            }
        } else {
            let mut missing = Vec::new();
            if in0 {
                missing.push(InputSlot::In0);
            }
            if in1 {
                missing.push(InputSlot::In1);
            }
            missing
        }
    }

    /// Forces the output, used for the constant and input buffers.
    pub(crate) fn drive(&mut self, value: bool) {
        self.output = value;
        self.inv_output = !value;
        self.status = GateStatus::Updated;
    }

    /// Recomputes the output from the sources. `sample` looks up the current
    /// `(output, inv_output)` pair of a source gate.
    pub fn calc_output<F>(&mut self, sample: F) -> Result<(), CircuitError>
    where
        F: Fn(GateId) -> Option<(bool, bool)>,
    {
        if self.status == GateStatus::Updated {
            return Ok(());
        }
        if !self.missing_inputs().is_empty() {
            return Err(CircuitError::UnresolvedInputs(self.id));
        }
        let mut sampled = [None, None];
        for (slot, source) in self.sources() {
            let (output, inv_output) =
                sample(source.gate).ok_or(CircuitError::UnresolvedInputs(self.id))?;
            sampled[slot.index()] = Some(if source.invert { inv_output } else { output });
        }
        if let Some(x) = sampled[0] {
            self.input_0 = x;
        }
        if let Some(x) = sampled[1] {
            self.input_1 = x;
        }
        self.output = self.type_.eval(sampled[0], sampled[1]);
        self.inv_output = !self.output;
        self.status = GateStatus::Updated;
        Ok(())
    }
}

#[cfg(test)]
fn gate_with(type_: GateType, in0: Option<InputSource>, in1: Option<InputSource>) -> Gate {
    let mut gate = Gate::new(GateId::new(10), type_);
    gate.set_source(InputSlot::In0, in0);
    gate.set_source(InputSlot::In1, in1);
    gate
}

#[cfg(test)]
fn constant_sample(id: GateId) -> Option<(bool, bool)> {
    // gate 0 is false, gate 1 is true
    match id.index() {
        0 => Some((false, true)),
        1 => Some((true, false)),
        _ => None,
    }
}

#[cfg(test)]
fn src(value: bool) -> Option<InputSource> {
    Some(InputSource {
        gate: GateId::new(if value { 1 } else { 0 }),
        invert: false,
    })
}

#[cfg(test)]
#[rstest::rstest]
#[case(GateType::And, [false, false, false, true])]
#[case(GateType::Or, [false, true, true, true])]
#[case(GateType::Xor, [false, true, true, false])]
#[case(GateType::Nand, [true, true, true, false])]
#[case(GateType::Nor, [true, false, false, false])]
#[case(GateType::Nxor, [true, false, false, true])]
fn test_binary_gate(#[case] type_: GateType, #[case] expected: [bool; 4]) {
    for (i, &want) in expected.iter().enumerate() {
        let a = i & 2 != 0;
        let b = i & 1 != 0;
        let mut gate = gate_with(type_, src(a), src(b));
        gate.calc_output(constant_sample).unwrap();
        assert_eq!(gate.output, want, "{} {} {}", type_, a, b);
        assert_eq!(gate.inv_output, !want);
        assert_eq!(gate.status, GateStatus::Updated);
        assert_eq!((gate.input_0, gate.input_1), (a, b));
    }
}

#[cfg(test)]
#[rstest::rstest]
#[case(GateType::Buffer, src(true), None, true)]
#[case(GateType::Buffer, None, src(true), true)]
#[case(GateType::Buffer, src(false), src(true), true)]
#[case(GateType::Buffer, src(false), None, false)]
#[case(GateType::Not, src(true), None, false)]
#[case(GateType::Not, None, src(false), true)]
#[case(GateType::Not, src(false), src(true), false)]
fn test_unary_gate(
    #[case] type_: GateType,
    #[case] in0: Option<InputSource>,
    #[case] in1: Option<InputSource>,
    #[case] expected: bool,
) {
    let mut gate = gate_with(type_, in0, in1);
    gate.calc_output(constant_sample).unwrap();
    assert_eq!(gate.output, expected);
}

#[test]
fn test_inverted_source() {
    let inverted = Some(InputSource {
        gate: GateId::new(1),
        invert: true,
    });
    let mut gate = gate_with(GateType::Buffer, inverted, None);
    gate.calc_output(constant_sample).unwrap();
    assert!(!gate.output);
    assert!(gate.inv_output);
}

#[test]
fn test_unresolved_inputs() {
    let mut gate = gate_with(GateType::Not, None, None);
    assert!(matches!(
        gate.calc_output(constant_sample),
        Err(CircuitError::UnresolvedInputs(_))
    ));
    let mut gate = gate_with(GateType::And, src(true), None);
    assert!(matches!(
        gate.calc_output(constant_sample),
        Err(CircuitError::UnresolvedInputs(_))
    ));
    assert_eq!(gate.missing_inputs(), vec![InputSlot::In1]);
    assert_eq!(gate.status, GateStatus::ToUpdate);
}

#[test]
fn test_updated_gate_is_not_recomputed() {
    let mut gate = gate_with(GateType::And, src(true), src(true));
    gate.drive(false);
    gate.calc_output(constant_sample).unwrap();
    assert!(!gate.output);
}

#[test]
fn test_gate_type_names() {
    assert_eq!(GateType::from_name("NAND"), Some(GateType::Nand));
    assert_eq!(GateType::from_name("exor"), Some(GateType::Xor));
    assert_eq!(GateType::from_name("nexor"), Some(GateType::Nxor));
    assert_eq!(GateType::from_name("mux"), None);
    assert_eq!(GateType::Or.code(), " OR");
}
