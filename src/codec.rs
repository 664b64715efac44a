//! Line oriented save format.
//!
//! ```text
//! I <inputs>
//! O <outputs>
//! L <rank>                        one per logic layer
//! G <id> <type> <rank>            one per logic gate
//! C <source> <0|1> <dest> <0|1>   one per connection
//! ```
//!
//! Records must appear in that order; the type is one of the three character
//! codes of [`GateType::code`].

use crate::circuit::Circuit;
use crate::connection::Connection;
use crate::error::CircuitError;
use crate::gate::GateType;
use crate::types::{GateId, InputSlot, LayerRank};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit1, one_of},
    combinator::{all_consuming, map, map_res, value},
    sequence::{preceded, tuple},
    IResult,
};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Record {
    Inputs(usize),
    Outputs(usize),
    Layer(u64),
    Gate(GateId, GateType, u64),
    Connection(Connection),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Layers,
    Gates,
    Connections,
}

fn number<T: FromStr>(input: &str) -> IResult<&str, T> {
    map_res(digit1, |digits: &str| digits.parse::<T>())(input)
}

fn flag(input: &str) -> IResult<&str, bool> {
    map(one_of("01"), |c| c == '1')(input)
}

fn gate_type(input: &str) -> IResult<&str, GateType> {
    alt((
        value(GateType::Buffer, tag("BUF")),
        value(GateType::Not, tag("NOT")),
        value(GateType::And, tag("AND")),
        value(GateType::Or, tag(" OR")),
        value(GateType::Xor, tag("XOR")),
        value(GateType::Nand, tag("NND")),
        value(GateType::Nor, tag("NOR")),
        value(GateType::Nxor, tag("NXR")),
    ))(input)
}

fn record(input: &str) -> IResult<&str, Record> {
    alt((
        map(preceded(tag("I "), number::<usize>), Record::Inputs),
        map(preceded(tag("O "), number::<usize>), Record::Outputs),
        map(preceded(tag("L "), number::<u64>), Record::Layer),
        map(
            tuple((
                tag("G "),
                number::<usize>,
                tag(" "),
                gate_type,
                tag(" "),
                number::<u64>,
            )),
            |(_, id, _, type_, _, rank)| Record::Gate(GateId::new(id), type_, rank),
        ),
        map(
            tuple((
                tag("C "),
                number::<usize>,
                tag(" "),
                flag,
                tag(" "),
                number::<usize>,
                tag(" "),
                flag,
            )),
            |(_, source, _, invert, _, dest, _, slot)| {
                Record::Connection(Connection {
                    source: GateId::new(source),
                    invert,
                    dest: GateId::new(dest),
                    slot: InputSlot::from(slot),
                })
            },
        ),
    ))(input)
}

fn parse_record(line: usize, text: &str) -> Result<Record, CircuitError> {
    all_consuming(record)(text)
        .map(|(_, record)| record)
        .map_err(|_| CircuitError::MalformedRecord {
            line,
            text: text.to_string(),
        })
}

impl Record {
    fn section(&self) -> Option<Section> {
        match self {
            Record::Inputs(_) | Record::Outputs(_) => None,
            Record::Layer(_) => Some(Section::Layers),
            Record::Gate(..) => Some(Section::Gates),
            Record::Connection(_) => Some(Section::Connections),
        }
    }
}

/// The saved form of a circuit, written through `Display`.
struct Records<'a>(&'a Circuit);

impl<'a> fmt::Display for Records<'a> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let circuit = self.0;
        writeln!(formatter, "I {}", circuit.num_inputs())?;
        writeln!(formatter, "O {}", circuit.num_outputs())?;
        for (rank, _) in circuit.layers() {
            if let LayerRank::Numbered(rank) = rank {
                writeln!(formatter, "L {}", rank)?;
            }
        }
        for (rank, layer) in circuit.layers() {
            if let LayerRank::Numbered(rank) = rank {
                for gate in layer.gates().filter_map(|id| circuit.gate(id)) {
                    writeln!(formatter, "G {} {} {}", gate.id, gate.type_.code(), rank)?;
                }
            }
        }
        for (_, layer) in circuit.layers() {
            for gate in layer.gates().filter_map(|id| circuit.gate(id)) {
                for (slot, source) in gate.sources() {
                    writeln!(
                        formatter,
                        "C {} {} {} {}",
                        source.gate,
                        source.invert as u8,
                        gate.id,
                        slot
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl Circuit {
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", Records(self))
    }

    pub fn to_text(&self) -> String {
        Records(self).to_string()
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CircuitError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| CircuitError::io(path, err))?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)
            .and_then(|_| out.flush())
            .map_err(|err| CircuitError::io(path, err))?;
        debug!("circuit saved");
        Ok(())
    }

    /// Rebuilds a circuit from its saved form by replaying every record
    /// through the regular mutation operations.
    pub fn from_text(text: &str) -> Result<Circuit, CircuitError> {
        let mut lines = text.lines().enumerate().map(|(i, text)| (i + 1, text));
        let num_inputs = match header(lines.next(), 1)? {
            Record::Inputs(n) => n,
            _ => return Err(CircuitError::OutOfOrderRecord { line: 1 }),
        };
        let num_outputs = match header(lines.next(), 2)? {
            Record::Outputs(n) => n,
            _ => return Err(CircuitError::OutOfOrderRecord { line: 2 }),
        };
        let mut circuit = Circuit::try_new(num_inputs, num_outputs)?;
        let mut current = Section::Layers;
        // connections wait until every gate is known
        let mut phantom_connections = Vec::new();
        for (line, text) in lines {
            let record = parse_record(line, text)?;
            match record.section() {
                // connections only after at least one gate
                Some(Section::Connections) if current == Section::Layers => {
                    return Err(CircuitError::OutOfOrderRecord { line })
                }
                Some(section) if section >= current => current = section,
                _ => return Err(CircuitError::OutOfOrderRecord { line }),
            }
            match record {
                Record::Layer(rank) => circuit
                    .add_layer(LayerRank::from(rank))
                    .map_err(|err| err.at_line(line))?,
                Record::Gate(id, type_, rank) => circuit
                    .add_gate_with_id(id, type_, LayerRank::from(rank))
                    .map_err(|err| err.at_line(line))?,
                Record::Connection(connection) => phantom_connections.push((line, connection)),
                Record::Inputs(_) | Record::Outputs(_) => {}
            }
        }
        for (line, c) in phantom_connections {
            circuit
                .add_connection(c.source, c.invert, c.dest, c.slot)
                .map_err(|err| err.at_line(line))?;
        }
        circuit.set_inputs(&vec![false; num_inputs])?;
        Ok(circuit)
    }

    /// Replaces this circuit with the one saved at `path`. On any error the
    /// circuit is left untouched.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CircuitError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| CircuitError::io(path, err))?;
        let loaded = Circuit::from_text(&text)?;
        debug!(
            gates = loaded.gates().count(),
            connections = loaded.connections().len(),
            "circuit loaded"
        );
        *self = loaded;
        Ok(())
    }
}

fn header(next: Option<(usize, &str)>, line: usize) -> Result<Record, CircuitError> {
    match next {
        Some((line, text)) => parse_record(line, text),
        None => Err(CircuitError::MalformedRecord {
            line,
            text: String::new(),
        }),
    }
}

#[cfg(test)]
const SAMPLE: &str = "I 2
O 1
L 1
L 3
G 5 AND 1
G 6  OR 1
G 7 NXR 3
C 2 0 5 0
C 3 1 5 1
C 2 0 6 0
C 1 0 6 1
C 5 0 7 0
C 6 1 7 1
C 7 0 4 0
";

#[test]
fn test_gate_codes() {
    for &type_ in GateType::ALL.iter() {
        assert_eq!(gate_type(type_.code()), Ok(("", type_)));
    }
}

#[test]
fn test_parse_records() {
    assert_eq!(parse_record(1, "I 4").unwrap(), Record::Inputs(4));
    assert_eq!(
        parse_record(1, "G 12  OR 3").unwrap(),
        Record::Gate(GateId::new(12), GateType::Or, 3)
    );
    assert_eq!(
        parse_record(1, "C 2 1 9 0").unwrap(),
        Record::Connection(Connection {
            source: GateId::new(2),
            invert: true,
            dest: GateId::new(9),
            slot: InputSlot::In0,
        })
    );
    for bad in &[
        "",
        "I",
        "I -1",
        "L 1 ",
        "G 5 OR 1",
        "G 5 XNOR 1",
        "C 2 2 9 0",
        "C 2 0 9",
        "# comment",
        "L 99999999999999999999999",
    ] {
        assert!(
            matches!(parse_record(7, bad), Err(CircuitError::MalformedRecord { line: 7, .. })),
            "{:?}",
            bad
        );
    }
}

#[test]
fn test_text_round_trip() {
    let mut circuit = Circuit::from_text(SAMPLE).unwrap();
    assert_eq!(circuit.to_text(), SAMPLE);
    assert_eq!(circuit.next_gate_id(), GateId::new(8));
    assert_eq!(circuit.read_inputs(), &[false, false]);
    // out = (a & !b) xnor !(a | 1)
    let table = circuit.gen_truth_table().unwrap();
    assert_eq!(table.to_string(), "00 | 1\n10 | 0\n01 | 1\n11 | 1\n");
}

#[test]
fn test_connections_need_a_gate_first() {
    let mut circuit = Circuit::from_text(SAMPLE).unwrap();
    let before = circuit.to_text();
    for (text, line) in &[
        ("I 1\nO 1\nL 1\nC 2 0 3 0\n", 4),
        ("I 1\nO 1\nC 2 0 3 0\n", 3),
    ] {
        assert!(matches!(
            Circuit::from_text(text),
            Err(CircuitError::OutOfOrderRecord { line: l }) if l == *line
        ));
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wires.txt");
    std::fs::write(&path, "I 1\nO 1\nL 1\nC 2 0 3 0\n").unwrap();
    assert!(matches!(
        circuit.load(&path),
        Err(CircuitError::OutOfOrderRecord { line: 4 })
    ));
    assert_eq!(circuit.to_text(), before);
}

#[test]
fn test_oversized_header_and_ids() {
    assert!(matches!(
        Circuit::from_text("I 18446744073709551615\nO 1\n"),
        Err(CircuitError::TooManyPins { .. })
    ));
    assert!(matches!(
        Circuit::from_text("I 1\nO 70000\n"),
        Err(CircuitError::TooManyPins { outputs: 70000, .. })
    ));
    match Circuit::from_text("I 1\nO 1\nL 1\nG 18446744073709551615 NOT 1\n") {
        Err(CircuitError::InvalidRecord { line: 4, source }) => {
            assert!(matches!(*source, CircuitError::GateIdOverflow(_)))
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn test_out_of_order_records() {
    for (text, line) in &[
        ("I 1\nO 1\nL 1\nG 4 NOT 1\nC 4 0 3 0\nG 5 NOT 1\n", 6),
        ("I 1\nO 1\nL 1\nG 4 NOT 1\nL 2\n", 5),
        ("O 1\nI 1\n", 1),
        ("I 1\nL 1\n", 2),
        ("I 1\nO 1\nO 1\n", 3),
    ] {
        match Circuit::from_text(text) {
            Err(CircuitError::OutOfOrderRecord { line: l }) => assert_eq!(l, *line, "{:?}", text),
            other => panic!("{:?}: {:?}", text, other),
        }
    }
}

#[test]
fn test_invalid_records() {
    let cases = [
        "I 1\nO 1\nL 1\nL 1\n",
        "I 1\nO 1\nL 0\n",
        "I 1\nO 1\nL 1\nG 4 NOT 2\n",
        "I 1\nO 1\nL 1\nG 2 NOT 1\n",
        "I 1\nO 1\nL 1\nG 4 NOT 1\nG 4 AND 1\n",
        "I 1\nO 1\nL 1\nG 4 NOT 1\nC 4 0 2 0\n",
        "I 1\nO 1\nL 1\nG 4 NOT 1\nC 9 0 3 0\n",
    ];
    for text in &cases {
        assert!(
            matches!(Circuit::from_text(text), Err(CircuitError::InvalidRecord { .. })),
            "{:?}",
            text
        );
    }
    assert!(matches!(
        Circuit::from_text(""),
        Err(CircuitError::MalformedRecord { line: 1, .. })
    ));
    assert!(matches!(
        Circuit::from_text("I 1\n"),
        Err(CircuitError::MalformedRecord { line: 2, .. })
    ));
    assert!(matches!(
        Circuit::from_text("I 1\nO 1\n\nL 1\n"),
        Err(CircuitError::MalformedRecord { line: 3, .. })
    ));
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("circuit.txt");
    let saved = Circuit::from_text(SAMPLE).unwrap();
    saved.save(&path).unwrap();

    let mut circuit = Circuit::new(4, 4);
    circuit.load(&path).unwrap();
    assert_eq!(circuit.num_inputs(), 2);
    assert_eq!(circuit.num_outputs(), 1);
    let mut expected: Vec<_> = saved.connections().iter().copied().collect();
    let mut actual: Vec<_> = circuit.connections().iter().copied().collect();
    expected.sort_by_key(|c| (c.dest, c.slot));
    actual.sort_by_key(|c| (c.dest, c.slot));
    assert_eq!(actual, expected);
    for gate in saved.gates() {
        let loaded = circuit.gate(gate.id).unwrap();
        assert_eq!(loaded.type_, gate.type_);
        assert_eq!(circuit.rank_of(gate.id), saved.rank_of(gate.id));
    }
}

#[test]
fn test_failed_load_leaves_circuit_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(&path, "I 1\nO 1\nL 1\nG 4 NOT 1\nC 4 0 3 0\nG 5 NOT 1\n").unwrap();

    let mut circuit = Circuit::from_text(SAMPLE).unwrap();
    let before = circuit.to_text();
    assert!(matches!(
        circuit.load(&path),
        Err(CircuitError::OutOfOrderRecord { line: 6 })
    ));
    assert_eq!(circuit.to_text(), before);
    assert!(matches!(
        circuit.load(dir.path().join("missing.txt")),
        Err(CircuitError::Io { .. })
    ));
    assert_eq!(circuit.to_text(), before);
}
