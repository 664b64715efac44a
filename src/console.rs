//! Text command front end: one command per line, `OK` or `ERR: ...` in reply.

use crate::circuit::Circuit;
use crate::gate::GateType;
use crate::help;
use crate::simulate::format_bits;
use crate::types::{GateId, InputSlot, LayerRank};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

pub const OK: &str = "OK";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("the command \"{0}\" has not been recognized")]
    Unknown(String),
    #[error("the command \"{command}\" requires {expected}")]
    Arity {
        command: &'static str,
        expected: &'static str,
    },
    #[error("the specified {what} can't be converted to {kind}: {value:?}")]
    BadArgument {
        what: &'static str,
        kind: &'static str,
        value: String,
    },
    #[error("unrecognised gate type {0:?}")]
    BadGateType(String),
    #[error("invalid character found in {0:?}, inputs are written as 0s and 1s")]
    BadBits(String),
    #[error("no help on {0:?}")]
    NoHelp(String),
}

/// Connection between two gates, optionally with the layers the caller
/// expects them in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub source_rank: Option<LayerRank>,
    pub source: GateId,
    pub invert: bool,
    pub dest_rank: Option<LayerRank>,
    pub dest: GateId,
    pub slot: InputSlot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help(Option<String>),
    SetIo { inputs: usize, outputs: usize },
    AddLayer(LayerRank),
    AddGate(GateType, LayerRank),
    AddConnection(Link),
    DeleteLayer(LayerRank),
    DeleteGate(GateId, Option<LayerRank>),
    DeleteConnectionTo(GateId, InputSlot),
    DeleteConnection(Link),
    DeleteInputConnections(GateId, Option<LayerRank>),
    DeleteOutputConnections(GateId, Option<LayerRank>),
    DeleteAllConnections(GateId, Option<LayerRank>),
    Bulk(Vec<Command>),
    SetInputs(Vec<bool>),
    ReadOutputs,
    Simulate(Option<Vec<bool>>),
    TruthTable,
    Print { summary: bool, connections: bool },
    ListUnconnected,
    Save(PathBuf),
    Load(PathBuf),
}

fn uint(arg: &str, what: &'static str) -> Result<usize, CommandError> {
    arg.parse().map_err(|_| CommandError::BadArgument {
        what,
        kind: "uint",
        value: arg.to_string(),
    })
}

fn gate_id(arg: &str, what: &'static str) -> Result<GateId, CommandError> {
    uint(arg, what).map(GateId::new)
}

fn rank(arg: &str, what: &'static str) -> Result<LayerRank, CommandError> {
    arg.parse().map_err(|_| CommandError::BadArgument {
        what,
        kind: "a layer",
        value: arg.to_string(),
    })
}

/// Any integer, non-zero meaning true.
fn flag(arg: &str, what: &'static str) -> Result<bool, CommandError> {
    arg.parse::<i64>()
        .map(|x| x != 0)
        .map_err(|_| CommandError::BadArgument {
            what,
            kind: "int and then to bool",
            value: arg.to_string(),
        })
}

fn slot(arg: &str) -> Result<InputSlot, CommandError> {
    flag(arg, "num_input").map(InputSlot::from)
}

fn bits(arg: &str) -> Result<Vec<bool>, CommandError> {
    arg.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(CommandError::BadBits(arg.to_string())),
        })
        .collect()
}

fn gate_type(arg: &str) -> Result<GateType, CommandError> {
    GateType::from_name(arg).ok_or_else(|| CommandError::BadGateType(arg.to_string()))
}

fn optional_rank(args: &[&str], idx: usize) -> Result<Option<LayerRank>, CommandError> {
    match args.get(idx) {
        Some(arg) => rank(arg, "layer").map(Some),
        None => Ok(None),
    }
}

fn gate_and_rank(
    args: &[&str],
    command: &'static str,
) -> Result<(GateId, Option<LayerRank>), CommandError> {
    match args.len() {
        1 | 2 => Ok((gate_id(args[0], "gate uid")?, optional_rank(args, 1)?)),
        _ => Err(CommandError::Arity {
            command,
            expected: "1 or 2 arguments",
        }),
    }
}

fn plain_link(source: &str, invert: bool, dest: &str, input: &str) -> Result<Link, CommandError> {
    Ok(Link {
        source_rank: None,
        source: gate_id(source, "gate_out_uid")?,
        invert,
        dest_rank: None,
        dest: gate_id(dest, "gate_in_uid")?,
        slot: slot(input)?,
    })
}

fn ranked_link(
    source_rank: &str,
    source: &str,
    invert: bool,
    dest_rank: &str,
    dest: &str,
    input: &str,
) -> Result<Link, CommandError> {
    Ok(Link {
        source_rank: Some(rank(source_rank, "num_layer_out")?),
        source: gate_id(source, "gate_out_uid")?,
        invert,
        dest_rank: Some(rank(dest_rank, "num_layer_in")?),
        dest: gate_id(dest, "gate_in_uid")?,
        slot: slot(input)?,
    })
}

fn link(args: &[&str]) -> Result<Link, CommandError> {
    match *args {
        [source, dest, input] => plain_link(source, false, dest, input),
        [source, invert, dest, input] => {
            plain_link(source, flag(invert, "take_inv_output")?, dest, input)
        }
        [source_rank, source, dest_rank, dest, input] => {
            ranked_link(source_rank, source, false, dest_rank, dest, input)
        }
        [source_rank, source, invert, dest_rank, dest, input] => ranked_link(
            source_rank,
            source,
            flag(invert, "take_inv_output")?,
            dest_rank,
            dest,
            input,
        ),
        _ => Err(CommandError::Arity {
            command: "ac",
            expected: "3, 4, 5 or 6 arguments",
        }),
    }
}

fn unlink(args: &[&str]) -> Result<Command, CommandError> {
    match *args {
        [dest, input] => Ok(Command::DeleteConnectionTo(
            gate_id(dest, "gate_in_uid")?,
            slot(input)?,
        )),
        [source, dest, input] => plain_link(source, false, dest, input).map(Command::DeleteConnection),
        [source, invert, dest, input] => {
            plain_link(source, flag(invert, "take_inv_output")?, dest, input)
                .map(Command::DeleteConnection)
        }
        [source_rank, source, invert, dest_rank, dest, input] => ranked_link(
            source_rank,
            source,
            flag(invert, "take_inv_output")?,
            dest_rank,
            dest,
            input,
        )
        .map(Command::DeleteConnection),
        _ => Err(CommandError::Arity {
            command: "dc",
            expected: "2, 3, 4 or 6 arguments",
        }),
    }
}

/// Splits `args` in groups of `size` and parses each group as one command.
fn bulk<F>(
    args: &[&str],
    size: usize,
    command: &'static str,
    expected: &'static str,
    parse: F,
) -> Result<Command, CommandError>
where
    F: Fn(&[&str]) -> Result<Command, CommandError>,
{
    if args.is_empty() || args.len() % size != 0 {
        return Err(CommandError::Arity { command, expected });
    }
    args.chunks(size)
        .map(parse)
        .collect::<Result<Vec<_>, _>>()
        .map(Command::Bulk)
}

fn exactly<'a>(
    args: &[&'a str],
    n: usize,
    command: &'static str,
    expected: &'static str,
) -> Result<Vec<&'a str>, CommandError> {
    if args.len() == n {
        Ok(args.to_vec())
    } else {
        Err(CommandError::Arity { command, expected })
    }
}

impl Command {
    /// Parses one console line. Blank lines give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = match tokens.split_first() {
            Some((name, args)) => (*name, args),
            None => return Ok(None),
        };
        let command = match name {
            "help" | "h" => match args {
                [] => Command::Help(None),
                [topic] => Command::Help(Some(topic.to_string())),
                _ => {
                    return Err(CommandError::Arity {
                        command: "help",
                        expected: "0 or 1 argument",
                    })
                }
            },
            "nio" => {
                let args = exactly(args, 2, "nio", "2 arguments")?;
                Command::SetIo {
                    inputs: uint(args[0], "number of inputs")?,
                    outputs: uint(args[1], "number of outputs")?,
                }
            }
            "al" => Command::AddLayer(rank(exactly(args, 1, "al", "1 argument")?[0], "layer")?),
            "ag" => {
                let args = exactly(args, 2, "ag", "2 arguments")?;
                Command::AddGate(gate_type(args[0])?, rank(args[1], "layer")?)
            }
            "ac" => Command::AddConnection(link(args)?),
            "dl" => Command::DeleteLayer(rank(exactly(args, 1, "dl", "1 argument")?[0], "layer")?),
            "dg" => {
                let (id, rank) = gate_and_rank(args, "dg")?;
                Command::DeleteGate(id, rank)
            }
            "dc" => unlink(args)?,
            "dgci" | "dcgi" => {
                let (id, rank) = gate_and_rank(args, "dgci")?;
                Command::DeleteInputConnections(id, rank)
            }
            "dgco" | "dcgo" => {
                let (id, rank) = gate_and_rank(args, "dgco")?;
                Command::DeleteOutputConnections(id, rank)
            }
            "dgca" | "dcga" => {
                let (id, rank) = gate_and_rank(args, "dgca")?;
                Command::DeleteAllConnections(id, rank)
            }
            "bal" => bulk(args, 1, "bal", "at least 1 argument", |a| {
                rank(a[0], "layer").map(Command::AddLayer)
            })?,
            "bag" => bulk(args, 2, "bag", "pairs of <type> <layer>", |a| {
                Ok(Command::AddGate(gate_type(a[0])?, rank(a[1], "layer")?))
            })?,
            "bac" => bulk(args, 4, "bac", "groups of 4 arguments", |a| {
                link(a).map(Command::AddConnection)
            })?,
            "bdl" => bulk(args, 1, "bdl", "at least 1 argument", |a| {
                rank(a[0], "layer").map(Command::DeleteLayer)
            })?,
            "bdg" => bulk(args, 1, "bdg", "at least 1 argument", |a| {
                Ok(Command::DeleteGate(gate_id(a[0], "gate uid")?, None))
            })?,
            "bdc" => bulk(args, 2, "bdc", "pairs of <in_gate> <input>", unlink)?,
            "si" => Command::SetInputs(bits(exactly(args, 1, "si", "1 argument")?[0])?),
            "ro" => {
                exactly(args, 0, "ro", "no arguments")?;
                Command::ReadOutputs
            }
            "sc" => match args {
                [] => Command::Simulate(None),
                [inputs] => Command::Simulate(Some(bits(inputs)?)),
                _ => {
                    return Err(CommandError::Arity {
                        command: "sc",
                        expected: "0 or 1 argument",
                    })
                }
            },
            "gtt" => {
                exactly(args, 0, "gtt", "no arguments")?;
                Command::TruthTable
            }
            "pc" => match args {
                [] => Command::Print {
                    summary: true,
                    connections: true,
                },
                [summary] => Command::Print {
                    summary: flag(summary, "flag for printing the summary")?,
                    connections: true,
                },
                [summary, connections] => Command::Print {
                    summary: flag(summary, "flag for printing the summary")?,
                    connections: flag(connections, "flag for printing connections")?,
                },
                _ => {
                    return Err(CommandError::Arity {
                        command: "pc",
                        expected: "0, 1 or 2 arguments",
                    })
                }
            },
            "lu" => {
                exactly(args, 0, "lu", "no arguments")?;
                Command::ListUnconnected
            }
            "vc" => Command::Save(PathBuf::from(exactly(args, 1, "vc", "1 argument")?[0])),
            "lc" => Command::Load(PathBuf::from(exactly(args, 1, "lc", "1 argument")?[0])),
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(Some(command))
    }
}

/// Owns the circuit being edited and writes replies to `out`.
pub struct Console<W: Write> {
    circuit: Circuit,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(circuit: Circuit, out: W) -> Console<W> {
        Console { circuit, out }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn into_inner(self) -> (Circuit, W) {
        (self.circuit, self.out)
    }

    pub fn execute_line(&mut self, line: &str) -> io::Result<()> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(()),
            Err(err) => writeln!(self.out, "ERR: {}", err),
        }
    }

    fn reply<T, E: std::fmt::Display>(&mut self, result: Result<T, E>) -> io::Result<()> {
        match result {
            Ok(_) => writeln!(self.out, "{}", OK),
            Err(err) => writeln!(self.out, "ERR: {}", err),
        }
    }

    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        debug!(?command, "executing");
        let circuit = &mut self.circuit;
        match command {
            Command::Help(None) => writeln!(self.out, "{}", help::GENERAL),
            Command::Help(Some(topic)) => match help::topic(&topic) {
                Some(text) => writeln!(self.out, "{}", text),
                None => writeln!(self.out, "ERR: {}", CommandError::NoHelp(topic)),
            },
            Command::SetIo { inputs, outputs } => {
                let result = circuit.set_io(inputs, outputs);
                self.reply(result)
            }
            Command::AddLayer(rank) => {
                let result = circuit.add_layer(rank);
                self.reply(result)
            }
            Command::AddGate(type_, rank) => match circuit.add_gate(type_, rank) {
                Ok(id) => writeln!(self.out, "{} (gate {})", OK, id),
                Err(err) => writeln!(self.out, "ERR: {}", err),
            },
            Command::AddConnection(link) => {
                let result = match (link.source_rank, link.dest_rank) {
                    (Some(source_rank), Some(dest_rank)) => circuit.add_connection_in_layers(
                        source_rank,
                        link.source,
                        link.invert,
                        dest_rank,
                        link.dest,
                        link.slot,
                    ),
                    _ => circuit.add_connection(link.source, link.invert, link.dest, link.slot),
                };
                self.reply(result)
            }
            Command::DeleteLayer(rank) => {
                let result = circuit.delete_layer(rank);
                self.reply(result)
            }
            Command::DeleteGate(id, rank) => {
                let result = circuit.delete_gate(id, rank);
                self.reply(result)
            }
            Command::DeleteConnectionTo(dest, slot) => {
                let result = circuit.delete_connection_to(dest, slot);
                self.reply(result)
            }
            Command::DeleteConnection(link) => {
                let result = match (link.source_rank, link.dest_rank) {
                    (Some(source_rank), Some(dest_rank)) => circuit.delete_connection_in_layers(
                        source_rank,
                        link.source,
                        link.invert,
                        dest_rank,
                        link.dest,
                        link.slot,
                    ),
                    _ => circuit.delete_connection(link.source, link.invert, link.dest, link.slot),
                };
                self.reply(result)
            }
            Command::DeleteInputConnections(id, rank) => {
                let result = circuit.delete_connections_to_gate_inputs(id, rank);
                self.reply(result)
            }
            Command::DeleteOutputConnections(id, rank) => {
                let result = circuit.delete_connections_from_gate_outputs(id, rank);
                self.reply(result)
            }
            Command::DeleteAllConnections(id, rank) => {
                let outcome = circuit.delete_connections_of_gate(id, rank);
                if outcome.is_ok() {
                    return writeln!(self.out, "{}", OK);
                }
                if let Err(err) = &outcome.inputs {
                    writeln!(self.out, "ERR: inputs: {}", err)?;
                }
                if let Err(err) = &outcome.outputs {
                    writeln!(self.out, "ERR: outputs: {}", err)?;
                }
                Ok(())
            }
            Command::Bulk(commands) => {
                for command in commands {
                    self.execute(command)?;
                }
                Ok(())
            }
            Command::SetInputs(inputs) => {
                let result = circuit.set_inputs(&inputs);
                self.reply(result)
            }
            Command::ReadOutputs => {
                let outputs = circuit.read_outputs();
                writeln!(self.out, "{}", format_bits(&outputs))?;
                writeln!(self.out, "{}", OK)
            }
            Command::Simulate(inputs) => {
                let result = match inputs {
                    Some(inputs) => circuit.simulate_with(&inputs),
                    None => circuit.simulate(),
                };
                self.reply(result)
            }
            Command::TruthTable => {
                let out = &mut self.out;
                let mut written = Ok(());
                let result = circuit.gen_truth_table_with(|inputs, outputs| {
                    if written.is_ok() {
                        written = writeln!(
                            out,
                            "{} | {}",
                            format_bits(inputs),
                            format_bits(outputs)
                        );
                    }
                });
                written?;
                self.reply(result)
            }
            Command::Print {
                summary,
                connections,
            } => {
                write!(self.out, "{}", circuit.listing(summary, connections))?;
                writeln!(self.out, "{}", OK)
            }
            Command::ListUnconnected => {
                write!(self.out, "{}", circuit.unconnected())?;
                writeln!(self.out, "{}", OK)
            }
            Command::Save(path) => {
                let result = circuit.save(&path);
                self.reply(result)
            }
            Command::Load(path) => {
                let result = circuit.load(&path);
                self.reply(result)
            }
        }
    }
}

#[cfg(test)]
fn run(console: &mut Console<Vec<u8>>, lines: &[&str]) -> String {
    let start = console.out.len();
    for line in lines {
        console.execute_line(line).unwrap();
    }
    String::from_utf8(console.out[start..].to_vec()).unwrap()
}

#[test]
fn test_parse_errors_dont_touch_circuit() {
    let mut console = Console::new(Circuit::new(1, 1), Vec::new());
    let out = run(
        &mut console,
        &[
            "frob",
            "al",
            "al x",
            "ag mux 1",
            "ac 1 2",
            "si 012",
            "dc 1 2 3 4 5",
            "help xyz",
            "nio 100000000 1",
        ],
    );
    assert_eq!(out.lines().count(), 9);
    assert_eq!(console.circuit().num_inputs(), 1);
    assert!(out.lines().all(|l| l.starts_with("ERR: ")), "{}", out);
    assert_eq!(console.circuit().layers().count(), 2);
    assert!(out.starts_with("ERR: the command \"frob\" has not been recognized"));
}

#[test]
fn test_build_and_simulate_inverter() {
    let mut console = Console::new(Circuit::new(4, 4), Vec::new());
    let out = run(
        &mut console,
        &["nio 1 1", "al 1", "ag not 1", "ac 2 4 0", "ac 4 3 0", "sc 0", "ro", "sc 1", "ro"],
    );
    assert_eq!(
        out,
        "OK\nOK\nOK (gate 4)\nOK\nOK\nOK\n1\nOK\nOK\n0\nOK\n"
    );
}

#[test]
fn test_connections_with_layers() {
    let mut console = Console::new(Circuit::new(1, 1), Vec::new());
    let out = run(
        &mut console,
        &[
            "al 5",
            "ag buf 5",
            "ac in 2 1 5 4 1",
            "ac 5 4 out 3 0",
            "ac 5 4 out 2 0",
            "dc in 2 0 5 4 1",
            "dc in 2 1 5 4 1",
            "lu",
        ],
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[..4], ["OK", "OK (gate 4)", "OK", "OK"]);
    assert!(lines[4].starts_with("ERR: gate 2 is in layer in"), "{}", lines[4]);
    assert_eq!(lines[5], "OK");
    assert_eq!(lines[6], "OK");
    assert_eq!(console.circuit().connections().len(), 1);
    assert!(out.contains("Layer 5:\n    BUF (4)\n"));
}

#[test]
fn test_bulk_commands() {
    let mut console = Console::new(Circuit::new(2, 1), Vec::new());
    let out = run(
        &mut console,
        &[
            "bal 1 2",
            "bag and 1 nor 2",
            "bac 2 0 5 0 3 1 5 1 5 0 6 0 1 0 6 1 6 0 4 0",
            "gtt",
            "bdc 6 0 6 1",
            "bdg 5",
            "bdl 2 9",
            "bag and",
        ],
    );
    assert_eq!(
        out,
        "OK
OK
OK (gate 5)
OK (gate 6)
OK
OK
OK
OK
OK
00 | 0
10 | 0
01 | 0
11 | 0
OK
OK
OK
OK
OK
ERR: layer 9 is not present in the circuit
ERR: the command \"bag\" requires pairs of <type> <layer>
"
    );
}

#[test]
fn test_gate_disconnect_spellings() {
    for (a, b) in &[("dgci 4", "dcgi 4"), ("dgco 4 1", "dcgo 4 1"), ("dgca 4", "dcga 4")] {
        assert_eq!(Command::parse(a).unwrap(), Command::parse(b).unwrap());
    }
    assert_eq!(
        Command::parse("dcgo 4 1").unwrap(),
        Some(Command::DeleteOutputConnections(
            GateId::new(4),
            Some(LayerRank::from(1))
        ))
    );
}

#[test]
fn test_delete_all_connections_reports_both_halves() {
    let mut console = Console::new(Circuit::new(1, 1), Vec::new());
    let out = run(&mut console, &["dgca 9", "dgca 2", "dcga 2 out"]);
    assert_eq!(
        out,
        "ERR: inputs: gate 9 is not present in the circuit
ERR: outputs: gate 9 is not present in the circuit
OK
ERR: inputs: gate 2 is in layer in, not in layer out
ERR: outputs: gate 2 is in layer in, not in layer out
"
    );
}

#[test]
fn test_save_and_load_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c.txt");
    let mut console = Console::new(Circuit::new(1, 1), Vec::new());
    let save = format!("vc {}", path.display());
    let load = format!("lc {}", path.display());
    let out = run(
        &mut console,
        &["al 3", "ag nand 3", save.as_str(), "nio 2 2", load.as_str(), "pc 0 0"],
    );
    assert!(out.starts_with("OK\nOK (gate 4)\nOK\nOK\nOK\n"), "{}", out);
    assert!(out.contains("Layer 3:\n    NND (4)\n"));
    assert_eq!(console.circuit().num_inputs(), 1);
}
