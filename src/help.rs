pub const GENERAL: &str = "\
Commands (type \"help <command>\" for details, \"help gate\" or \"help circuit\" for background):
  nio   set number of inputs and outputs (resets the circuit)
  al    add layer                     bal  add layers
  ag    add gate                      bag  add gates
  ac    add connection                bac  add connections
  dl    delete layer                  bdl  delete layers
  dg    delete gate                   bdg  delete gates
  dc    delete connection             bdc  delete connections
  dgci  delete connections to the inputs of a gate (also dcgi)
  dgco  delete connections from the output of a gate (also dcgo)
  dgca  delete all connections of a gate (also dcga)
  si    set inputs
  ro    read outputs
  sc    simulate circuit
  gtt   generate truth table
  pc    print circuit
  lu    list unconnected gates
  vc    save circuit to file
  lc    load circuit from file
  exit, quit, q  leave";

const TOPICS: &[(&str, &str)] = &[
    (
        "nio",
        "nio <inputs> <outputs>\n  Discards the circuit and creates an empty one with the given interface.",
    ),
    (
        "al",
        "al <layer>\n  Adds an empty logic layer. Layer 0 is the input layer and can't be added.",
    ),
    (
        "ag",
        "ag <type> <layer>\n  Adds a gate to a logic layer. Types: buf, not, and, or, xor (exor), nand, nor, nxor (nexor).",
    ),
    (
        "ac",
        "ac <out_gate> <in_gate> <input>\nac <out_gate> <inverted> <in_gate> <input>\nac <out_layer> <out_gate> <in_layer> <in_gate> <input>\nac <out_layer> <out_gate> <inverted> <in_layer> <in_gate> <input>\n  Connects the output of a gate to input 0 or 1 of a gate in a later layer.\n  Layers are numbers, or \"in\" and \"out\" for the input and output layers.",
    ),
    (
        "dl",
        "dl <layer>\n  Deletes a logic layer, its gates and all their connections.",
    ),
    (
        "dg",
        "dg <gate> [layer]\n  Deletes a logic gate and all of its connections.",
    ),
    (
        "dc",
        "dc <in_gate> <input>\ndc <out_gate> <in_gate> <input>\ndc <out_gate> <inverted> <in_gate> <input>\ndc <out_layer> <out_gate> <inverted> <in_layer> <in_gate> <input>\n  Deletes a connection. Deleting a missing connection is not an error.",
    ),
    (
        "dgci",
        "dgci <gate> [layer]\n  Disconnects both inputs of a gate.",
    ),
    (
        "dgco",
        "dgco <gate> [layer]\n  Disconnects every input driven by the gate.",
    ),
    (
        "dgca",
        "dgca <gate> [layer]\n  Same as dgci followed by dgco.",
    ),
    ("bal", "bal <layer>...\n  Runs \"al\" for every argument."),
    (
        "bag",
        "bag <type> <layer> [<type> <layer>]...\n  Runs \"ag\" for every pair of arguments.",
    ),
    (
        "bac",
        "bac <out_gate> <inverted> <in_gate> <input> ...\n  Runs \"ac\" for every group of four arguments.",
    ),
    ("bdl", "bdl <layer>...\n  Runs \"dl\" for every argument."),
    ("bdg", "bdg <gate>...\n  Runs \"dg\" for every argument."),
    (
        "bdc",
        "bdc <in_gate> <input> [<in_gate> <input>]...\n  Runs \"dc\" for every pair of arguments.",
    ),
    (
        "si",
        "si <bits>\n  Sets the inputs, e.g. \"si 0110\". The first bit drives gate 2.",
    ),
    ("ro", "ro\n  Prints the outputs of the last simulation."),
    (
        "sc",
        "sc [bits]\n  Simulates the circuit, optionally setting the inputs first.",
    ),
    (
        "gtt",
        "gtt\n  Prints the outputs for every combination of inputs. The current inputs are kept.",
    ),
    (
        "pc",
        "pc [summary] [connections]\n  Prints layers and gates. Both flags default to 1.",
    ),
    ("lu", "lu\n  Lists gates with unconnected inputs."),
    ("vc", "vc <file>\n  Saves the circuit to a file."),
    (
        "lc",
        "lc <file>\n  Loads a circuit from a file. The current circuit is kept if loading fails.",
    ),
    (
        "gate",
        "A gate has two inputs and an output that is available both as is and inverted.\nbuf and not work with either input connected (both connected are or-ed), the\nother types need both inputs.",
    ),
    (
        "circuit",
        "The input layer holds gate 0 (constant 0), gate 1 (constant 1) and one buffer per\ninput. The output layer holds one buffer per output. Logic layers sit in between\nand are evaluated in ascending order, so connections only go to later layers.",
    ),
];

pub fn topic(name: &str) -> Option<&'static str> {
    let name = match name {
        "dcgi" => "dgci",
        "dcgo" => "dgco",
        "dcga" => "dgca",
        other => other,
    };
    TOPICS
        .iter()
        .find(|(topic, _)| *topic == name)
        .map(|(_, text)| *text)
}

#[test]
fn test_topics() {
    assert!(topic("ac").unwrap().starts_with("ac "));
    assert!(topic("circuit").is_some());
    assert_eq!(topic("dcgo"), topic("dgco"));
    assert!(topic("xyz").is_none());
}
