use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GateId {
    x: usize,
}

/// Rank of a layer. Ordering is `Input < Numbered(_) < Output`, which is also
/// the evaluation order.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerRank {
    Input,
    Numbered(u64),
    Output,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum InputSlot {
    In0,
    In1,
}

impl GateId {
    pub const fn new(x: usize) -> GateId {
        GateId { x }
    }

    pub fn index(&self) -> usize {
        self.x
    }
}

impl From<usize> for GateId {
    fn from(x: usize) -> GateId {
        GateId { x }
    }
}

impl From<GateId> for usize {
    fn from(id: GateId) -> usize {
        id.x
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.x)
    }
}

impl LayerRank {
    pub fn is_reserved(&self) -> bool {
        match self {
            LayerRank::Input | LayerRank::Output => true,
            LayerRank::Numbered(_) => false,
        }
    }
}

/// Rank 0 is the input layer, every other number is a logic layer.
impl From<u64> for LayerRank {
    fn from(x: u64) -> LayerRank {
        if x == 0 {
            LayerRank::Input
        } else {
            LayerRank::Numbered(x)
        }
    }
}

impl FromStr for LayerRank {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<LayerRank, Self::Err> {
        match s {
            "in" => Ok(LayerRank::Input),
            "out" => Ok(LayerRank::Output),
            _ => u64::from_str(s).map(LayerRank::from),
        }
    }
}

impl fmt::Display for LayerRank {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerRank::Input => write!(formatter, "in"),
            LayerRank::Numbered(x) => write!(formatter, "{}", x),
            LayerRank::Output => write!(formatter, "out"),
        }
    }
}

impl InputSlot {
    pub const BOTH: [InputSlot; 2] = [InputSlot::In0, InputSlot::In1];

    pub fn index(&self) -> usize {
        match self {
            InputSlot::In0 => 0,
            InputSlot::In1 => 1,
        }
    }
}

impl From<bool> for InputSlot {
    fn from(x: bool) -> InputSlot {
        if x {
            InputSlot::In1
        } else {
            InputSlot::In0
        }
    }
}

impl fmt::Display for InputSlot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.index())
    }
}

#[test]
fn test_layer_rank_order() {
    let mut ranks = vec![
        LayerRank::Output,
        LayerRank::from(7),
        LayerRank::Numbered(u64::MAX),
        LayerRank::from(0),
        LayerRank::from(1),
    ];
    ranks.sort();
    assert_eq!(
        ranks,
        vec![
            LayerRank::Input,
            LayerRank::Numbered(1),
            LayerRank::Numbered(7),
            LayerRank::Numbered(u64::MAX),
            LayerRank::Output,
        ]
    );
}

#[test]
fn test_layer_rank_from_str() {
    assert_eq!("in".parse::<LayerRank>(), Ok(LayerRank::Input));
    assert_eq!("out".parse::<LayerRank>(), Ok(LayerRank::Output));
    assert_eq!("0".parse::<LayerRank>(), Ok(LayerRank::Input));
    assert_eq!("12".parse::<LayerRank>(), Ok(LayerRank::Numbered(12)));
    assert!("-3".parse::<LayerRank>().is_err());
    assert!(LayerRank::Output.is_reserved());
    assert!(!LayerRank::Numbered(3).is_reserved());
}
