use crate::types::{GateId, InputSlot};
use std::fmt;

/// Edge from the (possibly inverted) output of `source` to input `slot` of `dest`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Connection {
    pub source: GateId,
    pub invert: bool,
    pub dest: GateId,
    pub slot: InputSlot,
}

/// Canonical edge list of a circuit. At most one entry exists per
/// `(dest, slot)` pair.
#[derive(Clone, Debug, Default)]
pub struct ConnectionRegistry {
    connections: Vec<Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> ConnectionRegistry {
        ConnectionRegistry {
            connections: Vec::new(),
        }
    }

    /// Inserts `connection`, returning the entry it replaced on the same
    /// destination slot.
    pub fn upsert(&mut self, connection: Connection) -> Option<Connection> {
        let replaced = self.remove_to(connection.dest, connection.slot);
        self.connections.push(connection);
        replaced
    }

    pub fn remove_to(&mut self, dest: GateId, slot: InputSlot) -> Option<Connection> {
        let idx = self
            .connections
            .iter()
            .position(|c| c.dest == dest && c.slot == slot)?;
        Some(self.connections.remove(idx))
    }

    /// Removes every entry matching `pred` and returns them in registry order.
    pub fn remove_where<P: FnMut(&Connection) -> bool>(&mut self, mut pred: P) -> Vec<Connection> {
        let mut removed = Vec::new();
        self.connections.retain(|c| {
            if pred(c) {
                removed.push(*c);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn to(&self, dest: GateId, slot: InputSlot) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.dest == dest && c.slot == slot)
    }

    pub fn touching(&self, gate: GateId) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.source == gate || c.dest == gate)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Connection> {
        self.connections.iter()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl<'a> IntoIterator for &'a ConnectionRegistry {
    type Item = &'a Connection;
    type IntoIter = std::slice::Iter<'a, Connection>;

    fn into_iter(self) -> Self::IntoIter {
        self.connections.iter()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}{} -> {}.in_{}",
            if self.invert { "!" } else { "" },
            self.source,
            self.dest,
            self.slot
        )
    }
}

#[cfg(test)]
fn conn(source: usize, invert: bool, dest: usize, slot: InputSlot) -> Connection {
    Connection {
        source: GateId::new(source),
        invert,
        dest: GateId::new(dest),
        slot,
    }
}

#[test]
fn test_upsert_replaces_same_slot() {
    let mut registry = ConnectionRegistry::new();
    assert_eq!(registry.upsert(conn(2, false, 6, InputSlot::In0)), None);
    assert_eq!(registry.upsert(conn(3, false, 6, InputSlot::In1)), None);
    assert_eq!(
        registry.upsert(conn(4, true, 6, InputSlot::In0)),
        Some(conn(2, false, 6, InputSlot::In0))
    );
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.to(GateId::new(6), InputSlot::In0),
        Some(&conn(4, true, 6, InputSlot::In0))
    );
}

#[test]
fn test_remove_where() {
    let mut registry = ConnectionRegistry::new();
    registry.upsert(conn(2, false, 6, InputSlot::In0));
    registry.upsert(conn(6, false, 7, InputSlot::In0));
    registry.upsert(conn(6, true, 8, InputSlot::In1));
    registry.upsert(conn(3, false, 8, InputSlot::In0));
    let removed = registry.remove_where(|c| c.source == GateId::new(6));
    assert_eq!(removed.len(), 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.touching(GateId::new(6)).count(), 1);
    assert_eq!(registry.remove_to(GateId::new(9), InputSlot::In0), None);
    assert_eq!(format!("{}", conn(6, true, 8, InputSlot::In1)), "!6 -> 8.in_1");
}
