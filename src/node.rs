use std::fmt;

/// Node identities are small dense integers, `0..num_nodes`.
pub type NodeId = u32;

/// The role a node plays for the duration of one trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The single traffic destination.
    Sink,
    /// Everything else: a candidate traffic source.
    Sender,
}

/// A simulated node. Created at trial start; its role is assigned once.
#[derive(Clone, Copy, Debug)]
pub struct Node {
    pub id: NodeId,
    pub role: Role,
}

impl Node {
    pub fn new(id: NodeId, sink_id: NodeId) -> Self {
        let role = if id == sink_id { Role::Sink } else { Role::Sender };
        Node { id: id, role: role }
    }

    pub fn is_sink(&self) -> bool {
        self.role == Role::Sink
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "Node({})", self.id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_assignment() {
        assert!(Node::new(3, 3).is_sink());
        assert!(!Node::new(2, 3).is_sink());
    }
}
