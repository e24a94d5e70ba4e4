//! Identifier types for every entity kind the environment manages.
//!
//! All ids are drawn from one monotonic counter owned by `Environment`, so a
//! `NodeId`, `LinkId`, and `FlowId` can never carry the same numeric value.
//! The typed wrappers then make it a compile error to mix up the kinds while
//! the underlying numbers stay collision-free across the whole topology.

use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(NodeId);
id_type!(LinkId);
id_type!(FlowId);

/// Monotonic allocator shared by the `Environment`. Every host, router, link
/// and flow id comes from the same counter, which is what guarantees the
/// cross-kind uniqueness invariant above.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn alloc(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn node(&mut self) -> NodeId {
        NodeId(self.alloc())
    }

    pub fn link(&mut self) -> LinkId {
        LinkId(self.alloc())
    }

    pub fn flow(&mut self) -> FlowId {
        FlowId(self.alloc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_never_collide_across_kinds() {
        let mut alloc = IdAllocator::default();
        let n = alloc.node();
        let l = alloc.link();
        let f = alloc.flow();
        assert_eq!(n.0, 0);
        assert_eq!(l.0, 1);
        assert_eq!(f.0, 2);
    }
}
