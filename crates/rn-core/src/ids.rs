//! Strongly typed, zero-cost identifier wrappers.
//!
//! Two id spaces exist side by side:
//!
//! - [`NodeId`] is the opaque id supplied by the data source (an OSM node id,
//!   a CSV row key).  It is stable for the lifetime of a graph and is the only
//!   id callers ever see.
//! - [`NodeIdx`] and [`EdgeId`] are dense positions into the graph's CSR
//!   arrays.  Nodes are stored sorted by `NodeId`, so ascending `NodeIdx`
//!   order is also ascending `NodeId` order.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// External identity of a road-network node (e.g. an OSM node id).
    pub struct NodeId(u64);
}

typed_id! {
    /// Dense position of a node inside a built graph.
    pub struct NodeIdx(u32);
}

typed_id! {
    /// Dense position of a directed edge inside a built graph.
    pub struct EdgeId(u32);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIdx({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl From<u64> for NodeId {
    #[inline(always)]
    fn from(raw: u64) -> NodeId {
        NodeId(raw)
    }
}
