//! Decision trees as stored in a voice model.
//!
//! Trees are kept as opaque data: the front end that predicts durations, F0
//! and parameter frames walks them, the vocoder never does.

use alloc::{string::String, vec::Vec};

/// Value type tag for integer node values.
pub const VAL_TYPE_INT: i16 = 1;
/// Value type tag for float node values.
pub const VAL_TYPE_FLOAT: i16 = 3;
/// Value type tag for string node values.
pub const VAL_TYPE_STRING: i16 = 5;

/// The value compared against (or returned by) a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    Str(String),
    Int(i32),
    Float(f32),
}

impl TreeValue {
    /// The on-disk type tag for this value.
    #[must_use]
    pub fn type_tag(&self) -> i16 {
        match self {
            TreeValue::Str(_) => VAL_TYPE_STRING,
            TreeValue::Int(_) => VAL_TYPE_INT,
            TreeValue::Float(_) => VAL_TYPE_FLOAT,
        }
    }
}

/// One node of an array-backed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CartNode {
    /// index into the tree's feature table
    pub feat: u8,
    /// comparison operator
    pub op: u8,
    /// node to jump to when the question is false
    pub no_node: i16,
    pub value: TreeValue,
}

/// A classification and regression tree.
///
/// Nodes live in one vector and refer to each other by index. Walking past the
/// last node reaches the terminator, for which [`Cart::node`] returns `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub nodes: Vec<CartNode>,
    /// feature names referenced by [`CartNode::feat`]
    pub feat_table: Vec<String>,
}

impl Cart {
    /// Returns the node at `index`, or `None` at or past the terminator.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&CartNode> {
        self.nodes.get(index)
    }

    /// Name of the feature a node asks about.
    #[must_use]
    pub fn feature_name(&self, node: &CartNode) -> Option<&str> {
        self.feat_table.get(usize::from(node.feat)).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};

    #[test]
    fn terminator_is_past_the_last_node() {
        let cart = Cart {
            nodes: vec![CartNode {
                feat: 0,
                op: 2,
                no_node: 1,
                value: TreeValue::Float(0.5),
            }],
            feat_table: vec!["p.name".to_string()],
        };
        assert!(cart.node(0).is_some());
        assert!(cart.node(1).is_none());
        assert_eq!(cart.feature_name(&cart.nodes[0]), Some("p.name"));
    }

    #[test]
    fn type_tags_match_the_file_format() {
        assert_eq!(TreeValue::Int(3).type_tag(), 1);
        assert_eq!(TreeValue::Float(3.0).type_tag(), 3);
        assert_eq!(TreeValue::Str("a".to_string()).type_tag(), 5);
    }
}
