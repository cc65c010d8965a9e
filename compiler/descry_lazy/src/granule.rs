//! Resolution granules.
//!
//! A granule is the smallest piece of syntax the lazy session resolves as a
//! unit. A request for any element is answered by resolving the nearest
//! enclosing granule; elements outside every granule only force the
//! descriptor of their enclosing declaration.
//!
//! Bodies are opaque: a function declared inside a block belongs to the
//! granule that owns the block.

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Granule {
    /// Signature and body of a named function.
    Function,
    ClassInitializer,
    /// Type, initializer, delegate and accessors of a property.
    Property,
    DelegationSpecifierList,
    Import,
    AnnotationEntry,
    TypeParameter,
    TypeConstraint,
    PackageHeader,
}

impl Granule {
    pub fn of_kind(kind: NodeKind) -> Option<Granule> {
        Some(match kind {
            NodeKind::Function => Granule::Function,
            NodeKind::ClassInitializer => Granule::ClassInitializer,
            NodeKind::Property => Granule::Property,
            NodeKind::DelegationSpecifierList => Granule::DelegationSpecifierList,
            NodeKind::Import => Granule::Import,
            NodeKind::AnnotationEntry => Granule::AnnotationEntry,
            NodeKind::TypeParameter => Granule::TypeParameter,
            NodeKind::TypeConstraint => Granule::TypeConstraint,
            NodeKind::PackageHeader => Granule::PackageHeader,
            _ => return None,
        })
    }
}

/// Nearest granule containing `node`, `node` itself included, that is not
/// inside a body.
pub fn find_granule(tree: &SyntaxTree, node: NodeId) -> Option<(NodeId, Granule)> {
    let mut found = None;
    for ancestor in tree.ancestors(node) {
        let kind = tree.kind(ancestor);
        if kind.is_body() {
            found = None;
        } else if found.is_none() {
            found = Granule::of_kind(kind).map(|granule| (ancestor, granule));
        }
    }
    found
}

/// Every granule of a file, in tree order.
pub fn granules(tree: &SyntaxTree) -> impl Iterator<Item = (NodeId, Granule)> + '_ {
    tree.nodes().filter_map(move |(id, _)| {
        find_granule(tree, id).filter(|&(granule_node, _)| granule_node == id)
    })
}
