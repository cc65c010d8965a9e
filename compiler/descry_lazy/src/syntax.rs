//! Syntax trees handed to the lazy session.
//!
//! The parser is not part of this crate: a front end builds a
//! [`SyntaxTree`] with [`SyntaxTree::add`] and the session only navigates
//! it. Nodes live in one flat arena and point at their parent, so finding
//! the enclosing declaration of any node is a walk up the parent chain.

use std::fmt;

use descry_ir::{FqName, Name, Span};

/// Index into a file's node arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The file node every tree starts with.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A file registered with a lazy session.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct FileId(u32);

impl FileId {
    pub(crate) const fn new(raw: u32) -> Self {
        FileId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in a particular file; the unit the session resolves.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ElementId {
    pub file: FileId,
    pub node: NodeId,
}

impl ElementId {
    pub const fn new(file: FileId, node: NodeId) -> Self {
        ElementId { file, node }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    File,
    /// `package a.b`; `path` holds the package name.
    PackageHeader,
    /// `import a.b.C`; `path` holds the imported name.
    Import,
    Class,
    Interface,
    Object,
    /// Anonymous `init { }` block of a class.
    ClassInitializer,
    Function,
    ValueParameter,
    Property,
    /// `by expr` on a property.
    PropertyDelegate,
    /// `get()` / `set(v)` on a property.
    PropertyAccessor,
    /// The `: A(), B` list after a class header.
    DelegationSpecifierList,
    DelegationSpecifier,
    /// A written type; `path` holds the type name, children are arguments.
    TypeReference,
    /// `@A`; `path` holds the annotation name.
    AnnotationEntry,
    TypeParameter,
    /// `where T : Bound`; `name` holds the constrained parameter.
    TypeConstraint,
    Block,
    Expression,
    /// One segment of a qualified name, e.g. in a package header.
    NameReference,
}

impl NodeKind {
    pub fn is_class_like(self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Interface | NodeKind::Object)
    }

    /// Syntax handed to the body resolver as a whole.
    pub fn is_body(self) -> bool {
        matches!(self, NodeKind::Block | NodeKind::Expression)
    }

    /// Kinds that introduce a descriptor.
    pub fn is_declaration(self) -> bool {
        self.is_class_like()
            || matches!(
                self,
                NodeKind::Function | NodeKind::Property | NodeKind::TypeParameter
            )
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub name: Option<Name>,
    pub path: Option<FqName>,
    pub span: Span,
    /// Only meaningful on type references.
    pub nullable: bool,
    pub children: Vec<NodeId>,
}

/// One source file.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    file_name: String,
    nodes: Vec<Node>,
}

impl SyntaxTree {
    pub fn new(file_name: impl Into<String>) -> Self {
        SyntaxTree {
            file_name: file_name.into(),
            nodes: vec![Node {
                kind: NodeKind::File,
                parent: None,
                name: None,
                path: None,
                span: Span::DUMMY,
                nullable: false,
                children: Vec::new(),
            }],
        }
    }

    // ========================================
    // Building
    // ========================================

    /// Append a child of `parent`, returning a handle to fill it in.
    ///
    /// # Panics
    ///
    /// Panics if the tree already holds `u32::MAX` nodes.
    pub fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeBuilder<'_> {
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .unwrap_or_else(|_| panic!("syntax tree exceeded u32::MAX nodes")),
        );
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            name: None,
            path: None,
            span: Span::DUMMY,
            nullable: false,
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        NodeBuilder { tree: self, id }
    }

    // ========================================
    // Navigation
    // ========================================

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Children of `id` with the given kind.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.kind(child) == kind)
    }

    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of_kind(id, kind).next()
    }

    /// `id` and then every ancestor up to the file node.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Nearest strict ancestor of one of the given kinds.
    pub fn enclosing(&self, id: NodeId, kinds: impl Fn(NodeKind) -> bool) -> Option<NodeId> {
        self.ancestors(id).skip(1).find(|&node| kinds(self.kind(node)))
    }

    /// Nodes in creation order, which is pre-order for trees built top-down.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "add() keeps the node count within u32"
    )]
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Package declared by the header, or the root package.
    pub fn package(&self) -> FqName {
        self.child_of_kind(NodeId::ROOT, NodeKind::PackageHeader)
            .and_then(|header| self.node(header).path.clone())
            .unwrap_or_else(FqName::root)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }
}

/// Fills in a freshly added node.
#[must_use]
pub struct NodeBuilder<'a> {
    tree: &'a mut SyntaxTree,
    id: NodeId,
}

impl NodeBuilder<'_> {
    pub fn named(self, name: Name) -> Self {
        self.tree.nodes[self.id.index()].name = Some(name);
        self
    }

    pub fn path(self, path: FqName) -> Self {
        let node = &mut self.tree.nodes[self.id.index()];
        if node.name.is_none() {
            node.name = path.short_name();
        }
        node.path = Some(path);
        self
    }

    pub fn span(self, span: Span) -> Self {
        self.tree.nodes[self.id.index()].span = span;
        self
    }

    pub fn nullable(self) -> Self {
        self.tree.nodes[self.id.index()].nullable = true;
        self
    }

    pub fn id(self) -> NodeId {
        self.id
    }
}

pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
