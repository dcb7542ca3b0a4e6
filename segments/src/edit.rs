//! Path-addressed, non-mutating edits of segment trees.
//!
//! The builder UI identifies nodes by their position (child indices from the
//! root) and every edit returns a new tree; the input tree is never touched.

use crate::types::{ContainerNode, Node};
use std::fmt;

/// Position of a node: child indices from the root; empty for the root itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Parent path and the index within it; None for the root
    pub fn split_last(&self) -> Option<(NodePath, usize)> {
        let (last, parent) = self.0.split_last()?;
        Some((NodePath(parent.to_vec()), *last))
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "root");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    InvalidPath(NodePath),
    NotAContainer(NodePath),
    RemoveRoot,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::InvalidPath(path) => write!(f, "No node at path {}", path),
            EditError::NotAContainer(path) => write!(f, "Node at path {} is not a container", path),
            EditError::RemoveRoot => write!(f, "The root node cannot be removed"),
        }
    }
}

impl std::error::Error for EditError {}

impl Node {
    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        let mut node = self;
        for &index in path.indices() {
            match node {
                Node::Container(container) => node = container.children.get(index)?,
                Node::Condition(_) => return None,
            }
        }
        Some(node)
    }

    /// New tree with the node at `path` replaced by `replacement`
    pub fn replaced(&self, path: &NodePath, replacement: Node) -> Result<Node, EditError> {
        let mut replacement = Some(replacement);
        rebuild(self, path, 0, &mut |_| {
            replacement
                .take()
                .ok_or_else(|| EditError::InvalidPath(path.clone()))
        })
    }

    /// New tree with `child` inserted into the container at `path`.
    /// `index` past the end appends.
    pub fn with_child_inserted(
        &self,
        path: &NodePath,
        index: usize,
        child: Node,
    ) -> Result<Node, EditError> {
        let mut child = Some(child);
        rebuild(self, path, 0, &mut |target| match target {
            Node::Container(container) => {
                let mut children = container.children.clone();
                let at = index.min(children.len());
                let child = child
                    .take()
                    .ok_or_else(|| EditError::InvalidPath(path.clone()))?;
                children.insert(at, child);
                Ok(Node::Container(ContainerNode::new(container.operator, children)))
            }
            Node::Condition(_) => Err(EditError::NotAContainer(path.clone())),
        })
    }

    /// New tree without the node at `path`
    pub fn with_child_removed(&self, path: &NodePath) -> Result<Node, EditError> {
        let (parent, index) = path.split_last().ok_or(EditError::RemoveRoot)?;
        rebuild(self, &parent, 0, &mut |target| match target {
            Node::Container(container) if index < container.children.len() => {
                let mut children = container.children.clone();
                children.remove(index);
                Ok(Node::Container(ContainerNode::new(container.operator, children)))
            }
            Node::Container(_) => Err(EditError::InvalidPath(path.clone())),
            Node::Condition(_) => Err(EditError::NotAContainer(parent.clone())),
        })
    }
}

/// Copies the spine from the root to `path`, applying `edit` at its end.
/// Subtrees off the path are cloned unchanged.
fn rebuild(
    node: &Node,
    path: &NodePath,
    depth: usize,
    edit: &mut dyn FnMut(&Node) -> Result<Node, EditError>,
) -> Result<Node, EditError> {
    let Some(&index) = path.indices().get(depth) else {
        return edit(node);
    };
    let container = match node {
        Node::Container(container) => container,
        Node::Condition(_) => return Err(EditError::InvalidPath(path.clone())),
    };
    let target = container
        .children
        .get(index)
        .ok_or_else(|| EditError::InvalidPath(path.clone()))?;

    let mut children = container.children.clone();
    children[index] = rebuild(target, path, depth + 1, edit)?;
    Ok(Node::Container(ContainerNode::new(container.operator, children)))
}
