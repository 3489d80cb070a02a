//! The in-memory tree node and the `Stat` struct shared by both
//! backends.

use std::collections::HashMap;
use std::time::SystemTime;

/// Metadata returned by `PersistenceAdapter::stat`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub kind: Kind,
    pub size: Option<u64>,
    pub mtime: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Directory,
    File,
}

impl Stat {
    pub fn is_dir(&self) -> bool {
        self.kind == Kind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == Kind::File
    }
}

/// A node in the fabricated filesystem tree. Owned recursive structure
/// — the tree has no cycles, so no arena is needed (spec.md §9).
#[derive(Debug, Clone)]
pub enum Node {
    Directory {
        name: String,
        children: HashMap<String, Node>,
        /// Insertion/readdir order, kept separate from the map so an
        /// attached order vector (§9 ORDERPATCH) can override it
        /// without touching the map itself.
        order: Vec<String>,
        mtime: SystemTime,
    },
    File {
        name: String,
        bytes: Vec<u8>,
        mime: Option<String>,
        mtime: SystemTime,
    },
}

impl Node {
    pub fn new_root() -> Node {
        Node::Directory {
            name: String::new(),
            children: HashMap::new(),
            order: Vec::new(),
            mtime: SystemTime::now(),
        }
    }

    pub fn new_dir(name: impl Into<String>) -> Node {
        Node::Directory {
            name: name.into(),
            children: HashMap::new(),
            order: Vec::new(),
            mtime: SystemTime::now(),
        }
    }

    pub fn new_file(name: impl Into<String>, bytes: Vec<u8>, mime: Option<String>) -> Node {
        Node::File {
            name: name.into(),
            bytes,
            mime,
            mtime: SystemTime::now(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Directory { name, .. } => name,
            Node::File { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, new_name: impl Into<String>) {
        match self {
            Node::Directory { name, .. } => *name = new_name.into(),
            Node::File { name, .. } => *name = new_name.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    pub fn mtime(&self) -> SystemTime {
        match self {
            Node::Directory { mtime, .. } => *mtime,
            Node::File { mtime, .. } => *mtime,
        }
    }

    pub fn touch(&mut self) {
        let now = SystemTime::now();
        match self {
            Node::Directory { mtime, .. } => *mtime = now,
            Node::File { mtime, .. } => *mtime = now,
        }
    }

    pub fn stat(&self) -> Stat {
        match self {
            Node::Directory { mtime, .. } => Stat {
                kind: Kind::Directory,
                size: None,
                mtime: *mtime,
            },
            Node::File { bytes, mtime, .. } => Stat {
                kind: Kind::File,
                size: Some(bytes.len() as u64),
                mtime: *mtime,
            },
        }
    }

    /// Ordered child names, per the order vector if one is set,
    /// otherwise insertion order.
    pub fn child_names(&self) -> &[String] {
        match self {
            Node::Directory { order, .. } => order,
            Node::File { .. } => &[],
        }
    }

    pub fn children(&self) -> Option<&HashMap<String, Node>> {
        match self {
            Node::Directory { children, .. } => Some(children),
            Node::File { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<(&mut HashMap<String, Node>, &mut Vec<String>)> {
        match self {
            Node::Directory { children, order, .. } => Some((children, order)),
            Node::File { .. } => None,
        }
    }

    pub fn insert_child(&mut self, child: Node) {
        if let Some((children, order)) = self.children_mut() {
            let name = child.name().to_string();
            if !children.contains_key(&name) {
                order.push(name.clone());
            }
            children.insert(name, child);
        }
    }

    pub fn remove_child(&mut self, name: &str) -> Option<Node> {
        if let Some((children, order)) = self.children_mut() {
            let removed = children.remove(name);
            if removed.is_some() {
                order.retain(|n| n != name);
            }
            removed
        } else {
            None
        }
    }

    /// Apply an explicit order vector (ORDERPATCH), keeping any names
    /// missing from `order` appended at the end in their prior order.
    pub fn apply_order(&mut self, wanted: &[String]) {
        if let Some((children, order)) = self.children_mut() {
            let mut new_order: Vec<String> = wanted
                .iter()
                .filter(|n| children.contains_key(n.as_str()))
                .cloned()
                .collect();
            for n in order.iter() {
                if !new_order.contains(n) {
                    new_order.push(n.clone());
                }
            }
            *order = new_order;
        }
    }

    /// Deep-clone a subtree, renaming the clone's root. Used by `copy`.
    pub fn deep_clone_as(&self, new_name: &str) -> Node {
        let mut clone = self.clone();
        clone.set_name(new_name);
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_child_keep_order_in_sync() {
        let mut dir = Node::new_dir("d");
        dir.insert_child(Node::new_file("b.txt", vec![], None));
        dir.insert_child(Node::new_file("a.txt", vec![], None));
        assert_eq!(dir.child_names(), &["b.txt", "a.txt"]);
        dir.remove_child("b.txt");
        assert_eq!(dir.child_names(), &["a.txt"]);
    }

    #[test]
    fn apply_order_reorders_and_appends_unknown() {
        let mut dir = Node::new_dir("d");
        dir.insert_child(Node::new_file("a", vec![], None));
        dir.insert_child(Node::new_file("b", vec![], None));
        dir.insert_child(Node::new_file("c", vec![], None));
        dir.apply_order(&["c".into(), "a".into()]);
        assert_eq!(dir.child_names(), &["c", "a", "b"]);
    }

    #[test]
    fn stat_size_matches_bytes_len() {
        let f = Node::new_file("f", vec![1, 2, 3], None);
        assert_eq!(f.stat().size, Some(3));
    }

    #[test]
    fn deep_clone_renames_root_only() {
        let mut dir = Node::new_dir("src");
        dir.insert_child(Node::new_file("keep.rs", vec![], None));
        let clone = dir.deep_clone_as("dst");
        assert_eq!(clone.name(), "dst");
        assert_eq!(clone.child_names(), &["keep.rs"]);
    }
}
