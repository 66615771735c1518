//! In-process document model: node arena, markup parsing/serialization, and
//! child-list mutation observation.
//!
//! Stands in for the browser DOM so the watcher and normalizer can run (and be
//! tested) without a page. Node identity is a [`NodeId`]; detached nodes stay in
//! the arena for the lifetime of the document.

mod parse;
mod serialize;

#[cfg(test)]
mod tests;

#[cfg(test)]
pub use parse::MAX_DEPTH;
pub use parse::ParseError;

/// Identity of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Handle returned by [`Document::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root. Its children are the top-level nodes of the page.
    Root,
    /// Detached container produced while parsing markup.
    Fragment,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One child-list change: `added` were inserted under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
}

#[derive(Debug)]
struct Observer {
    target: NodeId,
    pending: Vec<MutationRecord>,
}

/// Elements whose content is never parsed as markup.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements that never have children or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(crate) fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    observers: Vec<Observer>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with only a root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            observers: Vec::new(),
        }
    }

    /// Parse a full page (or any fragment) into a new document.
    pub fn parse(markup: &str) -> Result<Self, ParseError> {
        let mut doc = Self::new();
        let root = doc.root();
        let fragment = parse::parse_fragment(&mut doc, markup)?;
        doc.move_children(fragment, root);
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Create a detached element.
    #[cfg(test)]
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    /// Create a detached text node.
    #[cfg(test)]
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub(crate) fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Lowercase tag name, or `None` for non-element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Set or replace an attribute. No-op on non-element nodes.
    #[cfg(test)]
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            let name = name.to_ascii_lowercase();
            match attrs.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name, value.to_string())),
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.node(id).parent;
        }
        false
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        out
    }

    /// Text nodes under `id` in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.node(*n).kind, NodeKind::Text(_)))
            .collect()
    }

    /// Character data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Replace the character data of a text node. No-op on other nodes.
    pub fn set_text(&mut self, id: NodeId, text: String) {
        if let NodeKind::Text(t) = &mut self.node_mut(id).kind {
            *t = text;
        }
    }

    /// Concatenated text content of a subtree.
    #[cfg(test)]
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// First element (document order) with the given `id` attribute.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn move_children(&mut self, from: NodeId, to: NodeId) -> Vec<NodeId> {
        let moved = std::mem::take(&mut self.node_mut(from).children);
        for child in &moved {
            self.node_mut(*child).parent = Some(to);
        }
        self.node_mut(to).children.extend(moved.iter().copied());
        moved
    }

    /// Append `child` (moving it if already attached) and notify observers.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child);
        self.notify(parent, vec![child]);
    }

    /// Detach `child` from `parent`. Removals are not reported to observers.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(child).parent == Some(parent) {
            self.detach(child);
        }
    }

    /// Serialized markup of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_children(self, id, &mut out);
        out
    }

    /// Serialized markup of `id` itself.
    #[cfg(test)]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out);
        out
    }

    /// Replace all children of `id` with the parse of `markup`, as one write.
    ///
    /// On a parse error the node is left untouched.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<(), ParseError> {
        let fragment = parse::parse_fragment(self, markup)?;
        let old = std::mem::take(&mut self.node_mut(id).children);
        for child in old {
            self.node_mut(child).parent = None;
        }
        let added = self.move_children(fragment, id);
        if !added.is_empty() {
            self.notify(id, added);
        }
        Ok(())
    }

    /// Parse `markup` into a detached fragment node, leaving the tree untouched.
    pub fn parse_detached(&mut self, markup: &str) -> Result<NodeId, ParseError> {
        parse::parse_fragment(self, markup)
    }

    /// Watch `target` and its whole subtree for added nodes.
    pub fn observe(&mut self, target: NodeId) -> ObserverId {
        self.observers.push(Observer {
            target,
            pending: Vec::new(),
        });
        ObserverId(self.observers.len() - 1)
    }

    /// Drain records queued for `observer` since the last call.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(observer.0)
            .map(|o| std::mem::take(&mut o.pending))
            .unwrap_or_default()
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.iter().any(|o| !o.pending.is_empty())
    }

    fn notify(&mut self, target: NodeId, added: Vec<NodeId>) {
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, o)| self.is_inclusive_ancestor(o.target, target))
            .map(|(i, _)| i)
            .collect();
        for i in interested {
            self.observers[i].pending.push(MutationRecord {
                target,
                added: added.clone(),
            });
        }
    }
}
