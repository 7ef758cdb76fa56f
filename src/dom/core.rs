//! Arena-backed node tree and HTML serialization.

/// Tags that never have children or a closing tag
pub const VOID_ELEMENTS: [&str; 17] = [
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr", "include",
];

/// Tags whose text content is emitted without whitespace collapsing
pub const PREFORMATTED_ELEMENTS: [&str; 4] = ["pre", "textarea", "script", "style"];

#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element tag plus ordered attributes; `None` marks a valueless attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, Option<String>)>,
}

impl Element {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Option<String>> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Replace in place when present, append otherwise
    pub fn set_attribute(&mut self, name: &str, value: Option<String>) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Owning arena for one tree. Node `0` is always the document root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                prev: None,
                next: None,
                children: Vec::new(),
            }],
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes ever created in this arena, detached ones included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the root has no children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            prev: None,
            next: None,
            children: Vec::new(),
        });
        id
    }

    /// New detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }))
    }

    /// New detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::Text(content.to_string()))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.nodes[id.0].parent;
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        let prev = self.nodes[node.0].prev.take();
        let next = self.nodes[node.0].next.take();
        if let Some(p) = prev {
            self.nodes[p.0].next = next;
        }
        if let Some(n) = next {
            self.nodes[n.0].prev = prev;
        }
        self.nodes[parent.0].children.retain(|&c| c != node);
    }

    /// Append `node` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    ///
    /// Returns `false` and leaves the tree unchanged when `parent` is a text
    /// node or when `node` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> bool {
        if matches!(self.nodes[parent.0].kind, NodeKind::Text(_))
            || node == self.root()
            || self.is_ancestor_or_self(node, parent)
        {
            return false;
        }
        self.detach(node);
        let last = self.nodes[parent.0].children.last().copied();
        if let Some(last) = last {
            self.nodes[last.0].next = Some(node);
        }
        let data = &mut self.nodes[node.0];
        data.parent = Some(parent);
        data.prev = last;
        data.next = None;
        self.nodes[parent.0].children.push(node);
        true
    }

    /// Append text under `parent`, merging into a trailing text child
    pub fn append_text(&mut self, parent: NodeId, content: &str) {
        if content.is_empty() {
            return;
        }
        if let Some(last) = self.last_child(parent) {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(content);
                return;
            }
        }
        let text = self.create_text(content);
        self.append_child(parent, text);
    }

    #[must_use]
    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    #[must_use]
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Set an attribute on an element; ignored for other node kinds
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<String>) {
        if let Some(el) = self.element_mut(node) {
            el.set_attribute(name, value);
        }
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&Option<String>> {
        self.element(node).and_then(|el| el.attribute(name))
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    #[must_use]
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    #[must_use]
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.last().copied()
    }

    #[must_use]
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].prev
    }

    #[must_use]
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].next
    }

    fn in_preformatted(&self, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(id) = cursor {
            if self
                .tag(id)
                .is_some_and(|t| PREFORMATTED_ELEMENTS.contains(&t))
            {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Serialized form of a text node.
    ///
    /// Whitespace runs collapse to one space outside preformatted ancestors;
    /// a node without a previous sibling loses leading whitespace and one
    /// without a next sibling loses trailing whitespace.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let Some(raw) = self.text(node) else {
            return String::new();
        };
        let mut text = if self.in_preformatted(node) {
            raw.to_string()
        } else {
            collapse_whitespace(raw)
        };
        if self.previous_sibling(node).is_none() {
            text = text.trim_start().to_string();
        }
        if self.next_sibling(node).is_none() {
            text = text.trim_end().to_string();
        }
        if !text.is_empty() && text.chars().all(char::is_whitespace) {
            return String::new();
        }
        text
    }

    /// Serialized children of `node`
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_inner(&mut out, node);
        out
    }

    /// Serialized `node` including its own tag
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_outer(&mut out, node);
        out
    }

    /// Serialized document
    #[must_use]
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    fn write_inner(&self, out: &mut String, node: NodeId) {
        if let NodeKind::Text(_) = self.kind(node) {
            out.push_str(&self.text_content(node));
            return;
        }
        for &child in self.children(node) {
            self.write_outer(out, child);
        }
    }

    fn write_outer(&self, out: &mut String, node: NodeId) {
        match self.kind(node) {
            NodeKind::Document => self.write_inner(out, node),
            NodeKind::Text(_) => out.push_str(&self.text_content(node)),
            NodeKind::Element(el) => {
                let at_root = self
                    .parent(node)
                    .is_some_and(|p| matches!(self.kind(p), NodeKind::Document));
                if el.tag == "html" && at_root {
                    out.push_str("<!DOCTYPE html>");
                }
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    match value.as_deref().map(str::trim) {
                        Some(v) if !v.is_empty() => {
                            out.push(' ');
                            out.push_str(name);
                            out.push_str("=\"");
                            out.push_str(v);
                            out.push('"');
                        }
                        _ => {
                            out.push(' ');
                            out.push_str(name);
                        }
                    }
                }
                out.push('>');
                if !is_void(&el.tag) {
                    self.write_inner(out, node);
                    out.push_str("</");
                    out.push_str(&el.tag);
                    out.push('>');
                }
            }
        }
    }
}

fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}
