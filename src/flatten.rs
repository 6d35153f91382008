use scraper::{Html, Node};

#[derive(Clone, Debug, PartialEq)]
pub enum MarkupKind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Other,
}

/// Owned snapshot of one node of the parsed document.
///
/// Nodes are stored in preorder, so a node with `child_count > 0` has its
/// first child right after it in the flattened sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkupNode {
    pub kind: MarkupKind,
    pub child_count: usize,
}

impl MarkupNode {
    pub fn is_element(&self, tag: &str) -> bool {
        matches!(&self.kind, MarkupKind::Element { name, .. } if name == tag)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match &self.kind {
            MarkupKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            MarkupKind::Text(text) => Some(text),
            _ => None,
        }
    }
}

pub fn parse_markup(markup: &str) -> Html {
    Html::parse_document(markup)
}

/// Preorder walk of the whole document with an explicit stack, root first.
pub fn flatten(document: &Html) -> Vec<MarkupNode> {
    let mut stack = vec![document.tree.root()];
    let mut nodes = Vec::new();

    while let Some(node) = stack.pop() {
        let kind = match node.value() {
            Node::Element(element) => MarkupKind::Element {
                name: element.name().to_string(),
                attrs: element
                    .attrs()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            },
            Node::Text(text) => MarkupKind::Text(text.to_string()),
            _ => MarkupKind::Other,
        };

        let mut child_count = 0;
        let mut child = node.last_child();
        while let Some(current) = child {
            stack.push(current);
            child_count += 1;
            child = current.prev_sibling();
        }

        nodes.push(MarkupNode { kind, child_count });
    }

    nodes
}
