//! Minimal XML tree for walking Office document parts.

use quick_xml::Reader;
use quick_xml::events::Event;

/// A parsed XML node: either an element with children or a run of character data
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element { name: String, children: Vec<XmlNode> },
    Text(String),
}

impl XmlNode {
    fn element(name: String) -> Self {
        XmlNode::Element {
            name,
            children: Vec::new(),
        }
    }

    fn push(&mut self, child: XmlNode) {
        if let XmlNode::Element { children, .. } = self {
            children.push(child);
        }
    }

    /// Concatenated character data directly under this node
    pub fn own_text(&self) -> String {
        match self {
            XmlNode::Text(text) => text.clone(),
            XmlNode::Element { children, .. } => children
                .iter()
                .filter_map(|c| match c {
                    XmlNode::Text(text) => Some(text.as_str()),
                    XmlNode::Element { .. } => None,
                })
                .collect(),
        }
    }
}

/// Parse a document into a tree rooted at an unnamed element.
///
/// Qualified names keep their namespace prefix (`a:t`, `w:p`).
pub fn parse(xml: &str) -> Result<XmlNode, String> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![XmlNode::element(String::new())];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at byte {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(XmlNode::element(name));
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.push(XmlNode::element(name));
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or("unbalanced end tag")?;
                let parent = stack.last_mut().ok_or("unbalanced end tag")?;
                parent.push(node);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| format!("bad character data: {e}"))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push(XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.push(XmlNode::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(format!("{} unclosed element(s)", stack.len() - 1));
    }
    stack.pop().ok_or_else(|| "empty document".to_string())
}

/// Collect the text of every element whose qualified name ends with `:{local}`,
/// in document order. Anything else only contributes through its descendants.
pub fn collect_text(node: &XmlNode, local: &str, out: &mut Vec<String>) {
    if let XmlNode::Element { name, children } = node {
        if is_named(name, local) {
            out.push(node.own_text());
            return;
        }
        for child in children {
            collect_text(child, local, out);
        }
    }
}

/// `a:t` matches local name `t`; unprefixed names never match
pub fn is_named(qualified: &str, local: &str) -> bool {
    qualified
        .rsplit_once(':')
        .is_some_and(|(_, name)| name == local)
}
