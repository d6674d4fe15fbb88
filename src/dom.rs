//! Thin helpers over html5ever's reference-counted DOM.
//!
//! The rewriter works on parsed nodes; pages are stored as serialized
//! fragments and re-parsed when they need another in-place mutation.

use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, parse_fragment, Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .one(html.as_bytes())
}

/// Parses markup that belongs inside a `<body>`. Returns the top-level
/// nodes of the fragment.
pub fn parse_body_fragment(html: &str) -> Vec<Handle> {
    let context = QualName::new(None, Namespace::from(HTML_NS), LocalName::from("body"));
    let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new())
        .from_utf8()
        .one(html.as_bytes());
    // The fragment parser wraps everything in a synthetic <html> element.
    let Some(html_root) = dom.document.children.borrow().first().cloned() else {
        return Vec::new();
    };
    // Dropping the dom empties the children of every node still attached to
    // it, so the top-level nodes are detached first.
    let nodes = std::mem::take(&mut *html_root.children.borrow_mut());
    for node in &nodes {
        node.parent.set(None);
    }
    nodes
}

/// Parses a fragment expected to hold a single element and returns it.
pub fn parse_single_element(html: &str) -> Option<Handle> {
    parse_body_fragment(html)
        .into_iter()
        .find(|node| matches!(node.data, NodeData::Element { .. }))
}

pub fn outer_html(node: &Handle) -> String {
    let mut out = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    if serialize(&mut out, &SerializableHandle::from(node.clone()), opts).is_err() {
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}

pub fn tag_name(node: &Handle) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub fn get_attr(node: &Handle, name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    match node.data {
        NodeData::Element { ref attrs, .. } => {
            attrs.borrow().iter().any(|a| a.name.local.as_ref() == name)
        }
        _ => false,
    }
}

pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(attr) = attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            attr.value = StrTendril::from_slice(value);
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from_slice(value),
            });
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        attrs.borrow_mut().retain(|a| a.name.local.as_ref() != name);
    }
}

pub fn classes(node: &Handle) -> Vec<String> {
    get_attr(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn has_class(node: &Handle, class: &str) -> bool {
    get_attr(node, "class")
        .map(|c| c.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub fn add_class(node: &Handle, class: &str) {
    let mut list = classes(node);
    if !list.iter().any(|c| c == class) {
        list.push(class.to_string());
        set_attr(node, "class", &list.join(" "));
    }
}

pub fn remove_class(node: &Handle, class: &str) {
    let list = classes(node);
    if list.iter().any(|c| c == class) {
        let kept: Vec<_> = list.into_iter().filter(|c| c != class).collect();
        set_attr(node, "class", &kept.join(" "));
    }
}

/// Collects `node` and every element below it, in document order.
pub fn descendants(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_elements(node, &mut out);
    out
}

fn collect_elements(node: &Handle, out: &mut Vec<Handle>) {
    if is_element(node) {
        out.push(Rc::clone(node));
    }
    for child in node.children.borrow().iter() {
        collect_elements(child, out);
    }
}

pub fn find_all(node: &Handle, pred: impl Fn(&Handle) -> bool) -> Vec<Handle> {
    descendants(node).into_iter().filter(|n| pred(n)).collect()
}

pub fn find_first(node: &Handle, pred: impl Fn(&Handle) -> bool) -> Option<Handle> {
    descendants(node).into_iter().find(|n| pred(n))
}

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| is_element(c))
        .cloned()
        .collect()
}

/// Concatenated text of all text nodes below `node`.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { ref contents } = node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_and_class_helpers() {
        let node = parse_single_element(r#"<div class="a b" id="x"><p>hi</p></div>"#).unwrap();
        assert_eq!(tag_name(&node), Some("div"));
        assert!(has_class(&node, "b"));
        add_class(&node, "c");
        add_class(&node, "c");
        remove_class(&node, "a");
        assert_eq!(classes(&node), vec!["b", "c"]);
        set_attr(&node, "data-x", "1");
        assert_eq!(get_attr(&node, "data-x").as_deref(), Some("1"));
        remove_attr(&node, "id");
        assert!(!has_attr(&node, "id"));
        assert_eq!(text_content(&node), "hi");
    }

    #[test]
    fn test_outer_html_round_trips() {
        let node = parse_single_element(r#"<div class="page"><img src="a.png"></div>"#).unwrap();
        let html = outer_html(&node);
        assert_eq!(html, r#"<div class="page"><img src="a.png"></div>"#);
    }

    #[test]
    fn test_fragment_keeps_nested_children() {
        let html = r#"<div class="page"><div class="group"><p lang="en">one <b>two</b></p></div></div>"#;
        let node = parse_single_element(html).unwrap();
        assert!(node.parent.take().is_none());
        assert_eq!(descendants(&node).len(), 4);

        // Parsing the serialized page again gives the same page.
        let again = parse_single_element(&outer_html(&node)).unwrap();
        assert_eq!(outer_html(&again), html);
        assert_eq!(text_content(&again), "one two");
    }

    #[test]
    fn test_find_all_in_document_order() {
        let dom = parse_html("<body><p id=1></p><div><p id=2></p></div></body>");
        let ps = find_all(&dom.document, |n| tag_name(n) == Some("p"));
        let ids: Vec<_> = ps.iter().filter_map(|p| get_attr(p, "id")).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
