//! Plain text extraction for documentation markup.
//!
//! Extraction never touches the parsed document. Nodes that carry no searchable
//! text (headings handled elsewhere, permalink anchors, badges, nested blocks)
//! are skipped while walking, and admonitions are read through as if their
//! children sat directly in the element being extracted.

use anyhow::{Result, anyhow};
use ego_tree::{NodeId, NodeRef};
use scraper::ElementRef;
use scraper::node::{Element, Node};

use crate::dom::{find_descendant, has_tag_and_class, is_heading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Own,
    Unwrapped,
}

pub fn extract_text(element: Option<ElementRef<'_>>) -> Result<String> {
    let Some(element) = element else {
        return Ok(String::new());
    };

    let mut out = String::new();
    for child in element.children() {
        push_direct_child(child, Level::Own, None, &mut out)?;
    }
    Ok(out.replace('\n', " ").trim().to_string())
}

fn push_direct_child(
    node: NodeRef<'_, Node>,
    level: Level,
    admonition_title: Option<NodeId>,
    out: &mut String,
) -> Result<()> {
    let Some(element) = ElementRef::wrap(node) else {
        push_inline(node, admonition_title, out);
        return Ok(());
    };

    if level == Level::Own {
        if is_heading(element) {
            return Ok(());
        }
        if has_tag_and_class(element, "div", "admonition") {
            let title = find_descendant(element, |el| {
                has_tag_and_class(el, "p", "admonition-title")
            })
            .ok_or_else(|| anyhow!("admonition block has no p.admonition-title"))?;
            for child in element.children() {
                push_direct_child(child, Level::Unwrapped, Some(title.id()), out)?;
            }
            return Ok(());
        }
    }

    if has_tag_and_class(element, "p", "parameter__children-button")
        || element.value().name() == "div"
    {
        return Ok(());
    }

    push_inline(node, admonition_title, out);
    Ok(())
}

fn push_inline(node: NodeRef<'_, Node>, admonition_title: Option<NodeId>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            if is_decoration(element) {
                return;
            }
            for child in node.children() {
                push_inline(child, admonition_title, out);
            }
            if admonition_title == Some(node.id()) {
                out.push(':');
            }
        }
        _ => {}
    }
}

fn is_decoration(element: &Element) -> bool {
    let has_class = |class: &str| element.classes().any(|name| name == class);
    match element.name() {
        "a" => has_class("headerlink"),
        "span" => has_class("api-name__beta"),
        "script" | "style" | "template" => true,
        _ => false,
    }
}
