//! Which nodes count as editable surfaces.
//!
//! Editability does not nest: a rich editor is one surface even though every
//! paragraph inside it is itself content-editable. Only the outermost locally
//! editable element qualifies.

use crate::{CONTENT_EDITABLE_ATTRIBUTE, Dom, is_text_area};

/// Whether the element is editable in its own right: a text area, or a
/// content-editable element that has not explicitly opted out.
pub fn is_locally_editable<D: Dom>(dom: &D, node: &D::Node) -> bool {
    if is_text_area(dom, node) {
        return true;
    }

    dom.is_content_editable(node)
        && !dom
            .attribute(node, CONTENT_EDITABLE_ATTRIBUTE)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("false"))
}

/// Whether the node is an editable surface eligible for an affordance.
///
/// Pure; safe to call any number of times while the tree is changing.
pub fn is_editable_surface<D: Dom>(dom: &D, node: &D::Node) -> bool {
    if !dom.is_element(node) || !is_locally_editable(dom, node) {
        return false;
    }

    let mut ancestor = dom.parent_element(node);
    while let Some(parent) = ancestor {
        if is_locally_editable(dom, &parent) {
            return false;
        }
        ancestor = dom.parent_element(&parent);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::MemoryDom;

    #[test]
    fn it_accepts_a_standalone_textarea() {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let textarea = dom.append_element(body, "TEXTAREA");

        assert!(is_editable_surface(&dom, &textarea));
    }

    #[test]
    fn it_rejects_text_nodes_and_plain_elements() {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let div = dom.append_element(body, "div");
        let text = dom.append_text(div, "hello");

        assert!(!is_editable_surface(&dom, &div));
        assert!(!is_editable_surface(&dom, &text));
    }

    #[test]
    fn it_only_accepts_the_outermost_editable_root() {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let editor = dom.append_element(body, "div");
        dom.set_attribute_value(editor, "contenteditable", "true");
        let paragraph = dom.append_element(editor, "p");
        let nested = dom.append_element(paragraph, "div");
        dom.set_attribute_value(nested, "contenteditable", "true");

        assert!(is_editable_surface(&dom, &editor));
        assert!(!is_editable_surface(&dom, &paragraph));
        assert!(!is_editable_surface(&dom, &nested));
    }

    #[test]
    fn it_rejects_an_editable_root_nested_inside_another() {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let outer = dom.append_element(body, "section");
        dom.set_attribute_value(outer, "contenteditable", "true");
        let middle = dom.append_element(outer, "div");
        dom.set_attribute_value(middle, "contenteditable", "true");
        let inner = dom.append_element(middle, "div");
        dom.set_attribute_value(inner, "contenteditable", "true");

        assert!(is_editable_surface(&dom, &outer));
        assert!(!is_editable_surface(&dom, &middle));
        assert!(!is_editable_surface(&dom, &inner));
    }

    #[test]
    fn it_honors_an_explicit_opt_out() {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let editor = dom.append_element(body, "div");
        dom.set_attribute_value(editor, "contenteditable", "true");
        let locked = dom.append_element(editor, "div");
        dom.set_attribute_value(locked, "contenteditable", "FALSE");

        assert!(!is_locally_editable(&dom, &locked));
        assert!(!is_editable_surface(&dom, &locked));
        assert!(is_editable_surface(&dom, &editor));
    }

    #[test]
    fn it_treats_a_textarea_inside_an_editor_as_nested() {
        let dom = MemoryDom::new();
        let body = dom.body_of(dom.top_document());
        let editor = dom.append_element(body, "div");
        dom.set_attribute_value(editor, "contenteditable", "");
        let textarea = dom.append_element(editor, "textarea");

        assert!(is_editable_surface(&dom, &editor));
        assert!(!is_editable_surface(&dom, &textarea));
    }
}
