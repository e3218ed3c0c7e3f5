//! Headless [`Surface`] backed by an in-memory node tree.
//!
//! Selectors are matched by `scraper` against a markup rendering of the tree.
//! Events are delivered synchronously through [`MemorySurface::dispatch`] and
//! its shorthands.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use scraper::{Html, Selector};

use super::{
    EventKind, Handler, IntersectionCallback, IntersectionEntry, ObserverOptions, Rect,
    ScrollBlock, Surface, Target, UiEvent, Watch,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);
const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;
const NODE_ATTRIBUTE: &str = "data-memory-node";
const VOID_TAGS: [&str; 6] = ["br", "hr", "img", "input", "link", "meta"];

#[derive(Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    styles: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    offset_top: f64,
    offset_size: (f64, f64),
    bounding_box: Rect,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }
}

struct Listener {
    target: Target<NodeId>,
    kind: EventKind,
    handler: Rc<RefCell<Handler<NodeId>>>,
}

struct ObserverSlot {
    options: ObserverOptions,
    watched: Vec<NodeId>,
    callback: Rc<RefCell<IntersectionCallback<NodeId>>>,
}

pub struct MemorySurface {
    nodes: RefCell<Vec<NodeData>>,
    listeners: RefCell<Vec<Listener>>,
    observers: RefCell<Vec<ObserverSlot>>,
    scroll_y: Cell<f64>,
    viewport_height: Cell<f64>,
    scrolled_into_view: RefCell<Vec<(NodeId, ScrollBlock)>>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    /// An empty document: `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut body = NodeData::new("body");
        body.parent = Some(ROOT);
        let mut root = NodeData::new("html");
        root.children.push(BODY);

        Self {
            nodes: RefCell::new(vec![root, body]),
            listeners: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            scroll_y: Cell::new(0.0),
            viewport_height: Cell::new(DEFAULT_VIEWPORT_HEIGHT),
            scrolled_into_view: RefCell::new(Vec::new()),
        }
    }

    /// Appends an element described by shorthand such as
    /// `a.nav-link[href="#intro"]` or `div#particles`.
    pub fn add(&self, parent: NodeId, description: &str) -> NodeId {
        let shorthand = parse_shorthand(description);
        let tag = shorthand.tag.as_deref().unwrap_or("div");
        let mut data = NodeData::new(tag);
        data.classes = shorthand.classes;
        if let Some(id) = shorthand.id {
            data.attributes.insert("id".to_string(), id);
        }
        data.attributes.extend(shorthand.attributes);

        let node = self.push_node(data);
        self.append(&parent, &node);
        node
    }

    pub fn set_offset_top(&self, node: NodeId, top: f64) {
        self.nodes.borrow_mut()[node.0].offset_top = top;
    }

    pub fn set_offset_size(&self, node: NodeId, width: f64, height: f64) {
        self.nodes.borrow_mut()[node.0].offset_size = (width, height);
    }

    pub fn set_bounding_box(&self, node: NodeId, rect: Rect) {
        self.nodes.borrow_mut()[node.0].bounding_box = rect;
    }

    pub fn set_viewport_height(&self, height: f64) {
        self.viewport_height.set(height);
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes.borrow()[node.0].styles.get(property).cloned()
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].tag.clone()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ROOT {
                return true;
            }
            cursor = nodes[current.0].parent;
        }
        false
    }

    pub fn count(&self, selector: &str) -> usize {
        self.query_all(selector).len()
    }

    pub fn scrolled_into_view(&self) -> Vec<(NodeId, ScrollBlock)> {
        self.scrolled_into_view.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Options of every observer currently watching `node`.
    pub fn observers_of(&self, node: NodeId) -> Vec<ObserverOptions> {
        self.observers
            .borrow()
            .iter()
            .filter(|slot| slot.watched.contains(&node))
            .map(|slot| slot.options)
            .collect()
    }

    /// Delivers an event along its propagation path and returns it so callers
    /// can inspect `prevent_default` / `stop_propagation`.
    pub fn dispatch(&self, target: Target<NodeId>, mut event: UiEvent<NodeId>) -> UiEvent<NodeId> {
        for stage in self.propagation_path(target, event.kind) {
            for handler in self.handlers_for(&stage, event.kind) {
                let mut handler = handler.borrow_mut();
                (*handler)(&mut event);
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        event
    }

    pub fn click(&self, node: NodeId) -> UiEvent<NodeId> {
        self.dispatch(
            Target::Element(node),
            UiEvent::new(EventKind::Click, Some(node)),
        )
    }

    pub fn hover(&self, node: NodeId) {
        self.dispatch(
            Target::Element(node),
            UiEvent::new(EventKind::MouseEnter, Some(node)),
        );
    }

    pub fn unhover(&self, node: NodeId) {
        self.dispatch(
            Target::Element(node),
            UiEvent::new(EventKind::MouseLeave, Some(node)),
        );
    }

    pub fn press_key(&self, key: &str) {
        self.dispatch(
            Target::Element(BODY),
            UiEvent::new(EventKind::KeyDown, Some(BODY)).with_key(key),
        );
    }

    pub fn scroll_to(&self, y: f64) {
        self.scroll_y.set(y);
        self.dispatch(Target::Window, UiEvent::new(EventKind::Scroll, None));
    }

    /// Reports a visibility change for `node` to every observer watching it.
    pub fn intersect(&self, node: NodeId, is_intersecting: bool) {
        let callbacks: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.watched.contains(&node))
            .map(|(index, slot)| (index, slot.callback.clone()))
            .collect();

        let entry = IntersectionEntry {
            target: node,
            is_intersecting,
        };
        for (index, callback) in callbacks {
            let watch = {
                let mut callback = callback.borrow_mut();
                (*callback)(&entry)
            };
            if watch == Watch::Stop {
                self.observers.borrow_mut()[index]
                    .watched
                    .retain(|watched| *watched != node);
            }
        }
    }

    fn push_node(&self, data: NodeData) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(data);
        NodeId(nodes.len() - 1)
    }

    fn detach(nodes: &mut [NodeData], node: NodeId) {
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    fn propagation_path(&self, target: Target<NodeId>, kind: EventKind) -> Vec<Target<NodeId>> {
        match target {
            Target::Element(node) if kind.bubbles() => {
                let nodes = self.nodes.borrow();
                let mut path = Vec::new();
                let mut cursor = Some(node);
                while let Some(current) = cursor {
                    path.push(Target::Element(current));
                    cursor = nodes[current.0].parent;
                }
                path.push(Target::Document);
                path
            }
            other => vec![other],
        }
    }

    fn handlers_for(
        &self,
        stage: &Target<NodeId>,
        kind: EventKind,
    ) -> Vec<Rc<RefCell<Handler<NodeId>>>> {
        self.listeners
            .borrow()
            .iter()
            .filter(|listener| listener.target == *stage && listener.kind == kind)
            .map(|listener| listener.handler.clone())
            .collect()
    }

    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut ordered = Vec::new();
        let mut stack: Vec<NodeId> = nodes[from.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            ordered.push(node);
            stack.extend(nodes[node.0].children.iter().rev().copied());
        }
        ordered
    }

    fn tree_root(&self, node: NodeId) -> NodeId {
        let nodes = self.nodes.borrow();
        let mut top = node;
        while let Some(parent) = nodes[top.0].parent {
            top = parent;
        }
        top
    }

    /// Nodes in the tree rooted at `top` that match `selector`, in document
    /// order. The tree is rendered to markup and matched with `scraper`, so
    /// nest elements the way a real page would; an invalid selector matches
    /// nothing.
    fn select(&self, top: NodeId, selector: &str) -> Vec<NodeId> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };

        let mut markup = String::new();
        write_markup(&self.nodes.borrow(), top, &mut markup);
        let html = if top == ROOT {
            Html::parse_document(&markup)
        } else {
            Html::parse_fragment(&markup)
        };

        html.select(&selector)
            .filter_map(|element| element.value().attr(NODE_ATTRIBUTE)?.parse::<usize>().ok())
            .map(NodeId)
            .collect()
    }
}

impl Surface for MemorySurface {
    type Node = NodeId;

    fn body(&self) -> NodeId {
        BODY
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        self.descendants(ROOT)
            .into_iter()
            .find(|node| nodes[node.0].attributes.get("id").map(String::as_str) == Some(id))
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.select(ROOT, selector)
    }

    fn query_within(&self, scope: &NodeId, selector: &str) -> Option<NodeId> {
        self.select(self.tree_root(*scope), selector)
            .into_iter()
            .find(|node| node != scope && self.contains(scope, node))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let matched = self.select(self.tree_root(*node), selector);
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            if matched.contains(&current) {
                return Some(current);
            }
            cursor = self.nodes.borrow()[current.0].parent;
        }
        None
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            cursor = nodes[current.0].parent;
        }
        false
    }

    fn create_element(&self, tag: &str) -> Option<NodeId> {
        Some(self.push_node(NodeData::new(tag)))
    }

    fn append(&self, parent: &NodeId, child: &NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        Self::detach(&mut nodes, *child);
        nodes[child.0].parent = Some(*parent);
        nodes[parent.0].children.push(*child);
    }

    fn remove(&self, node: &NodeId) {
        Self::detach(&mut self.nodes.borrow_mut(), *node);
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[node.0].classes;
        if !classes.iter().any(|existing| existing == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.nodes.borrow_mut()[node.0]
            .classes
            .retain(|existing| existing != class);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.nodes.borrow()[node.0]
            .classes
            .iter()
            .any(|existing| existing == class)
    }

    fn set_class_name(&self, node: &NodeId, class_name: &str) {
        self.nodes.borrow_mut()[node.0].classes =
            class_name.split_whitespace().map(str::to_string).collect();
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let nodes = self.nodes.borrow();
        let data = &nodes[node.0];
        if name == "class" {
            return Some(data.classes.join(" "));
        }
        data.attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        if name == "class" {
            self.set_class_name(node, value);
            return;
        }
        self.nodes.borrow_mut()[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn text(&self, node: &NodeId) -> String {
        self.nodes.borrow()[node.0].text.clone()
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        self.nodes.borrow_mut()[node.0].text = text.to_string();
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let styles = &mut nodes[node.0].styles;
        if value.is_empty() {
            styles.remove(property);
        } else {
            styles.insert(property.to_string(), value.to_string());
        }
    }

    fn set_css_text(&self, node: &NodeId, css: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let styles = &mut nodes[node.0].styles;
        styles.clear();
        for declaration in css.split(';') {
            if let Some((property, value)) = declaration.split_once(':') {
                let (property, value) = (property.trim(), value.trim());
                if !property.is_empty() && !value.is_empty() {
                    styles.insert(property.to_string(), value.to_string());
                }
            }
        }
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.nodes.borrow()[node.0].offset_top
    }

    fn offset_size(&self, node: &NodeId) -> (f64, f64) {
        self.nodes.borrow()[node.0].offset_size
    }

    fn bounding_box(&self, node: &NodeId) -> Rect {
        self.nodes.borrow()[node.0].bounding_box
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height.get()
    }

    fn smooth_scroll_into_view(&self, node: &NodeId, block: ScrollBlock) {
        self.scrolled_into_view.borrow_mut().push((*node, block));
    }

    fn listen(&self, target: Target<NodeId>, kind: EventKind, handler: Handler<NodeId>) {
        self.listeners.borrow_mut().push(Listener {
            target,
            kind,
            handler: Rc::new(RefCell::new(handler)),
        });
    }

    fn observe(
        &self,
        options: ObserverOptions,
        targets: &[NodeId],
        callback: IntersectionCallback<NodeId>,
    ) {
        self.observers.borrow_mut().push(ObserverSlot {
            options,
            watched: targets.to_vec(),
            callback: Rc::new(RefCell::new(callback)),
        });
    }
}

// --- Builder shorthand ------------------------------------------------------

/// Tag, id, classes and attributes parsed from `tag#id.class[name="value"]`.
#[derive(Debug, Default)]
struct Shorthand {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
}

fn parse_shorthand(input: &str) -> Shorthand {
    const MARKERS: [char; 3] = ['.', '#', '['];

    let mut shorthand = Shorthand::default();
    let input = input.trim();
    let tag_end = input.find(MARKERS).unwrap_or(input.len());
    if tag_end > 0 {
        shorthand.tag = Some(input[..tag_end].to_ascii_lowercase());
    }

    let mut rest = &input[tag_end..];
    while let Some(marker) = rest.chars().next() {
        if marker == '[' {
            let close = bracket_end(rest);
            shorthand.attributes.push(parse_attribute(&rest[1..close]));
            rest = rest.get(close + 1..).unwrap_or("");
            continue;
        }

        let body = &rest[1..];
        let end = body.find(MARKERS).unwrap_or(body.len());
        let name = body[..end].to_string();
        if marker == '.' {
            shorthand.classes.push(name);
        } else {
            shorthand.id = Some(name);
        }
        rest = &body[end..];
    }

    shorthand
}

/// Byte index of the `]` closing an attribute, skipping quoted text.
fn bracket_end(input: &str) -> usize {
    let mut quote = None;
    for (index, ch) in input.char_indices().skip(1) {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if open == ch => quote = None,
            (None, ']') => return index,
            _ => {}
        }
    }
    input.len()
}

fn parse_attribute(inner: &str) -> (String, String) {
    match inner.split_once('=') {
        Some((name, value)) => (
            name.trim().to_string(),
            value.trim().trim_matches('"').trim_matches('\'').to_string(),
        ),
        None => (inner.trim().to_string(), String::new()),
    }
}

// --- Markup for selector matching -------------------------------------------

fn write_markup(nodes: &[NodeData], node: NodeId, out: &mut String) {
    let data = &nodes[node.0];
    out.push('<');
    out.push_str(&data.tag);
    push_attribute(out, NODE_ATTRIBUTE, &node.0.to_string());
    if !data.classes.is_empty() {
        push_attribute(out, "class", &data.classes.join(" "));
    }
    for (name, value) in &data.attributes {
        push_attribute(out, name, value);
    }
    out.push('>');

    if VOID_TAGS.contains(&data.tag.as_str()) {
        return;
    }
    for child in &data.children {
        write_markup(nodes, *child, out);
    }
    out.push_str("</");
    out.push_str(&data.tag);
    out.push('>');
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}
