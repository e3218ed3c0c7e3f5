//! The slice of the document the page behaviour is allowed to touch.
//!
//! Components never reach the DOM directly; they go through [`Surface`], which
//! exposes only marker classes, attributes, inline styles, text, geometry,
//! node creation/removal, event listening and intersection observation.
//! [`memory::MemorySurface`] implements it headlessly for tests; the wasm
//! build implements it over `web-sys`.

pub mod memory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseEnter,
    MouseLeave,
    KeyDown,
    Scroll,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::KeyDown => "keydown",
            Self::Scroll => "scroll",
        }
    }

    /// Whether the event travels from the target up to the document.
    pub fn bubbles(self) -> bool {
        matches!(self, Self::Click | Self::KeyDown)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target<N> {
    Window,
    Document,
    Element(N),
}

/// Synthetic event handed to listeners.
#[derive(Clone, Debug)]
pub struct UiEvent<N> {
    pub kind: EventKind,
    pub target: Option<N>,
    pub key: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl<N> UiEvent<N> {
    pub fn new(kind: EventKind, target: Option<N>) -> Self {
        Self {
            kind,
            target,
            key: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type Handler<N> = Box<dyn FnMut(&mut UiEvent<N>)>;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionEntry<N> {
    pub target: N,
    pub is_intersecting: bool,
}

/// What an intersection callback wants done with the entry's target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Watch {
    Keep,
    Stop,
}

pub type IntersectionCallback<N> = Box<dyn FnMut(&IntersectionEntry<N>) -> Watch>;

pub trait Surface: 'static {
    type Node: Clone + PartialEq + 'static;

    fn body(&self) -> Self::Node;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn query(&self, selector: &str) -> Option<Self::Node>;

    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    fn query_within(&self, scope: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// True when `node` is `ancestor` or lies inside it.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    fn create_element(&self, tag: &str) -> Option<Self::Node>;

    fn append(&self, parent: &Self::Node, child: &Self::Node);

    /// Detaches the node; a node that is already detached is left alone.
    fn remove(&self, node: &Self::Node);

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn set_class_name(&self, node: &Self::Node, class_name: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn text(&self, node: &Self::Node) -> String;

    fn set_text(&self, node: &Self::Node, text: &str);

    /// Sets one inline style property; an empty value clears it.
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Replaces the whole inline style declaration.
    fn set_css_text(&self, node: &Self::Node, css: &str);

    fn offset_top(&self, node: &Self::Node) -> f64;

    /// Rendered `(width, height)` of the node.
    fn offset_size(&self, node: &Self::Node) -> (f64, f64);

    fn bounding_box(&self, node: &Self::Node) -> Rect;

    fn scroll_y(&self) -> f64;

    fn viewport_height(&self) -> f64;

    fn smooth_scroll_into_view(&self, node: &Self::Node, block: ScrollBlock);

    fn listen(&self, target: Target<Self::Node>, kind: EventKind, handler: Handler<Self::Node>);

    fn observe(
        &self,
        options: ObserverOptions,
        targets: &[Self::Node],
        callback: IntersectionCallback<Self::Node>,
    );
}
