//! Browser bindings: the page surface, timers and storage over `web-sys`.

use std::rc::Rc;

use fastrand::Rng;
use js_sys::{Array, Math};
use serde_json::json;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, Document, Element, Event, EventTarget, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, Storage, Window,
};

use crate::error::StartupError;
use crate::log::{LogLevel, Logger};
use crate::page::Page;
use crate::schedule::{Scheduler, Task, TimerHandle};
use crate::surface::{
    EventKind, Handler, IntersectionCallback, IntersectionEntry, ObserverOptions, Rect,
    ScrollBlock, Surface, Target, UiEvent, Watch,
};
use crate::theme::PreferenceStore;

fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

/// Theme preference in the origin's local storage. Storage that is disabled
/// or full behaves like an empty store.
pub struct LocalStore;

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, value);
        }
    }
}

pub struct WebScheduler {
    window: Window,
}

impl WebScheduler {
    pub fn new() -> Result<Self, StartupError> {
        let window = window().ok_or(StartupError::MissingGlobal("window"))?;
        Ok(Self { window })
    }
}

impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay_ms: u32, task: Task) -> TimerHandle {
        let callback = Closure::once_into_js(move || task());
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                i32::try_from(delay_ms).unwrap_or(i32::MAX),
            )
            .unwrap_or(0);
        TimerHandle::Timeout(id)
    }

    fn request_frame(&self, task: Task) -> TimerHandle {
        let callback = Closure::once_into_js(move || task());
        let id = self
            .window
            .request_animation_frame(callback.unchecked_ref())
            .unwrap_or(0);
        TimerHandle::Frame(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        match handle {
            TimerHandle::Timeout(id) => self.window.clear_timeout_with_handle(id),
            TimerHandle::Frame(id) => {
                let _ = self.window.cancel_animation_frame(id);
            }
        }
    }
}

pub struct WebSurface {
    window: Window,
    document: Document,
    body: Element,
}

impl WebSurface {
    pub fn new() -> Result<Self, StartupError> {
        let window = window().ok_or(StartupError::MissingGlobal("window"))?;
        let document = window
            .document()
            .ok_or(StartupError::MissingGlobal("document"))?;
        let body: Element = document
            .body()
            .ok_or(StartupError::MissingGlobal("body"))?
            .into();
        Ok(Self {
            window,
            document,
            body,
        })
    }

    fn event_target(&self, target: Target<Element>) -> EventTarget {
        match target {
            Target::Window => self.window.clone().into(),
            Target::Document => self.document.clone().into(),
            Target::Element(element) => element.into(),
        }
    }
}

fn html(node: &Element) -> Option<&HtmlElement> {
    node.dyn_ref::<HtmlElement>()
}

impl Surface for WebSurface {
    type Node = Element;

    fn body(&self) -> Element {
        self.body.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        ancestor.contains(Some(node.as_ref()))
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append(&self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_class_name(&self, node: &Element, class_name: &str) {
        node.set_class_name(class_name);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        let Some(element) = html(node) else {
            return;
        };
        let style = element.style();
        if value.is_empty() {
            let _ = style.remove_property(property);
        } else {
            let _ = style.set_property(property, value);
        }
    }

    fn set_css_text(&self, node: &Element, css: &str) {
        if let Some(element) = html(node) {
            element.style().set_css_text(css);
        }
    }

    fn offset_top(&self, node: &Element) -> f64 {
        html(node).map_or(0.0, |element| f64::from(element.offset_top()))
    }

    fn offset_size(&self, node: &Element) -> (f64, f64) {
        html(node).map_or((0.0, 0.0), |element| {
            (
                f64::from(element.offset_width()),
                f64::from(element.offset_height()),
            )
        })
    }

    fn bounding_box(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    fn smooth_scroll_into_view(&self, node: &Element, block: ScrollBlock) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(match block {
            ScrollBlock::Start => ScrollLogicalPosition::Start,
        });
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn listen(&self, target: Target<Element>, kind: EventKind, mut handler: Handler<Element>) {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let target = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok());
            let mut ui_event = UiEvent::new(kind, target);
            if let Some(keyboard) = event.dyn_ref::<KeyboardEvent>() {
                ui_event = ui_event.with_key(keyboard.key());
            }

            handler(&mut ui_event);

            if ui_event.is_default_prevented() {
                event.prevent_default();
            }
            if ui_event.is_propagation_stopped() {
                event.stop_propagation();
            }
        });

        let _ = self
            .event_target(target)
            .add_event_listener_with_callback(kind.as_str(), callback.as_ref().unchecked_ref());
        // Listeners live as long as the page.
        callback.forget();
    }

    fn observe(
        &self,
        options: ObserverOptions,
        targets: &[Element],
        mut callback: IntersectionCallback<Element>,
    ) {
        let on_intersect = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let target = entry.target();
                    let watch = callback(&IntersectionEntry {
                        target: target.clone(),
                        is_intersecting: entry.is_intersecting(),
                    });
                    if watch == Watch::Stop {
                        observer.unobserve(&target);
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(options.root_margin);
        let Ok(observer) =
            IntersectionObserver::new_with_options(on_intersect.as_ref().unchecked_ref(), &init)
        else {
            return;
        };
        for target in targets {
            observer.observe(target);
        }
        on_intersect.forget();
    }
}

pub fn report_startup_failure(error: &StartupError) {
    Logger::default().event(
        LogLevel::Warn,
        "startup_failed",
        json!({ "error": error.to_string() }),
    );
}

fn start() -> Result<(), StartupError> {
    let surface = Rc::new(WebSurface::new()?);
    let scheduler = Rc::new(WebScheduler::new()?);
    let mut rng = Rng::with_seed((Math::random() * u64::MAX as f64) as u64);

    // Controllers stay reachable through their registered handlers.
    Page::start(surface, scheduler, Rc::new(LocalStore), &mut rng)?;
    Ok(())
}

/// Wires the page now, or once the document has finished parsing.
pub fn run() -> Result<(), StartupError> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let document = window()
        .and_then(|w| w.document())
        .ok_or(StartupError::MissingGlobal("document"))?;

    if document.ready_state() != "loading" {
        return start();
    }

    let deferred = Closure::once_into_js(move || {
        if let Err(error) = start() {
            report_startup_failure(&error);
        }
    });
    document
        .add_event_listener_with_callback("DOMContentLoaded", deferred.unchecked_ref())
        .map_err(|_| StartupError::MissingGlobal("document"))
}
