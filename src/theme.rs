use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::json;

use crate::error::StartupError;
use crate::log::LogLevel;
use crate::page::Context;
use crate::surface::{EventKind, Surface, Target, UiEvent};

pub const THEME_KEY: &str = "theme";
const THEME_ATTRIBUTE: &str = "data-theme";
const TOGGLE_SELECTOR: &str = "#theme-toggle";
const ICON_SELECTOR: &str = "#theme-toggle i";
const TRANSITION_STYLE: &str = "all 0.3s ease";
const TRANSITION_MS: u32 = 300;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon shown on the toggle while this theme is active.
    pub fn icon_class(self) -> &'static str {
        match self {
            Self::Light => "fas fa-moon",
            Self::Dark => "fas fa-sun",
        }
    }
}

/// Durable key-value slot for user preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);
}

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.set(key, value);
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

/// Stored theme, or dark when nothing usable is stored.
pub fn initial_theme(store: &dyn PreferenceStore) -> Theme {
    store
        .get(THEME_KEY)
        .as_deref()
        .and_then(Theme::parse)
        .unwrap_or_default()
}

pub struct ThemeController<S: Surface> {
    ctx: Context<S>,
    store: Rc<dyn PreferenceStore>,
    icon: S::Node,
    current: Cell<Theme>,
}

impl<S: Surface> ThemeController<S> {
    pub fn mount(
        ctx: &Context<S>,
        store: Rc<dyn PreferenceStore>,
    ) -> Result<Rc<Self>, StartupError> {
        let toggle = ctx.required(TOGGLE_SELECTOR)?;
        let icon = ctx.required(ICON_SELECTOR)?;

        let controller = Rc::new(Self {
            ctx: ctx.clone(),
            current: Cell::new(initial_theme(store.as_ref())),
            store,
            icon,
        });
        controller.apply(controller.current());

        let this = controller.clone();
        ctx.surface.listen(
            Target::Element(toggle),
            EventKind::Click,
            Box::new(move |_: &mut UiEvent<S::Node>| {
                this.toggle();
            }),
        );

        Ok(controller)
    }

    pub fn current(&self) -> Theme {
        self.current.get()
    }

    pub fn apply(&self, theme: Theme) {
        let surface = &self.ctx.surface;
        surface.set_attribute(&surface.body(), THEME_ATTRIBUTE, theme.as_str());
        surface.set_class_name(&self.icon, theme.icon_class());
        self.current.set(theme);
    }

    pub fn toggle(&self) -> Theme {
        let next = self.current().toggled();
        self.apply(next);
        self.store.set(THEME_KEY, next.as_str());

        let surface = self.ctx.surface.clone();
        let body = surface.body();
        surface.set_style(&body, "transition", TRANSITION_STYLE);
        self.ctx.scheduler.set_timeout(
            TRANSITION_MS,
            Box::new(move || surface.set_style(&body, "transition", "")),
        );

        self.ctx
            .logger
            .event(LogLevel::Info, "theme_toggled", json!({ "theme": next.as_str() }));
        next
    }
}
