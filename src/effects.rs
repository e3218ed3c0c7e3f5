//! Small interaction effects that only touch inline styles and marker classes.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;

use crate::error::StartupError;
use crate::log::LogLevel;
use crate::overlay::{show_notification, NotificationKind};
use crate::page::Context;
use crate::surface::{EventKind, Surface, Target, UiEvent};

/// Inline styles applied on mouseenter and restored on mouseleave.
pub struct HoverStyle {
    pub name: &'static str,
    pub selector: &'static str,
    pub enter: &'static [(&'static str, &'static str)],
    pub leave: &'static [(&'static str, &'static str)],
}

pub static CARD_LIFT: HoverStyle = HoverStyle {
    name: "card_lift",
    selector: ".example-card, .action-card, .curiosity-item, .method-item, .language-item, .prop-item",
    enter: &[
        ("transform", "translateY(-15px) scale(1.03)"),
        ("box-shadow", "0 20px 40px var(--shadow-medium)"),
    ],
    leave: &[
        ("transform", "translateY(0) scale(1)"),
        ("box-shadow", "0 5px 20px var(--shadow-light)"),
    ],
};

pub static IMAGE_ZOOM: HoverStyle = HoverStyle {
    name: "image_zoom",
    selector: ".hover-zoom",
    enter: &[
        ("transform", "scale(1.1)"),
        ("filter", "brightness(1.2) contrast(1.1)"),
    ],
    leave: &[
        ("transform", "scale(1)"),
        ("filter", "brightness(1) contrast(1)"),
    ],
};

pub static ICON_GLOW: HoverStyle = HoverStyle {
    name: "icon_glow",
    selector: ".section-title i, .method-item i, .action-card i",
    enter: &[
        ("text-shadow", "0 0 20px var(--accent-primary)"),
        ("transform", "scale(1.2) rotate(10deg)"),
    ],
    leave: &[
        ("text-shadow", "none"),
        ("transform", "scale(1) rotate(0deg)"),
    ],
};

const CARD_CLICK_SELECTOR: &str = ".example-card, .action-card, .curiosity-item";
const CARD_PRESSED: &str = "scale(0.95)";
const CARD_PRESS_MS: u32 = 150;

const DEMO_WINDOW_SELECTOR: &str = ".demo-window";
const DEMO_PAYLOAD_SELECTOR: &str = ".demo-trojan";
const DEMO_INFECTED_FILTER: &str = "hue-rotate(120deg) saturate(2)";
const DEMO_INFECTED_TRANSFORM: &str = "scale(0.95)";
pub const DEMO_MS: u32 = 3000;

const HERO_TITLE_SELECTOR: &str = ".hero-title";
pub const TYPING_START_MS: u32 = 500;
pub const TYPING_STEP_MS: u32 = 100;

const HERO_IMAGE_SELECTOR: &str = ".hero-image";
pub const EASTER_EGG_CLICKS: u32 = 5;
const EASTER_EGG_MESSAGE: &str =
    "Easter Egg descoberto! 🎉 Você é um verdadeiro especialista em segurança!";

const ENTRANCE_DELAY_MS: u32 = 100;

fn apply_styles<S: Surface>(surface: &S, node: &S::Node, styles: &[(&str, &str)]) {
    for (property, value) in styles {
        surface.set_style(node, property, value);
    }
}

/// Wires `style` onto every matching element; returns how many were wired.
pub fn wire_hover_style<S: Surface>(ctx: &Context<S>, style: &'static HoverStyle) -> usize {
    let targets = ctx.surface.query_all(style.selector);
    for target in &targets {
        let surface = ctx.surface.clone();
        let node = target.clone();
        ctx.surface.listen(
            Target::Element(target.clone()),
            EventKind::MouseEnter,
            Box::new(move |_: &mut UiEvent<S::Node>| apply_styles(&*surface, &node, style.enter)),
        );

        let surface = ctx.surface.clone();
        let node = target.clone();
        ctx.surface.listen(
            Target::Element(target.clone()),
            EventKind::MouseLeave,
            Box::new(move |_: &mut UiEvent<S::Node>| apply_styles(&*surface, &node, style.leave)),
        );
    }

    if targets.is_empty() {
        ctx.skipped(style.name, style.selector);
    }
    targets.len()
}

/// Any click landing inside a card briefly presses it.
pub fn wire_card_press<S: Surface>(ctx: &Context<S>) {
    let press_ctx = ctx.clone();
    ctx.surface.listen(
        Target::Document,
        EventKind::Click,
        Box::new(move |event: &mut UiEvent<S::Node>| {
            let surface = &press_ctx.surface;
            let Some(card) = event
                .target
                .as_ref()
                .and_then(|target| surface.closest(target, CARD_CLICK_SELECTOR))
            else {
                return;
            };

            surface.set_style(&card, "transform", CARD_PRESSED);
            let surface = surface.clone();
            press_ctx.scheduler.set_timeout(
                CARD_PRESS_MS,
                Box::new(move || surface.set_style(&card, "transform", "")),
            );
        }),
    );
}

/// Clicking the demo window reveals the payload and tints the window for a
/// few seconds. Returns false when the demo markup is absent.
pub fn wire_demo<S: Surface>(ctx: &Context<S>) -> bool {
    let surface = &ctx.surface;
    let (Some(window), Some(payload)) = (
        surface.query(DEMO_WINDOW_SELECTOR),
        surface.query(DEMO_PAYLOAD_SELECTOR),
    ) else {
        ctx.skipped("interactive_demo", DEMO_WINDOW_SELECTOR);
        return false;
    };

    let demo_ctx = ctx.clone();
    let infected = window.clone();
    surface.listen(
        Target::Element(window),
        EventKind::Click,
        Box::new(move |_: &mut UiEvent<S::Node>| {
            let surface = demo_ctx.surface.clone();
            surface.add_class(&payload, "show");
            surface.set_style(&infected, "filter", DEMO_INFECTED_FILTER);
            surface.set_style(&infected, "transform", DEMO_INFECTED_TRANSFORM);

            let payload = payload.clone();
            let infected = infected.clone();
            demo_ctx.scheduler.set_timeout(
                DEMO_MS,
                Box::new(move || {
                    surface.remove_class(&payload, "show");
                    surface.set_style(&infected, "filter", "");
                    surface.set_style(&infected, "transform", "");
                }),
            );
        }),
    );
    true
}

/// Clears the hero title and types it back one character at a time.
pub fn start_typing<S: Surface>(ctx: &Context<S>) -> bool {
    let Some(title) = ctx.surface.query(HERO_TITLE_SELECTOR) else {
        ctx.skipped("typing_title", HERO_TITLE_SELECTOR);
        return false;
    };

    let text: Vec<char> = ctx.surface.text(&title).chars().collect();
    ctx.surface.set_text(&title, "");

    let typing_ctx = ctx.clone();
    ctx.scheduler.set_timeout(
        TYPING_START_MS,
        Box::new(move || type_next(typing_ctx, title, text, 0)),
    );
    true
}

fn type_next<S: Surface>(ctx: Context<S>, node: S::Node, text: Vec<char>, index: usize) {
    let Some(ch) = text.get(index).copied() else {
        return;
    };

    let mut shown = ctx.surface.text(&node);
    shown.push(ch);
    ctx.surface.set_text(&node, &shown);
    if index == 0 {
        ctx.surface.add_class(&node, "loaded");
    }

    let scheduler = ctx.scheduler.clone();
    scheduler.set_timeout(
        TYPING_STEP_MS,
        Box::new(move || type_next(ctx, node, text, index + 1)),
    );
}

/// Page entrance: start transparent and fade in shortly after startup.
pub fn fade_in_page<S: Surface>(ctx: &Context<S>) {
    let surface = ctx.surface.clone();
    let body = surface.body();
    surface.set_style(&body, "opacity", "0");
    surface.set_style(&body, "transition", "opacity 0.5s ease");
    ctx.scheduler.set_timeout(
        ENTRANCE_DELAY_MS,
        Box::new(move || surface.set_style(&body, "opacity", "1")),
    );
}

/// Counts clicks on the hero image; every fifth one earns a notification.
pub struct EasterEgg<S: Surface> {
    ctx: Context<S>,
    clicks: Cell<u32>,
}

impl<S: Surface> EasterEgg<S> {
    pub fn mount(ctx: &Context<S>) -> Result<Rc<Self>, StartupError> {
        let image = ctx.required(HERO_IMAGE_SELECTOR)?;
        let egg = Rc::new(Self {
            ctx: ctx.clone(),
            clicks: Cell::new(0),
        });

        let this = egg.clone();
        ctx.surface.listen(
            Target::Element(image),
            EventKind::Click,
            Box::new(move |_: &mut UiEvent<S::Node>| {
                this.record_click();
            }),
        );
        Ok(egg)
    }

    pub fn clicks(&self) -> u32 {
        self.clicks.get()
    }

    /// Returns true when this click completed the sequence.
    pub fn record_click(&self) -> bool {
        let clicks = self.clicks.get() + 1;
        if clicks < EASTER_EGG_CLICKS {
            self.clicks.set(clicks);
            return false;
        }

        self.clicks.set(0);
        show_notification(&self.ctx, EASTER_EGG_MESSAGE, NotificationKind::Success);
        self.ctx
            .logger
            .event(LogLevel::Info, "easter_egg_found", json!({ "clicks": clicks }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;
    use crate::surface::memory::MemorySurface;

    fn context() -> (Rc<MemorySurface>, Rc<ManualScheduler>, Context<MemorySurface>) {
        let surface = Rc::new(MemorySurface::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let ctx = Context::new(surface.clone(), scheduler.clone());
        (surface, scheduler, ctx)
    }

    #[test]
    fn card_lift_applies_and_reverts() {
        let (surface, _scheduler, ctx) = context();
        let card = surface.add(surface.body(), "div.example-card");
        assert_eq!(wire_hover_style(&ctx, &CARD_LIFT), 1);

        surface.hover(card);
        assert_eq!(
            surface.style(card, "transform").as_deref(),
            Some("translateY(-15px) scale(1.03)")
        );
        assert_eq!(
            surface.style(card, "box-shadow").as_deref(),
            Some("0 20px 40px var(--shadow-medium)")
        );

        surface.unhover(card);
        assert_eq!(surface.style(card, "transform").as_deref(), Some("translateY(0) scale(1)"));
    }

    #[test]
    fn image_zoom_sharpens_on_hover_and_settles_on_leave() {
        let (surface, _scheduler, ctx) = context();
        let image = surface.add(surface.body(), "img.hover-zoom");
        surface.add(surface.body(), "img.plain");
        assert_eq!(wire_hover_style(&ctx, &IMAGE_ZOOM), 1);

        surface.hover(image);
        assert_eq!(surface.style(image, "transform").as_deref(), Some("scale(1.1)"));
        assert_eq!(
            surface.style(image, "filter").as_deref(),
            Some("brightness(1.2) contrast(1.1)")
        );

        surface.unhover(image);
        assert_eq!(surface.style(image, "transform").as_deref(), Some("scale(1)"));
        assert_eq!(
            surface.style(image, "filter").as_deref(),
            Some("brightness(1) contrast(1)")
        );
    }

    #[test]
    fn icon_glow_targets_only_icons_inside_known_blocks() {
        let (surface, _scheduler, ctx) = context();
        let title = surface.add(surface.body(), "h2.section-title");
        let icon = surface.add(title, "i.fas.fa-bug");
        let stray = surface.add(surface.body(), "i.fas.fa-star");

        assert_eq!(wire_hover_style(&ctx, &ICON_GLOW), 1);
        surface.hover(icon);
        surface.hover(stray);

        assert_eq!(
            surface.style(icon, "transform").as_deref(),
            Some("scale(1.2) rotate(10deg)")
        );
        assert_eq!(surface.style(stray, "transform"), None);
    }

    #[test]
    fn clicking_inside_card_presses_it_briefly() {
        let (surface, scheduler, ctx) = context();
        let card = surface.add(surface.body(), "div.action-card");
        let label = surface.add(card, "p.label");
        wire_card_press(&ctx);

        surface.click(label);
        assert_eq!(surface.style(card, "transform").as_deref(), Some(CARD_PRESSED));

        scheduler.advance(150);
        assert_eq!(surface.style(card, "transform"), None);
    }

    #[test]
    fn demo_reverts_after_three_seconds() {
        let (surface, scheduler, ctx) = context();
        let window = surface.add(surface.body(), "div.demo-window");
        let payload = surface.add(window, "div.demo-trojan");
        assert!(wire_demo(&ctx));

        surface.click(window);
        assert!(surface.has_class(&payload, "show"));
        assert_eq!(surface.style(window, "filter").as_deref(), Some(DEMO_INFECTED_FILTER));

        scheduler.advance(u64::from(DEMO_MS));
        assert!(!surface.has_class(&payload, "show"));
        assert_eq!(surface.style(window, "filter"), None);
        assert_eq!(surface.style(window, "transform"), None);
    }

    #[test]
    fn demo_needs_both_window_and_payload() {
        let (surface, _scheduler, ctx) = context();
        surface.add(surface.body(), "div.demo-window");
        assert!(!wire_demo(&ctx));
    }

    #[test]
    fn typing_retypes_title_one_character_per_step() {
        let (surface, scheduler, ctx) = context();
        let title = surface.add(surface.body(), "h1.hero-title");
        surface.set_text(&title, "Cavalo");
        assert!(start_typing(&ctx));
        assert_eq!(surface.text(&title), "");

        scheduler.advance(499);
        assert_eq!(surface.text(&title), "");
        scheduler.advance(1);
        assert_eq!(surface.text(&title), "C");
        assert!(surface.has_class(&title, "loaded"));

        scheduler.advance(200);
        assert_eq!(surface.text(&title), "Cav");

        scheduler.advance(10_000);
        assert_eq!(surface.text(&title), "Cavalo");
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn entrance_fade_reaches_full_opacity() {
        let (surface, scheduler, ctx) = context();
        let body = surface.body();
        fade_in_page(&ctx);

        assert_eq!(surface.style(body, "opacity").as_deref(), Some("0"));
        scheduler.advance(100);
        assert_eq!(surface.style(body, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn fifth_click_notifies_and_resets() {
        let (surface, _scheduler, ctx) = context();
        let image = surface.add(surface.body(), "img.hero-image");
        let egg = EasterEgg::mount(&ctx).expect("hero image present");

        for _ in 0..4 {
            surface.click(image);
        }
        assert_eq!(egg.clicks(), 4);
        assert_eq!(surface.count(".notification"), 0);

        surface.click(image);
        assert_eq!(egg.clicks(), 0);
        assert_eq!(surface.count(".notification-success"), 1);

        surface.click(image);
        assert_eq!(egg.clicks(), 1);
        assert_eq!(surface.count(".notification"), 1);
    }
}
