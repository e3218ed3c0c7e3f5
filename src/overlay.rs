//! Short-lived nodes attached to the body: tooltips, notifications and the
//! loading spinner. Each one owns its timers and removes itself.

use std::cell::Cell;
use std::rc::Rc;

use crate::page::Context;
use crate::schedule::TimerHandle;
use crate::surface::{EventKind, Rect, Surface, Target, UiEvent};

const TOOLTIP_TRIGGER_SELECTOR: &str = "[data-tooltip]";
const TOOLTIP_ATTRIBUTE: &str = "data-tooltip";
pub const TOOLTIP_SELECTOR: &str = ".tooltip";
const TOOLTIP_GAP_PX: f64 = 5.0;
const TOOLTIP_SHOW_DELAY_MS: u32 = 10;
const TOOLTIP_CSS: &str = "position: absolute; background: var(--accent-secondary); \
    color: white; padding: 8px 12px; border-radius: 6px; font-size: 14px; \
    z-index: 1000; pointer-events: none; opacity: 0; transition: opacity 0.3s ease;";

pub const NOTIFICATION_ENTER_MS: u32 = 100;
pub const NOTIFICATION_HOLD_MS: u32 = 3000;
pub const NOTIFICATION_EXIT_MS: u32 = 300;
const NOTIFICATION_HIDDEN: &str = "translateX(100%)";
const NOTIFICATION_SHOWN: &str = "translateX(0)";
const NOTIFICATION_CSS: &str = "position: fixed; top: 20px; right: 20px; \
    background: var(--accent-primary); color: white; padding: 1rem 2rem; \
    border-radius: 10px; box-shadow: 0 10px 30px var(--shadow-medium); \
    z-index: 10000; transform: translateX(100%); transition: transform 0.3s ease;";

pub const LOADING_MS: u32 = 2000;
const LOADING_CSS: &str = "position: fixed; top: 50%; left: 50%; \
    transform: translate(-50%, -50%); z-index: 9999;";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

/// Top-left corner for a tooltip of `size` centred above `anchor`.
pub fn tooltip_position(anchor: Rect, size: (f64, f64)) -> (f64, f64) {
    let (width, height) = size;
    (
        anchor.left + anchor.width / 2.0 - width / 2.0,
        anchor.top - height - TOOLTIP_GAP_PX,
    )
}

/// Hover tooltips for every `[data-tooltip]` element. At most one tooltip is
/// attached at a time.
pub struct Tooltips<S: Surface> {
    ctx: Context<S>,
    pending_show: Cell<Option<TimerHandle>>,
}

impl<S: Surface> Tooltips<S> {
    pub fn mount(ctx: &Context<S>) -> Rc<Self> {
        let tooltips = Rc::new(Self {
            ctx: ctx.clone(),
            pending_show: Cell::new(None),
        });

        for trigger in ctx.surface.query_all(TOOLTIP_TRIGGER_SELECTOR) {
            let this = tooltips.clone();
            ctx.surface.listen(
                Target::Element(trigger.clone()),
                EventKind::MouseEnter,
                Box::new(move |event: &mut UiEvent<S::Node>| {
                    if let Some(anchor) = event.target.as_ref() {
                        this.show(anchor);
                    }
                }),
            );

            let this = tooltips.clone();
            ctx.surface.listen(
                Target::Element(trigger),
                EventKind::MouseLeave,
                Box::new(move |_: &mut UiEvent<S::Node>| this.hide()),
            );
        }

        tooltips
    }

    pub fn show(&self, anchor: &S::Node) -> Option<S::Node> {
        self.hide();

        let surface = &self.ctx.surface;
        let text = surface.attribute(anchor, TOOLTIP_ATTRIBUTE).unwrap_or_default();
        let tooltip = surface.create_element("div")?;
        surface.set_class_name(&tooltip, "tooltip");
        surface.set_text(&tooltip, &text);
        surface.set_css_text(&tooltip, TOOLTIP_CSS);
        surface.append(&surface.body(), &tooltip);

        let (left, top) = tooltip_position(surface.bounding_box(anchor), surface.offset_size(&tooltip));
        surface.set_style(&tooltip, "left", &format!("{left}px"));
        surface.set_style(&tooltip, "top", &format!("{top}px"));

        let fade_surface = surface.clone();
        let fading = tooltip.clone();
        let handle = self.ctx.scheduler.set_timeout(
            TOOLTIP_SHOW_DELAY_MS,
            Box::new(move || fade_surface.add_class(&fading, "show")),
        );
        self.pending_show.set(Some(handle));

        Some(tooltip)
    }

    pub fn hide(&self) {
        if let Some(handle) = self.pending_show.take() {
            self.ctx.scheduler.cancel(handle);
        }
        let surface = &self.ctx.surface;
        if let Some(tooltip) = surface.query(TOOLTIP_SELECTOR) {
            surface.remove(&tooltip);
        }
    }
}

/// Slides a banner in from the right, holds it, slides it out and removes it.
/// Banners are independent; several may be on screen at once.
pub fn show_notification<S: Surface>(
    ctx: &Context<S>,
    message: &str,
    kind: NotificationKind,
) -> Option<S::Node> {
    let surface = &ctx.surface;
    let banner = surface.create_element("div")?;
    surface.set_class_name(&banner, &format!("notification notification-{}", kind.as_str()));
    surface.set_text(&banner, message);
    surface.set_css_text(&banner, NOTIFICATION_CSS);
    surface.append(&surface.body(), &banner);

    {
        let surface = surface.clone();
        let banner = banner.clone();
        ctx.scheduler.set_timeout(
            NOTIFICATION_ENTER_MS,
            Box::new(move || surface.set_style(&banner, "transform", NOTIFICATION_SHOWN)),
        );
    }
    {
        let surface = surface.clone();
        let scheduler = ctx.scheduler.clone();
        let banner = banner.clone();
        ctx.scheduler.set_timeout(
            NOTIFICATION_HOLD_MS,
            Box::new(move || {
                surface.set_style(&banner, "transform", NOTIFICATION_HIDDEN);
                scheduler.set_timeout(
                    NOTIFICATION_EXIT_MS,
                    Box::new(move || surface.remove(&banner)),
                );
            }),
        );
    }

    Some(banner)
}

/// Centred spinner that removes itself; there is no manual dismissal.
pub fn show_loading<S: Surface>(ctx: &Context<S>) -> Option<S::Node> {
    let surface = &ctx.surface;
    let spinner = surface.create_element("div")?;
    surface.set_class_name(&spinner, "loading");
    surface.set_css_text(&spinner, LOADING_CSS);
    surface.append(&surface.body(), &spinner);

    let surface = surface.clone();
    let removing = spinner.clone();
    ctx.scheduler
        .set_timeout(LOADING_MS, Box::new(move || surface.remove(&removing)));

    Some(spinner)
}
