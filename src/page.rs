//! Startup: builds every component once against a surface and a scheduler.

use std::rc::Rc;

use fastrand::Rng;
use serde_json::json;

use crate::animate::{observe_counters, observe_reveals};
use crate::effects::{
    fade_in_page, start_typing, wire_card_press, wire_demo, wire_hover_style, EasterEgg,
    CARD_LIFT, ICON_GLOW, IMAGE_ZOOM,
};
use crate::error::StartupError;
use crate::log::{LogLevel, Logger};
use crate::menu::MenuController;
use crate::overlay::Tooltips;
use crate::particles::spawn_particles;
use crate::schedule::Scheduler;
use crate::scroll::ScrollTracker;
use crate::surface::Surface;
use crate::theme::{PreferenceStore, ThemeController};

const LOG_LEVEL_ATTRIBUTE: &str = "data-log-level";

/// Shared handles every component holds.
pub struct Context<S: Surface> {
    pub surface: Rc<S>,
    pub scheduler: Rc<dyn Scheduler>,
    pub logger: Logger,
}

impl<S: Surface> Clone for Context<S> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            scheduler: self.scheduler.clone(),
            logger: self.logger,
        }
    }
}

impl<S: Surface> Context<S> {
    pub fn new(surface: Rc<S>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            surface,
            scheduler,
            logger: Logger::default(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn required(&self, selector: &'static str) -> Result<S::Node, StartupError> {
        self.surface
            .query(selector)
            .ok_or(StartupError::MissingElement(selector))
    }

    /// Notes an optional feature that found no markup to attach to.
    pub fn skipped(&self, feature: &str, selector: &str) {
        self.logger.event(
            LogLevel::Debug,
            "feature_skipped",
            json!({ "feature": feature, "selector": selector }),
        );
    }
}

/// Everything `Page::start` wired, kept alive for the page's lifetime.
pub struct Page<S: Surface> {
    ctx: Context<S>,
    pub theme: Rc<ThemeController<S>>,
    pub menu: Rc<MenuController<S>>,
    pub scroll: Rc<ScrollTracker<S>>,
    pub tooltips: Rc<Tooltips<S>>,
    pub easter_egg: Rc<EasterEgg<S>>,
    pub particles: usize,
    pub counters: usize,
    pub reveals: usize,
}

impl<S: Surface> Page<S> {
    /// Mounts components in page order. A missing required element stops
    /// startup at that component; everything mounted before it stays live.
    pub fn start(
        surface: Rc<S>,
        scheduler: Rc<dyn Scheduler>,
        store: Rc<dyn PreferenceStore>,
        rng: &mut Rng,
    ) -> Result<Self, StartupError> {
        let level = LogLevel::parse_or_default(
            surface
                .attribute(&surface.body(), LOG_LEVEL_ATTRIBUTE)
                .as_deref(),
        );
        let ctx = Context::new(surface, scheduler).with_logger(Logger::new(level));

        let theme = ThemeController::mount(&ctx, store)?;
        let menu = MenuController::mount(&ctx)?;
        let scroll = ScrollTracker::mount(&ctx);
        let particles = spawn_particles(&ctx, rng);
        let counters = observe_counters(&ctx);
        let reveals = observe_reveals(&ctx);
        let tooltips = Tooltips::mount(&ctx);

        for style in [&CARD_LIFT, &IMAGE_ZOOM, &ICON_GLOW] {
            wire_hover_style(&ctx, style);
        }
        wire_card_press(&ctx);
        wire_demo(&ctx);
        start_typing(&ctx);
        fade_in_page(&ctx);
        let easter_egg = EasterEgg::mount(&ctx)?;

        ctx.logger.event(
            LogLevel::Info,
            "page_started",
            json!({
                "theme": theme.current().as_str(),
                "particles": particles,
                "counters": counters,
                "reveals": reveals,
            }),
        );

        Ok(Self {
            ctx,
            theme,
            menu,
            scroll,
            tooltips,
            easter_egg,
            particles,
            counters,
            reveals,
        })
    }

    pub fn context(&self) -> &Context<S> {
        &self.ctx
    }
}
