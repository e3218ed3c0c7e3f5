//! Scroll-linked state: active nav link, hero/particle parallax, the scroll
//! indicator, and smooth in-page anchor navigation.

use std::rc::Rc;

use crate::menu::NAV_LINK_SELECTOR;
use crate::page::Context;
use crate::particles::PARTICLE_SELECTOR;
use crate::surface::{EventKind, ScrollBlock, Surface, Target, UiEvent};

const SECTION_SELECTOR: &str = ".content-section";
const ANCHOR_SELECTOR: &str = r##"a[href^="#"]"##;
const HERO_SELECTOR: &str = ".hero";
const INDICATOR_SELECTOR: &str = ".scroll-indicator";
const MAIN_CONTENT_SELECTOR: &str = ".main-content";
const ACTIVE_CLASS: &str = "active";

/// A section counts as current once scrolled to within this many pixels of it.
pub const SECTION_ACTIVATION_OFFSET: f64 = 200.0;
const HERO_PARALLAX_FACTOR: f64 = 0.1;
const INDICATOR_HIDE_AFTER: f64 = 100.0;

/// Id of the last section (in document order) whose top, less `offset`, has
/// been scrolled past.
pub fn active_section<'a, I>(sections: I, scroll_y: f64, offset: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    sections
        .into_iter()
        .filter(|(_, top)| scroll_y >= top - offset)
        .last()
        .map(|(id, _)| id)
}

/// Hero translation: tracks scroll while the hero is on screen, else resets.
pub fn hero_parallax(scroll_y: f64, viewport_height: f64) -> Option<f64> {
    (scroll_y < viewport_height).then_some(scroll_y * HERO_PARALLAX_FACTOR)
}

pub fn particle_speed(index: usize) -> f64 {
    0.2 + (index % 3) as f64 * 0.1
}

pub struct ScrollTracker<S: Surface> {
    ctx: Context<S>,
}

impl<S: Surface> ScrollTracker<S> {
    /// Registers the three scroll listeners plus anchor and indicator clicks.
    pub fn mount(ctx: &Context<S>) -> Rc<Self> {
        let tracker = Rc::new(Self { ctx: ctx.clone() });
        let surface = &ctx.surface;

        let this = tracker.clone();
        surface.listen(
            Target::Window,
            EventKind::Scroll,
            Box::new(move |_: &mut UiEvent<S::Node>| this.highlight_active_link()),
        );

        let this = tracker.clone();
        surface.listen(
            Target::Window,
            EventKind::Scroll,
            Box::new(move |_: &mut UiEvent<S::Node>| this.apply_parallax()),
        );

        let this = tracker.clone();
        surface.listen(
            Target::Window,
            EventKind::Scroll,
            Box::new(move |_: &mut UiEvent<S::Node>| this.update_indicator()),
        );

        for anchor in surface.query_all(ANCHOR_SELECTOR) {
            let this = tracker.clone();
            let href = surface.attribute(&anchor, "href").unwrap_or_default();
            surface.listen(
                Target::Element(anchor),
                EventKind::Click,
                Box::new(move |event: &mut UiEvent<S::Node>| {
                    event.prevent_default();
                    this.scroll_to_fragment(&href);
                }),
            );
        }

        match surface.query(INDICATOR_SELECTOR) {
            Some(indicator) => {
                let this = tracker.clone();
                surface.listen(
                    Target::Element(indicator),
                    EventKind::Click,
                    Box::new(move |_: &mut UiEvent<S::Node>| this.scroll_to_main_content()),
                );
            }
            None => ctx.skipped("scroll_indicator", INDICATOR_SELECTOR),
        }

        tracker
    }

    pub fn current_section(&self) -> Option<String> {
        let surface = &self.ctx.surface;
        let sections: Vec<(String, f64)> = surface
            .query_all(SECTION_SELECTOR)
            .iter()
            .map(|section| {
                (
                    surface.attribute(section, "id").unwrap_or_default(),
                    surface.offset_top(section),
                )
            })
            .collect();

        active_section(
            sections.iter().map(|(id, top)| (id.as_str(), *top)),
            surface.scroll_y(),
            SECTION_ACTIVATION_OFFSET,
        )
        .map(str::to_string)
    }

    pub fn highlight_active_link(&self) {
        let surface = &self.ctx.surface;
        // No qualifying section leaves a bare "#", which a top-of-page link matches.
        let wanted = format!("#{}", self.current_section().unwrap_or_default());

        for link in surface.query_all(NAV_LINK_SELECTOR) {
            surface.remove_class(&link, ACTIVE_CLASS);
            if surface.attribute(&link, "href").as_deref() == Some(wanted.as_str()) {
                surface.add_class(&link, ACTIVE_CLASS);
            }
        }
    }

    pub fn apply_parallax(&self) {
        let surface = &self.ctx.surface;
        let scrolled = surface.scroll_y();

        if let Some(hero) = surface.query(HERO_SELECTOR) {
            let transform = match hero_parallax(scrolled, surface.viewport_height()) {
                Some(offset) => format!("translateY({offset}px)"),
                None => "translateY(0)".to_string(),
            };
            surface.set_style(&hero, "transform", &transform);
        }

        for (index, particle) in surface.query_all(PARTICLE_SELECTOR).iter().enumerate() {
            let offset = scrolled * particle_speed(index);
            surface.set_style(particle, "transform", &format!("translateY({offset}px)"));
        }
    }

    pub fn update_indicator(&self) {
        let surface = &self.ctx.surface;
        if let Some(indicator) = surface.query(INDICATOR_SELECTOR) {
            let opacity = if surface.scroll_y() > INDICATOR_HIDE_AFTER {
                "0"
            } else {
                "1"
            };
            surface.set_style(&indicator, "opacity", opacity);
        }
    }

    /// Smoothly scrolls to the element named by `#fragment`; unknown or empty
    /// fragments do nothing.
    pub fn scroll_to_fragment(&self, href: &str) {
        let Some(id) = href.strip_prefix('#').filter(|id| !id.is_empty()) else {
            return;
        };
        let surface = &self.ctx.surface;
        if let Some(target) = surface.element_by_id(id) {
            surface.smooth_scroll_into_view(&target, ScrollBlock::Start);
        }
    }

    fn scroll_to_main_content(&self) {
        let surface = &self.ctx.surface;
        if let Some(main) = surface.query(MAIN_CONTENT_SELECTOR) {
            surface.smooth_scroll_into_view(&main, ScrollBlock::Start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;
    use crate::surface::memory::{MemorySurface, NodeId};

    #[test]
    fn last_qualifying_section_wins() {
        let sections = [("intro", 0.0), ("how", 800.0), ("defense", 1600.0)];

        assert_eq!(active_section(sections, 850.0, 200.0), Some("how"));
        assert_eq!(active_section(sections, 600.0, 200.0), Some("how"));
        assert_eq!(active_section(sections, 599.0, 200.0), Some("intro"));
        assert_eq!(active_section(sections, 1400.0, 200.0), Some("defense"));
    }

    #[test]
    fn no_section_qualifies_above_the_first_threshold() {
        let sections = [("intro", 500.0)];
        assert_eq!(active_section(sections, 0.0, 200.0), None);
    }

    #[test]
    fn hero_parallax_only_within_first_viewport() {
        assert_eq!(hero_parallax(400.0, 800.0), Some(40.0));
        assert_eq!(hero_parallax(800.0, 800.0), None);
    }

    #[test]
    fn particle_speeds_cycle_every_three() {
        assert_eq!(particle_speed(0), 0.2);
        assert_eq!(particle_speed(3), 0.2);
        assert!((particle_speed(1) - 0.3).abs() < 1e-9);
        assert!((particle_speed(5) - 0.4).abs() < 1e-9);
    }

    struct Fixture {
        surface: Rc<MemorySurface>,
        links: Vec<NodeId>,
        sections: Vec<NodeId>,
    }

    fn fixture() -> Fixture {
        let surface = Rc::new(MemorySurface::new());
        let body = surface.body();
        let nav = surface.add(body, "nav#nav-dropdown");
        let links = ["intro", "how", "defense"]
            .iter()
            .map(|id| surface.add(nav, &format!(r##"a.nav-link[href="#{id}"]"##)))
            .collect();
        let sections = [("intro", 0.0), ("how", 800.0), ("defense", 1600.0)]
            .iter()
            .map(|(id, top)| {
                let section = surface.add(body, &format!("section.content-section#{id}"));
                surface.set_offset_top(section, *top);
                section
            })
            .collect();

        let ctx = Context::new(surface.clone(), Rc::new(ManualScheduler::new()));
        ScrollTracker::mount(&ctx);
        Fixture {
            surface,
            links,
            sections,
        }
    }

    fn active_links(fixture: &Fixture) -> Vec<NodeId> {
        fixture
            .links
            .iter()
            .copied()
            .filter(|link| fixture.surface.has_class(link, ACTIVE_CLASS))
            .collect()
    }

    #[test]
    fn scrolling_marks_exactly_one_link() {
        let fixture = fixture();

        fixture.surface.scroll_to(850.0);
        assert_eq!(active_links(&fixture), vec![fixture.links[1]]);

        fixture.surface.scroll_to(1500.0);
        assert_eq!(active_links(&fixture), vec![fixture.links[2]]);

        fixture.surface.scroll_to(0.0);
        assert_eq!(active_links(&fixture), vec![fixture.links[0]]);
    }

    #[test]
    fn top_link_is_active_until_a_section_qualifies() {
        let surface = Rc::new(MemorySurface::new());
        let body = surface.body();
        let nav = surface.add(body, "nav#nav-dropdown");
        let top = surface.add(nav, r##"a.nav-link[href="#"]"##);
        let intro = surface.add(nav, r##"a.nav-link[href="#intro"]"##);
        let section = surface.add(body, "section.content-section#intro");
        surface.set_offset_top(section, 500.0);
        let ctx = Context::new(surface.clone(), Rc::new(ManualScheduler::new()));
        ScrollTracker::mount(&ctx);

        surface.scroll_to(0.0);
        assert!(surface.has_class(&top, ACTIVE_CLASS));
        assert!(!surface.has_class(&intro, ACTIVE_CLASS));

        surface.scroll_to(400.0);
        assert!(!surface.has_class(&top, ACTIVE_CLASS));
        assert!(surface.has_class(&intro, ACTIVE_CLASS));
    }

    #[test]
    fn anchor_click_prevents_default_and_scrolls_smoothly() {
        let fixture = fixture();

        let event = fixture.surface.click(fixture.links[2]);

        assert!(event.is_default_prevented());
        assert_eq!(
            fixture.surface.scrolled_into_view(),
            vec![(fixture.sections[2], ScrollBlock::Start)]
        );
    }

    #[test]
    fn dangling_or_bare_fragments_are_ignored() {
        let surface = Rc::new(MemorySurface::new());
        let body = surface.body();
        let bare = surface.add(body, r##"a[href="#"]"##);
        let dangling = surface.add(body, r##"a[href="#nowhere"]"##);
        let ctx = Context::new(surface.clone(), Rc::new(ManualScheduler::new()));
        ScrollTracker::mount(&ctx);

        assert!(surface.click(bare).is_default_prevented());
        assert!(surface.click(dangling).is_default_prevented());
        assert!(surface.scrolled_into_view().is_empty());
    }

    #[test]
    fn parallax_moves_hero_and_particles() {
        let surface = Rc::new(MemorySurface::new());
        let body = surface.body();
        let hero = surface.add(body, "section.hero");
        let container = surface.add(hero, "div#particles");
        let particles: Vec<_> = (0..3).map(|_| surface.add(container, "div.particle")).collect();
        surface.set_viewport_height(1000.0);
        let ctx = Context::new(surface.clone(), Rc::new(ManualScheduler::new()));
        ScrollTracker::mount(&ctx);

        surface.scroll_to(500.0);
        assert_eq!(surface.style(hero, "transform").as_deref(), Some("translateY(50px)"));
        assert_eq!(
            surface.style(particles[0], "transform").as_deref(),
            Some("translateY(100px)")
        );
        assert_eq!(
            surface.style(particles[2], "transform").as_deref(),
            Some("translateY(200px)")
        );

        surface.scroll_to(1200.0);
        assert_eq!(surface.style(hero, "transform").as_deref(), Some("translateY(0)"));
    }

    #[test]
    fn indicator_fades_after_first_hundred_pixels_and_links_to_content() {
        let surface = Rc::new(MemorySurface::new());
        let body = surface.body();
        let indicator = surface.add(body, "div.scroll-indicator");
        let main = surface.add(body, "main.main-content");
        let ctx = Context::new(surface.clone(), Rc::new(ManualScheduler::new()));
        ScrollTracker::mount(&ctx);

        surface.scroll_to(100.0);
        assert_eq!(surface.style(indicator, "opacity").as_deref(), Some("1"));
        surface.scroll_to(101.0);
        assert_eq!(surface.style(indicator, "opacity").as_deref(), Some("0"));

        surface.click(indicator);
        assert_eq!(surface.scrolled_into_view(), vec![(main, ScrollBlock::Start)]);
    }
}
