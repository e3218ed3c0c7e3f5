use std::rc::Rc;

use serde_json::json;

use crate::error::StartupError;
use crate::log::LogLevel;
use crate::page::Context;
use crate::surface::{EventKind, Surface, Target, UiEvent};

const HAMBURGER_SELECTOR: &str = "#hamburger-menu";
const DROPDOWN_SELECTOR: &str = "#nav-dropdown";
pub const NAV_LINK_SELECTOR: &str = ".nav-link";
const ACTIVE_CLASS: &str = "active";
const ESCAPE_KEY: &str = "Escape";

/// Hamburger dropdown. Open state lives in the `active` class, set on the
/// hamburger and the panel together.
pub struct MenuController<S: Surface> {
    ctx: Context<S>,
    hamburger: S::Node,
    panel: S::Node,
}

impl<S: Surface> MenuController<S> {
    pub fn mount(ctx: &Context<S>) -> Result<Rc<Self>, StartupError> {
        let hamburger = ctx.required(HAMBURGER_SELECTOR)?;
        let panel = ctx.required(DROPDOWN_SELECTOR)?;
        let controller = Rc::new(Self {
            ctx: ctx.clone(),
            hamburger: hamburger.clone(),
            panel,
        });
        let surface = &ctx.surface;

        let this = controller.clone();
        surface.listen(
            Target::Element(hamburger),
            EventKind::Click,
            Box::new(move |event: &mut UiEvent<S::Node>| {
                event.stop_propagation();
                this.toggle();
            }),
        );

        let this = controller.clone();
        surface.listen(
            Target::Document,
            EventKind::Click,
            Box::new(move |event: &mut UiEvent<S::Node>| {
                if !this.is_inside(event.target.as_ref()) {
                    this.close();
                }
            }),
        );

        for link in surface.query_all(NAV_LINK_SELECTOR) {
            let this = controller.clone();
            surface.listen(
                Target::Element(link),
                EventKind::Click,
                Box::new(move |_: &mut UiEvent<S::Node>| this.close()),
            );
        }

        let this = controller.clone();
        surface.listen(
            Target::Document,
            EventKind::KeyDown,
            Box::new(move |event: &mut UiEvent<S::Node>| {
                if event.key.as_deref() == Some(ESCAPE_KEY) && this.is_open() {
                    this.close();
                }
            }),
        );

        Ok(controller)
    }

    pub fn is_open(&self) -> bool {
        self.ctx.surface.has_class(&self.panel, ACTIVE_CLASS)
    }

    /// Both markers present or both absent.
    pub fn markers_in_sync(&self) -> bool {
        let surface = &self.ctx.surface;
        surface.has_class(&self.hamburger, ACTIVE_CLASS) == surface.has_class(&self.panel, ACTIVE_CLASS)
    }

    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn open(&self) {
        if self.is_open() {
            return;
        }
        let surface = &self.ctx.surface;
        surface.add_class(&self.hamburger, ACTIVE_CLASS);
        surface.add_class(&self.panel, ACTIVE_CLASS);
        self.ctx.logger.event(LogLevel::Debug, "menu_opened", json!({}));
    }

    pub fn close(&self) {
        let surface = &self.ctx.surface;
        let was_open = self.is_open();
        surface.remove_class(&self.hamburger, ACTIVE_CLASS);
        surface.remove_class(&self.panel, ACTIVE_CLASS);
        if was_open {
            self.ctx.logger.event(LogLevel::Debug, "menu_closed", json!({}));
        }
    }

    fn is_inside(&self, target: Option<&S::Node>) -> bool {
        let Some(target) = target else {
            return false;
        };
        let surface = &self.ctx.surface;
        surface.contains(&self.panel, target) || surface.contains(&self.hamburger, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;
    use crate::surface::memory::{MemorySurface, NodeId};
    use proptest::prelude::*;

    struct Fixture {
        surface: Rc<MemorySurface>,
        controller: Rc<MenuController<MemorySurface>>,
        hamburger: NodeId,
        panel: NodeId,
        link: NodeId,
        outside: NodeId,
    }

    fn fixture() -> Fixture {
        let surface = Rc::new(MemorySurface::new());
        let body = surface.body();
        let hamburger = surface.add(body, "button#hamburger-menu");
        surface.add(hamburger, "span.bar");
        let panel = surface.add(body, "nav#nav-dropdown");
        let link = surface.add(panel, r##"a.nav-link[href="#o-que-e"]"##);
        let outside = surface.add(body, "main.main-content");

        let ctx = Context::new(surface.clone(), Rc::new(ManualScheduler::new()));
        let controller = MenuController::mount(&ctx).expect("menu markup present");
        Fixture {
            surface,
            controller,
            hamburger,
            panel,
            link,
            outside,
        }
    }

    #[test]
    fn hamburger_click_opens_without_reaching_outside_handler() {
        let fixture = fixture();

        let event = fixture.surface.click(fixture.hamburger);

        assert!(event.is_propagation_stopped());
        assert!(fixture.controller.is_open());
        assert!(fixture.surface.has_class(&fixture.hamburger, ACTIVE_CLASS));
    }

    #[test]
    fn click_on_hamburger_child_still_toggles() {
        let fixture = fixture();
        let bar = fixture.surface.children(fixture.hamburger)[0];

        fixture.surface.click(bar);
        assert!(fixture.controller.is_open());

        fixture.surface.click(bar);
        assert!(!fixture.controller.is_open());
    }

    #[test]
    fn outside_click_link_click_and_escape_each_close() {
        let fixture = fixture();

        fixture.controller.open();
        fixture.surface.click(fixture.outside);
        assert!(!fixture.controller.is_open());

        fixture.controller.open();
        fixture.surface.click(fixture.link);
        assert!(!fixture.controller.is_open());

        fixture.controller.open();
        fixture.surface.press_key("Escape");
        assert!(!fixture.controller.is_open());
    }

    #[test]
    fn click_inside_panel_keeps_menu_open() {
        let fixture = fixture();
        fixture.controller.open();

        fixture.surface.click(fixture.panel);

        assert!(fixture.controller.is_open());
    }

    #[test]
    fn other_keys_are_ignored() {
        let fixture = fixture();
        fixture.controller.open();

        fixture.surface.press_key("Enter");

        assert!(fixture.controller.is_open());
    }

    #[derive(Clone, Copy, Debug)]
    enum Trigger {
        Hamburger,
        Outside,
        Link,
        Escape,
    }

    proptest! {
        #[test]
        fn markers_stay_in_sync_for_any_trigger_sequence(
            triggers in prop::collection::vec(
                prop_oneof![
                    Just(Trigger::Hamburger),
                    Just(Trigger::Outside),
                    Just(Trigger::Link),
                    Just(Trigger::Escape),
                ],
                0..48,
            )
        ) {
            let fixture = fixture();
            let mut expected_open = false;

            for trigger in triggers {
                match trigger {
                    Trigger::Hamburger => {
                        fixture.surface.click(fixture.hamburger);
                        expected_open = !expected_open;
                    }
                    Trigger::Outside => {
                        fixture.surface.click(fixture.outside);
                        expected_open = false;
                    }
                    Trigger::Link => {
                        fixture.surface.click(fixture.link);
                        expected_open = false;
                    }
                    Trigger::Escape => {
                        fixture.surface.press_key("Escape");
                        expected_open = false;
                    }
                }

                prop_assert!(fixture.controller.markers_in_sync());
                prop_assert_eq!(fixture.controller.is_open(), expected_open);
            }
        }
    }
}
