use fastrand::Rng;

use crate::page::Context;
use crate::surface::Surface;

pub const PARTICLE_COUNT: usize = 50;
pub const PARTICLE_SELECTOR: &str = ".particle";
const CONTAINER_SELECTOR: &str = "#particles";

/// Randomised placement and timing for one decorative particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleLayout {
    pub left_pct: f64,
    pub top_pct: f64,
    pub size_px: f64,
    pub duration_s: f64,
    pub delay_s: f64,
}

impl ParticleLayout {
    pub fn random(rng: &mut Rng) -> Self {
        Self {
            left_pct: rng.f64() * 100.0,
            top_pct: rng.f64() * 100.0,
            size_px: rng.f64() * 4.0 + 2.0,
            duration_s: rng.f64() * 6.0 + 3.0,
            delay_s: rng.f64() * 3.0,
        }
    }

    fn styles(&self) -> [(&'static str, String); 6] {
        let size = format!("{}px", self.size_px);
        [
            ("left", format!("{}%", self.left_pct)),
            ("top", format!("{}%", self.top_pct)),
            ("width", size.clone()),
            ("height", size),
            ("animation-duration", format!("{}s", self.duration_s)),
            ("animation-delay", format!("{}s", self.delay_s)),
        ]
    }
}

/// Fills `#particles` with the decorative field. Returns how many were made;
/// zero when the container is absent.
pub fn spawn_particles<S: Surface>(ctx: &Context<S>, rng: &mut Rng) -> usize {
    let surface = &ctx.surface;
    let Some(container) = surface.query(CONTAINER_SELECTOR) else {
        ctx.skipped("particles", CONTAINER_SELECTOR);
        return 0;
    };

    let mut created = 0;
    for _ in 0..PARTICLE_COUNT {
        let Some(particle) = surface.create_element("div") else {
            continue;
        };
        surface.set_class_name(&particle, "particle");
        for (property, value) in ParticleLayout::random(rng).styles() {
            surface.set_style(&particle, property, &value);
        }
        surface.append(&container, &particle);
        created += 1;
    }
    created
}
