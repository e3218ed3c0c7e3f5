//! Client-side behaviour for the trojan horse awareness page, plus a small
//! native server that hosts the built page during development.

pub mod animate;
pub mod effects;
pub mod error;
pub mod log;
pub mod menu;
pub mod overlay;
pub mod page;
pub mod particles;
pub mod schedule;
pub mod scroll;
pub mod surface;
pub mod theme;

#[cfg(target_arch = "wasm32")]
pub mod frontend;

#[cfg(not(target_arch = "wasm32"))]
pub mod backend;

pub use error::StartupError;
pub use page::{Context, Page};
pub use schedule::{ManualScheduler, Scheduler};
pub use surface::memory::MemorySurface;
pub use surface::Surface;
pub use theme::{MemoryStore, PreferenceStore, Theme};
