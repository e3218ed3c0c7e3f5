//! Viewport-triggered animations: one-shot count-up counters and the
//! persistent reveal marker.

use serde_json::json;

use crate::log::LogLevel;
use crate::page::Context;
use crate::schedule::FRAME_INTERVAL_MS;
use crate::surface::{IntersectionEntry, ObserverOptions, Surface, Watch};

pub const COUNTER_SELECTOR: &str = ".stat-number";
const COUNTER_TARGET_ATTRIBUTE: &str = "data-target";
pub const COUNTER_DURATION_MS: f64 = 2000.0;
pub const COUNTER_OBSERVER: ObserverOptions = ObserverOptions {
    threshold: 0.5,
    root_margin: "0px 0px -50px 0px",
};

pub const REVEAL_SELECTOR: &str = ".content-card, .example-card, .method-item, .action-card, .curiosity-item, .language-item, .prop-item";
const REVEAL_PENDING_CLASS: &str = "animate-on-scroll";
const REVEAL_DONE_CLASS: &str = "animated";
pub const REVEAL_OBSERVER: ObserverOptions = ObserverOptions {
    threshold: 0.1,
    root_margin: "0px 0px -50px 0px",
};

const NOT_A_NUMBER: &str = "NaN";

/// Leading decimal integer of `raw` (after whitespace and an optional sign);
/// trailing junk is ignored, no digits at all gives `None`.
pub fn parse_integer_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let sign_len = trimmed.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }

    let digits_len = unsigned
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_len == 0 {
        return None;
    }

    // Over-long digit runs clamp instead of failing.
    let negative = trimmed.starts_with('-');
    let value = unsigned.as_bytes()[..digits_len]
        .iter()
        .fold(0i64, |acc: i64, digit: &u8| {
            let digit = i64::from(digit - b'0');
            if negative {
                acc.saturating_mul(10).saturating_sub(digit)
            } else {
                acc.saturating_mul(10).saturating_add(digit)
            }
        });
    Some(value)
}

/// `1234567` → `1,234,567`.
pub fn format_grouped(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountStep {
    Running(i64),
    Finished(i64),
}

/// Frame-stepped count from zero towards `target`.
#[derive(Clone, Copy, Debug)]
pub struct CountUp {
    target: i64,
    increment: f64,
    value: f64,
}

impl CountUp {
    pub fn new(target: i64, duration_ms: f64) -> Self {
        let frames = duration_ms / f64::from(FRAME_INTERVAL_MS);
        Self {
            target,
            increment: target as f64 / frames,
            value: 0.0,
        }
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn step(&mut self) -> CountStep {
        self.value += self.increment;
        if self.value < self.target as f64 {
            CountStep::Running(self.value.floor() as i64)
        } else {
            CountStep::Finished(self.target)
        }
    }
}

/// Runs the first step now and each further step on the next animation frame.
/// A missing target shows `NaN` once and stops.
pub fn animate_counter<S: Surface>(
    ctx: &Context<S>,
    node: S::Node,
    target: Option<i64>,
    duration_ms: f64,
) {
    match target {
        Some(target) => run_counter_frame(ctx.clone(), node, CountUp::new(target, duration_ms)),
        None => ctx.surface.set_text(&node, NOT_A_NUMBER),
    }
}

fn run_counter_frame<S: Surface>(ctx: Context<S>, node: S::Node, mut count: CountUp) {
    match count.step() {
        CountStep::Running(value) => {
            ctx.surface.set_text(&node, &format_grouped(value));
            let scheduler = ctx.scheduler.clone();
            scheduler.request_frame(Box::new(move || run_counter_frame(ctx, node, count)));
        }
        CountStep::Finished(target) => ctx.surface.set_text(&node, &format_grouped(target)),
    }
}

/// Starts each `.stat-number` counting the first time it scrolls into view.
pub fn observe_counters<S: Surface>(ctx: &Context<S>) -> usize {
    let counters = ctx.surface.query_all(COUNTER_SELECTOR);
    let animate_ctx = ctx.clone();

    ctx.surface.observe(
        COUNTER_OBSERVER,
        &counters,
        Box::new(move |entry: &IntersectionEntry<S::Node>| {
            if !entry.is_intersecting {
                return Watch::Keep;
            }

            let raw = animate_ctx
                .surface
                .attribute(&entry.target, COUNTER_TARGET_ATTRIBUTE)
                .unwrap_or_default();
            let target = parse_integer_prefix(&raw);
            animate_ctx
                .logger
                .event(LogLevel::Debug, "counter_started", json!({ "target": target }));
            animate_counter(&animate_ctx, entry.target.clone(), target, COUNTER_DURATION_MS);
            Watch::Stop
        }),
    );

    counters.len()
}

/// Marks reveal targets pending, then `animated` whenever they intersect.
pub fn observe_reveals<S: Surface>(ctx: &Context<S>) -> usize {
    let targets = ctx.surface.query_all(REVEAL_SELECTOR);
    for target in &targets {
        ctx.surface.add_class(target, REVEAL_PENDING_CLASS);
    }

    let surface = ctx.surface.clone();
    ctx.surface.observe(
        REVEAL_OBSERVER,
        &targets,
        Box::new(move |entry: &IntersectionEntry<S::Node>| {
            if entry.is_intersecting {
                surface.add_class(&entry.target, REVEAL_DONE_CLASS);
            }
            Watch::Keep
        }),
    );

    targets.len()
}
