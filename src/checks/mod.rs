pub mod desktop;
pub mod drivers;
pub mod health;
pub mod security;

use crate::check::{run_category, Category, CategoryKind, Probe, ProbeCtx};

/// Run one of the four fixed probe groups.
pub fn run(kind: CategoryKind, ctx: &ProbeCtx) -> Category {
    let probes: Vec<Probe> = match kind {
        CategoryKind::Health => health::probes(),
        CategoryKind::Drivers => drivers::probes(),
        CategoryKind::Security => security::probes(),
        CategoryKind::Desktop => desktop::probes(),
    };
    run_category(kind, &probes, ctx)
}
