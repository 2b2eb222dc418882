//! The fixed-step tick: rebuild index, resolve, integrate, settle, contain.

use flux_core::{ParticleStore, SimConfig};
use flux_physics::{
    IntegrationReport, QuadTree, ResolveReport, TreeStats, contain, integrate_all, resolve, settle,
};
use tracing::trace_span;

/// Everything one tick measured.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub tree: TreeStats,
    pub resolve: ResolveReport,
    pub integration: IntegrationReport,
    /// Pairs pushed apart after integration
    pub settled: usize,
    /// Particles put back inside the world
    pub wall_hits: usize,
}

impl TickReport {
    /// Non-finite values replaced during the tick.
    pub fn sanitized(&self) -> usize {
        self.resolve.sanitized + self.integration.sanitized
    }
}

/// Advance `store` by one `config.time_step`.
///
/// The quadtree lives only for the duration of this call; nothing built
/// here outlives the tick.
pub fn run_tick(store: &mut ParticleStore, config: &SimConfig) -> TickReport {
    let _span = trace_span!("tick", particles = store.count()).entered();

    let tree = {
        let _span = trace_span!("index").entered();
        QuadTree::build(
            store,
            config.world,
            config.quadtree_max_depth,
            config.quadtree_leaf_capacity,
        )
    };
    let resolved = {
        let _span = trace_span!("resolve").entered();
        resolve(store, &tree, config)
    };
    let integration = {
        let _span = trace_span!("integrate").entered();
        integrate_all(store, config.time_step)
    };
    let settled = settle(store, &tree, config);
    let wall_hits = contain(store, config);

    TickReport {
        tree: tree.stats(),
        resolve: resolved,
        integration,
        settled,
        wall_hits,
    }
}
