pub mod dead_blocks;
pub mod merge_blocks;
pub mod prune_path;
mod prune_orphans;
mod range_prune;

use crate::oracle::RangeOracle;
use crate::stats::PruneStats;
use crate::PruneOptions;
use rangeprune_ir::Function;
use std::time::Instant;
use tracing::{debug, trace};

pub const fn make_default_pass_manager() -> PassManager<'static> {
    PassManager::new(&[&range_prune::RangePrune, &prune_orphans::PruneOrphans])
}

/// Everything a pass may consult besides the function it rewrites.
pub struct PassInput<'a> {
    pub oracle: &'a dyn RangeOracle,
}

pub struct PassManager<'p> {
    passes: &'p [&'p dyn Pass],
}

impl<'p> PassManager<'p> {
    pub const fn new(passes: &'p [&'p dyn Pass]) -> Self {
        Self { passes }
    }

    pub fn run_passes(
        &self,
        func: &mut Function,
        options: &PruneOptions,
        input: &PassInput<'_>,
    ) -> PruneStats {
        let mut stats = PruneStats::default();

        for &pass in self.passes {
            if !pass.should_run(options) {
                trace!("Skipping pass: {}", pass.name());
                continue;
            }

            trace!("Running pass: {} ({})", pass.name(), pass.status_message());
            let start = Instant::now();

            stats += pass.run_pass(func, options, input);

            trace!("Completed pass in {:?}", start.elapsed());
            trace!("block_count: {}", func.block_count());

            // Unreachable loops are only gone after the sweep.
            if options.verify_each {
                if let Err(err) = func.verify_edges() {
                    panic!("`@{}` is malformed after {}: {}", func.name, pass.name(), err);
                }
            }

            if options.print_after_all {
                debug!("Printing function after pass: {}\n{}", pass.name(), func);
            }
        }

        stats
    }
}

pub trait Pass {
    fn run_pass(
        &self,
        func: &mut Function,
        options: &PruneOptions,
        input: &PassInput<'_>,
    ) -> PruneStats;

    /// This name should only be use for debugging purposes,
    /// it is not a valid identifier of the pass.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn should_run(&self, _: &PruneOptions) -> bool {
        true
    }

    fn status_message(&self) -> &'static str;
}
