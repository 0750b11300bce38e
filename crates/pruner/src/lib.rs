//! Range driven dead code elimination.
//!
//! For every conditional branch fed by an integer comparison, the ranges of both operands are
//! requested from a [`RangeOracle`]. When they prove that the comparison always has the same
//! outcome, the arm that can never run is cut off, every block that is left without predecessors
//! is deleted, and the straight line chain that remains is merged back into a single block.

mod feasibility;
mod oracle;
mod passes;
mod stats;

use rangeprune_ir::Function;
use tracing::{debug, warn};

pub use feasibility::{classify, Verdict};
pub use oracle::{RangeOracle, RangeTable};
pub use passes::dead_blocks::remove_dead_blocks;
pub use passes::merge_blocks::merge_chain;
pub use passes::prune_path::{prune_path, Successor};
pub use passes::{make_default_pass_manager, Pass, PassInput, PassManager};
pub use stats::PruneStats;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PruneOptions {
    /// Fold the straight line chain left behind by a pruned branch into one block.
    pub merge_blocks: bool,
    /// Remove unreachable cycles that no longer have a path from the entry block.
    pub sweep_unreachable: bool,
    /// Verify the edges of the function after every pass and abort if they are malformed.
    pub verify_each: bool,
    /// Print out the function after every pass
    pub print_after_all: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        PruneOptions {
            merge_blocks: true,
            sweep_unreachable: true,
            verify_each: false,
            print_after_all: false,
        }
    }
}

impl PruneOptions {
    /// Applies a flag string such as `"--no-merge -v"` on top of these options.
    pub fn apply(&mut self, str: &str) {
        let options = str.split_whitespace();
        for option in options {
            if option.starts_with("--") {
                match option {
                    "--no-merge" => self.merge_blocks = false,
                    "--no-sweep" => self.sweep_unreachable = false,
                    "--verify" => self.verify_each = true,
                    "--print-after-all" => self.print_after_all = true,
                    _ => warn!("Unrecognized option: {}", option),
                }
            } else if let Some(str) = option.strip_prefix('-') {
                for c in str.chars() {
                    match c.to_ascii_lowercase() {
                        'm' => self.merge_blocks = false,
                        's' => self.sweep_unreachable = false,
                        'v' => self.verify_each = true,
                        'p' => self.print_after_all = true,
                        _ => warn!("Unrecognized option: -{}", c),
                    }
                }
            } else {
                warn!("Unrecognized option: {}", option);
            }
        }
    }
}

/// Runs the default pass pipeline over `func`.
pub fn run_on_function(
    func: &mut Function,
    oracle: &dyn RangeOracle,
    options: &PruneOptions,
) -> PruneStats {
    debug!("Pruning `@{}` ({} blocks)", func.name, func.block_count());
    let input = PassInput { oracle };
    let stats = make_default_pass_manager().run_passes(func, options, &input);
    debug!("Finished `@{}`: {}", func.name, stats);
    stats
}

#[cfg(test)]
pub(crate) fn parse_test_function(src: &str) -> (Function, RangeTable) {
    let parsed = rangeprune_ir::parse_function(src).unwrap();
    (parsed.func, parsed.ranges.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_options() {
        let input = "-mv --print-after-all --bogus";
        let expected_options = PruneOptions {
            merge_blocks: false,
            sweep_unreachable: true,
            verify_each: true,
            print_after_all: true,
        };
        let mut options = PruneOptions::default();
        options.apply(input);

        assert_eq!(options, expected_options);
    }

    #[test]
    fn flags_override_earlier_options() {
        let mut options = PruneOptions {
            verify_each: true,
            ..Default::default()
        };
        options.apply("--no-sweep");
        assert!(options.verify_each);
        assert!(!options.sweep_unreachable);
        assert!(options.merge_blocks);
    }
}
