//! # [`RangePrune`]
//!
//! This pass visits the blocks in program order and looks at the comparison feeding each
//! conditional branch. The ranges of both operands come from the oracle; when they decide the
//! comparison, the arm that can never be taken is pruned.

use super::prune_path::{prune_path, Successor};
use super::{Pass, PassInput};
use crate::feasibility::{classify, Verdict};
use crate::stats::PruneStats;
use crate::PruneOptions;
use itertools::Itertools;
use rangeprune_ir::{BlockIdx, Function, InstKind, Predicate, Terminator, Value};
use tracing::trace;

pub struct RangePrune;

impl Pass for RangePrune {
    fn run_pass(
        &self,
        func: &mut Function,
        options: &PruneOptions,
        input: &PassInput<'_>,
    ) -> PruneStats {
        let mut stats = PruneStats::default();

        for idx in func.block_indices().collect_vec() {
            // Merging folds the following blocks into this one, and their branch along with them.
            while func.contains_block(idx) {
                let Some((pred, lhs, rhs)) = branch_comparison(func, idx) else {
                    break;
                };
                let lhs_range = input.oracle.range(lhs, func);
                let rhs_range = input.oracle.range(rhs, func);
                let verdict = classify(pred, lhs_range, rhs_range);
                trace!(
                    "`{}`: icmp {} {} {} is {:?}",
                    func[idx].name,
                    pred.mnemonic(),
                    lhs_range,
                    rhs_range,
                    verdict
                );

                let infeasible = match verdict {
                    Verdict::AlwaysTrue => Successor::Else,
                    Verdict::AlwaysFalse => Successor::Then,
                    Verdict::Unknown => break,
                };
                stats += prune_path(func, idx, infeasible, options.merge_blocks);
            }
        }

        stats
    }

    fn status_message(&self) -> &'static str {
        "Pruning branches decided by value ranges"
    }
}

/// The comparison a block's branch depends on, if the block ends with a comparison directly
/// followed by a branch on its result.
fn branch_comparison(func: &Function, idx: BlockIdx) -> Option<(Predicate, Value, Value)> {
    let block = &func[idx];
    let Terminator::Branch {
        cond: Value::Local(cond),
        ..
    } = *block.terminator()
    else {
        return None;
    };
    let inst = block.insts.last()?;
    match inst.kind {
        InstKind::Cmp { pred, lhs, rhs } if inst.result == Some(cond) => Some((pred, lhs, rhs)),
        _ => None,
    }
}
