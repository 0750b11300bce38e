//! # [`PruneOrphans`]
//!
//! This pass removes every block that can no longer be reached from the entry block by using
//! Depth-First-Search. Dead block removal only follows blocks left without predecessors, so a
//! loop cut off from the entry survives it; this pass cleans those up. Blocks that such a loop
//! branched into may be left as a straight line chain, so chains are merged again afterwards.

use super::merge_blocks::merge_chain;
use super::{Pass, PassInput};
use crate::stats::PruneStats;
use crate::PruneOptions;
use itertools::Itertools;
use rangeprune_ir::{Function, Terminator};
use tracing::trace;

pub struct PruneOrphans;

impl Pass for PruneOrphans {
    fn run_pass(
        &self,
        func: &mut Function,
        options: &PruneOptions,
        _: &PassInput<'_>,
    ) -> PruneStats {
        let reachable = func.reachable_blocks();
        let orphans = func
            .block_indices()
            .filter(|idx| !reachable.contains(idx))
            .collect_vec();

        let mut stats = PruneStats::default();
        // Detach all of them first, orphans may branch to each other.
        for &idx in &orphans {
            func.set_terminator(idx, Terminator::Return(None));
        }
        let removed_any = !orphans.is_empty();
        for idx in orphans {
            let block = func.remove_block(idx);
            trace!("Removed unreachable block `{}`", block.name);
            stats.insts_eliminated += block.insts.len() + 1;
            stats.blocks_eliminated += 1;
        }

        if removed_any && options.merge_blocks {
            for idx in func.block_indices().collect_vec() {
                if !func.contains_block(idx) {
                    continue;
                }
                if let Terminator::Jump(next) = *func[idx].terminator() {
                    stats += merge_chain(func, idx, next);
                }
            }
        }
        stats
    }

    fn should_run(&self, options: &PruneOptions) -> bool {
        options.sweep_unreachable
    }

    fn status_message(&self) -> &'static str {
        "Pruning unreachable blocks"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::RangeTable;
    use crate::parse_test_function;
    use crate::passes::prune_path::{prune_path, Successor};

    #[test]
    fn removes_detached_loop() {
        let (mut func, _) = parse_test_function(
            r"
            func @f(%c) {
            entry:
              %k = icmp eq %c, 0
              br %k, exit, head
            head:
              %i = add %c, 1
              jmp body
            body:
              jmp head
            exit:
              ret
            }
        ",
        );
        let entry = func.entry();
        let stats = prune_path(&mut func, entry, Successor::Else, false);
        // `head` is still reached from `body`.
        assert_eq!(stats.blocks_eliminated, 0);
        assert!(func.verify().is_err());

        let table = RangeTable::new();
        let input = PassInput { oracle: &table };
        let options = PruneOptions {
            merge_blocks: false,
            ..Default::default()
        };
        let stats = PruneOrphans.run_pass(&mut func, &options, &input);
        assert_eq!(stats.blocks_eliminated, 2);
        assert_eq!(stats.insts_eliminated, 3);
        assert_eq!(func.block_count(), 2);
        func.verify().unwrap();
    }

    #[test]
    fn merges_join_left_by_loop() {
        let (mut func, _) = parse_test_function(
            r"
            func @f(%c) {
            entry:
              %k = icmp eq %c, 0
              br %k, fast, slow
            slow:
              call @slow()
              jmp again
            again:
              br %c, slow, done
            fast:
              call @fast()
              jmp done
            done:
              ret
            }
        ",
        );
        let entry = func.entry();
        let stats = prune_path(&mut func, entry, Successor::Else, true);
        // `done` is still reached from `again` when the chain is merged.
        assert_eq!(stats.blocks_merged, 1);

        let table = RangeTable::new();
        let input = PassInput { oracle: &table };
        let stats = PruneOrphans.run_pass(&mut func, &PruneOptions::default(), &input);
        assert_eq!(stats.blocks_eliminated, 2);
        assert_eq!(stats.blocks_merged, 1);
        assert_eq!(func.block_count(), 1);
        func.verify().unwrap();
    }
}
