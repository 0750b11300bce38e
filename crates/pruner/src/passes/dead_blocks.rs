use crate::stats::PruneStats;
use rangeprune_ir::{BlockIdx, Function};
use tracing::trace;

/// Deletes `start` if nothing branches to it anymore, then keeps going through the successors of
/// every deleted block. A block that can still be reached through another edge stops the walk, so
/// the region behind it stays intact.
///
/// Edges a block has to itself don't keep it alive. The entry block is never deleted.
pub fn remove_dead_blocks(func: &mut Function, start: BlockIdx) -> PruneStats {
    let mut stats = PruneStats::default();
    let mut worklist = vec![start];

    while let Some(idx) = worklist.pop() {
        if !func.contains_block(idx) || idx == func.entry() {
            continue;
        }
        if func.predecessors(idx).any(|pred| pred != idx) {
            continue;
        }

        let successors = func.successors(idx);
        let block = func.remove_block(idx);
        // The terminator is counted along with the body.
        let num_insts = block.insts.len() + 1;
        trace!("Removed dead block `{}` ({} instructions)", block.name, num_insts);
        stats.insts_eliminated += num_insts;
        stats.blocks_eliminated += 1;

        worklist.extend(successors.into_iter().filter(|&succ| succ != idx));
    }

    stats
}
