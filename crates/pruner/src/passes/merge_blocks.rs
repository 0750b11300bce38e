use crate::stats::PruneStats;
use rangeprune_ir::{BlockIdx, Function, Terminator};
use tracing::trace;

/// Merges the chain of blocks that starts at `head`, which must jump to `next`, into `head`.
///
/// A block is only merged when `head` is its single predecessor. The walk stops at the first block
/// that is shared with other paths, at the entry block, and at a self loop. It also stops once
/// `head` no longer ends in a jump, that is after merging a block that ends in a branch or return.
///
/// # Panics
///
/// Panics if `head` does not jump to `next`.
pub fn merge_chain(func: &mut Function, head: BlockIdx, mut next: BlockIdx) -> PruneStats {
    assert_eq!(
        *func[head].terminator(),
        Terminator::Jump(next),
        "`{}` must jump to the start of the chain",
        func[head].name
    );
    let mut stats = PruneStats::default();

    loop {
        if next == head
            || next == func.entry()
            || func.single_predecessor(next) != Some(head)
            || func.successors(next).contains(&next)
        {
            break;
        }

        trace!("Merging `{}` into `{}`", func[next].name, func[head].name);
        func.merge_into_predecessor(head, next);
        stats.blocks_merged += 1;

        match *func[head].terminator() {
            Terminator::Jump(dest) => next = dest,
            _ => break,
        }
    }

    stats
}
