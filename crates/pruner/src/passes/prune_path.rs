use super::dead_blocks::remove_dead_blocks;
use super::merge_blocks::merge_chain;
use crate::stats::PruneStats;
use rangeprune_ir::{BlockIdx, Function, Terminator};
use tracing::trace;

/// A successor slot of a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Successor {
    Then,
    Else,
}

/// Turns the branch ending `block` into a jump to the successor that is not `infeasible`, deletes
/// whatever became unreachable through the cut edge, and then merges the straight line chain that
/// starts at `block` when `merge` is set.
///
/// # Panics
///
/// Panics if `block` does not end in a conditional branch.
pub fn prune_path(
    func: &mut Function,
    block: BlockIdx,
    infeasible: Successor,
    merge: bool,
) -> PruneStats {
    // Always cut the else edge.
    if infeasible == Successor::Then {
        func.swap_successors(block);
    }
    let Terminator::Branch {
        then_dest: feasible,
        else_dest: dead,
        ..
    } = *func[block].terminator()
    else {
        panic!(
            "tried to prune a path out of `{}`, which does not end in a branch",
            func[block].name
        );
    };

    trace!(
        "Pruning `{}` -> `{}`, keeping `{}`",
        func[block].name,
        func[dead].name,
        func[feasible].name
    );
    func.set_terminator(block, Terminator::Jump(feasible));

    let mut stats = PruneStats {
        branches_pruned: 1,
        ..Default::default()
    };
    stats += remove_dead_blocks(func, dead);
    // Inside a loop that is already cut off from the entry, the cut can take `block` with it.
    if merge && func.contains_block(block) {
        stats += merge_chain(func, block, feasible);
    }
    stats
}
