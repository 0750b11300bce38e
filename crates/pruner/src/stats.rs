use serde::Serialize;
use std::fmt;
use std::ops::{Add, AddAssign};

/// What a pruning step removed. Every step returns its own counts and callers sum them up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// Instructions erased, terminators included
    pub insts_eliminated: usize,
    /// Blocks erased entirely
    pub blocks_eliminated: usize,
    /// Blocks folded into their predecessor
    pub blocks_merged: usize,
    /// Conditional branches turned into jumps
    pub branches_pruned: usize,
}

impl AddAssign for PruneStats {
    fn add_assign(&mut self, rhs: Self) {
        self.insts_eliminated += rhs.insts_eliminated;
        self.blocks_eliminated += rhs.blocks_eliminated;
        self.blocks_merged += rhs.blocks_merged;
        self.branches_pruned += rhs.branches_pruned;
    }
}

impl Add for PruneStats {
    type Output = PruneStats;

    fn add(mut self, rhs: Self) -> PruneStats {
        self += rhs;
        self
    }
}

impl fmt::Display for PruneStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} branches pruned, {} instructions eliminated, {} blocks eliminated, {} blocks merged",
            self.branches_pruned, self.insts_eliminated, self.blocks_eliminated, self.blocks_merged
        )
    }
}
