//! Deciding comparisons from the ranges of their operands.
//!
//! With `lhs` in `[a, b]` and `rhs` in `[c, d]`:
//!
//! | relation | never holds when | always holds when |
//! |----------|------------------|-------------------|
//! | `>`      | `b <= c`         | `a > d`           |
//! | `>=`     | `b < c`          | `a >= d`          |
//! | `<`      | `a >= d`         | `b < c`           |
//! | `<=`     | `a > d`          | `b <= c`          |
//!
//! Equality is only decided when both ranges hold a single value. Unsigned predicates apply the
//! same table to the bounds of the ranges reinterpreted as unsigned integers.

use rangeprune_ir::{CmpKind, Predicate, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AlwaysTrue,
    AlwaysFalse,
    Unknown,
}

impl Verdict {
    pub fn is_decisive(self) -> bool {
        self != Verdict::Unknown
    }
}

/// Decides `lhs pred rhs` for all values inside the two ranges.
pub fn classify(pred: Predicate, lhs: Range, rhs: Range) -> Verdict {
    if pred.is_unsigned() {
        decide(pred.kind(), lhs.unsigned_bounds(), rhs.unsigned_bounds())
    } else {
        decide(pred.kind(), (lhs.lo(), lhs.hi()), (rhs.lo(), rhs.hi()))
    }
}

fn decide<T: Ord + Copy>(kind: CmpKind, (a, b): (T, T), (c, d): (T, T)) -> Verdict {
    let (never, always) = match kind {
        CmpKind::Gt => (b <= c, a > d),
        CmpKind::Ge => (b < c, a >= d),
        CmpKind::Lt => (a >= d, b < c),
        CmpKind::Le => (a > d, b <= c),
        CmpKind::Eq | CmpKind::Ne => {
            if a != b || c != d {
                return Verdict::Unknown;
            }
            let equal = a == c;
            if kind == CmpKind::Eq {
                (!equal, equal)
            } else {
                (equal, !equal)
            }
        }
    };

    if never {
        Verdict::AlwaysFalse
    } else if always {
        Verdict::AlwaysTrue
    } else {
        Verdict::Unknown
    }
}
