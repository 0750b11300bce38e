use std::fmt;

/// A closed interval `[lo, hi]` of signed 64-bit integers bounding every value an expression can
/// take at some program point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    lo: i64,
    hi: i64,
}

impl Range {
    pub const FULL: Range = Range {
        lo: i64::MIN,
        hi: i64::MAX,
    };

    /// # Panics
    ///
    /// Panics if `lo > hi`.
    pub fn new(lo: i64, hi: i64) -> Range {
        match Range::try_new(lo, hi) {
            Some(range) => range,
            None => panic!("invalid range [{}, {}]", lo, hi),
        }
    }

    pub fn try_new(lo: i64, hi: i64) -> Option<Range> {
        (lo <= hi).then_some(Range { lo, hi })
    }

    pub const fn singleton(value: i64) -> Range {
        Range {
            lo: value,
            hi: value,
        }
    }

    pub const fn lo(self) -> i64 {
        self.lo
    }

    pub const fn hi(self) -> i64 {
        self.hi
    }

    pub const fn is_singleton(self) -> bool {
        self.lo == self.hi
    }

    pub const fn contains(self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// The bounds of this range when its values are reinterpreted as unsigned integers.
    ///
    /// Negative values map to the top half of the unsigned space, so a range that straddles zero
    /// wraps around and the only sound unsigned bound left is the whole space.
    pub const fn unsigned_bounds(self) -> (u64, u64) {
        if self.lo < 0 && self.hi >= 0 {
            (0, u64::MAX)
        } else {
            (self.lo as u64, self.hi as u64)
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}
