use rangeprune_ir::{Function, Range, Value, ValueId};
use rustc_hash::FxHashMap;

/// Source of the value ranges the pruning decisions are based on.
///
/// Implementations must be conservative: every value the expression can take at runtime has to
/// lie inside the returned range. Each deleted path is only as sound as this guarantee.
pub trait RangeOracle {
    fn range(&self, value: Value, func: &Function) -> Range;
}

impl<F> RangeOracle for F
where
    F: Fn(Value, &Function) -> Range,
{
    fn range(&self, value: Value, func: &Function) -> Range {
        self(value, func)
    }
}

/// Ranges computed ahead of time, keyed by value.
///
/// Constants are answered with their singleton range and values without an entry with the full
/// range.
#[derive(Debug, Default, Clone)]
pub struct RangeTable {
    ranges: FxHashMap<ValueId, Range>,
}

impl RangeTable {
    pub fn new() -> RangeTable {
        Default::default()
    }

    pub fn insert(&mut self, value: ValueId, range: Range) -> Option<Range> {
        self.ranges.insert(value, range)
    }

    pub fn get(&self, value: ValueId) -> Option<Range> {
        self.ranges.get(&value).copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<(ValueId, Range)> for RangeTable {
    fn from_iter<T: IntoIterator<Item = (ValueId, Range)>>(iter: T) -> Self {
        RangeTable {
            ranges: iter.into_iter().collect(),
        }
    }
}

impl RangeOracle for RangeTable {
    fn range(&self, value: Value, _: &Function) -> Range {
        match value {
            Value::Const(int) => Range::singleton(int),
            Value::Local(id) => self.get(id).unwrap_or(Range::FULL),
        }
    }
}
