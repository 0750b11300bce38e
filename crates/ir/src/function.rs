use itertools::Itertools;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};
use std::ops::Index;

pub type BlockIdx = NodeIndex;

/// The control flow graph of a function. Edges mirror the block terminators, one edge per
/// successor slot, so a branch with both arms pointing at the same block has two edges to it.
pub type Cfg = StableGraph<Block, Edge>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A parameter or the result of an instruction
    Local(ValueId),
    Const(i64),
}

/// The kind of relation a comparison checks, with signedness erased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpKind {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    Eq,
    Ne,
    Sgt,
    Sge,
    Slt,
    Sle,
    Ugt,
    Uge,
    Ult,
    Ule,
}

impl Predicate {
    pub const ALL: [Predicate; 10] = [
        Predicate::Eq,
        Predicate::Ne,
        Predicate::Sgt,
        Predicate::Sge,
        Predicate::Slt,
        Predicate::Sle,
        Predicate::Ugt,
        Predicate::Uge,
        Predicate::Ult,
        Predicate::Ule,
    ];

    pub fn kind(self) -> CmpKind {
        match self {
            Predicate::Eq => CmpKind::Eq,
            Predicate::Ne => CmpKind::Ne,
            Predicate::Sgt | Predicate::Ugt => CmpKind::Gt,
            Predicate::Sge | Predicate::Uge => CmpKind::Ge,
            Predicate::Slt | Predicate::Ult => CmpKind::Lt,
            Predicate::Sle | Predicate::Ule => CmpKind::Le,
        }
    }

    /// Whether the operands are compared as unsigned integers. Equality doesn't care.
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Predicate::Ugt | Predicate::Uge | Predicate::Ult | Predicate::Ule
        )
    }

    /// Evaluates the comparison on concrete operands.
    pub fn evaluate(self, lhs: i64, rhs: i64) -> bool {
        if self.is_unsigned() {
            compare(self.kind(), lhs as u64, rhs as u64)
        } else {
            compare(self.kind(), lhs, rhs)
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Sgt => "sgt",
            Predicate::Sge => "sge",
            Predicate::Slt => "slt",
            Predicate::Sle => "sle",
            Predicate::Ugt => "ugt",
            Predicate::Uge => "uge",
            Predicate::Ult => "ult",
            Predicate::Ule => "ule",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Predicate> {
        Predicate::ALL
            .into_iter()
            .find(|pred| pred.mnemonic() == mnemonic)
    }
}

fn compare<T: Ord>(kind: CmpKind, lhs: T, rhs: T) -> bool {
    match kind {
        CmpKind::Gt => lhs > rhs,
        CmpKind::Ge => lhs >= rhs,
        CmpKind::Lt => lhs < rhs,
        CmpKind::Le => lhs <= rhs,
        CmpKind::Eq => lhs == rhs,
        CmpKind::Ne => lhs != rhs,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub const ALL: [BinOp; 6] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::And,
        BinOp::Or,
        BinOp::Xor,
    ];

    pub fn evaluate(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            BinOp::Add => lhs.wrapping_add(rhs),
            BinOp::Sub => lhs.wrapping_sub(rhs),
            BinOp::Mul => lhs.wrapping_mul(rhs),
            BinOp::And => lhs & rhs,
            BinOp::Or => lhs | rhs,
            BinOp::Xor => lhs ^ rhs,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<BinOp> {
        BinOp::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    Cmp {
        pred: Predicate,
        lhs: Value,
        rhs: Value,
    },
    Binary {
        op: BinOp,
        lhs: Value,
        rhs: Value,
    },
    Copy(Value),
    Call {
        callee: String,
        args: Vec<Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    pub result: Option<ValueId>,
    pub kind: InstKind,
}

impl Inst {
    pub fn new(result: Option<ValueId>, kind: InstKind) -> Inst {
        Inst { result, kind }
    }

    pub fn cmp(result: ValueId, pred: Predicate, lhs: Value, rhs: Value) -> Inst {
        Inst::new(Some(result), InstKind::Cmp { pred, lhs, rhs })
    }

    pub fn operands(&self) -> SmallVec<[Value; 2]> {
        match &self.kind {
            InstKind::Cmp { lhs, rhs, .. } | InstKind::Binary { lhs, rhs, .. } => {
                smallvec![*lhs, *rhs]
            }
            InstKind::Copy(value) => smallvec![*value],
            InstKind::Call { args, .. } => args.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Jump(BlockIdx),
    Branch {
        cond: Value,
        then_dest: BlockIdx,
        else_dest: BlockIdx,
    },
    Return(Option<Value>),
}

impl Terminator {
    pub fn successors(&self) -> SmallVec<[BlockIdx; 2]> {
        self.edges().into_iter().map(|(dest, _)| dest).collect()
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Terminator::Branch { .. })
    }

    pub(crate) fn edges(&self) -> SmallVec<[(BlockIdx, Edge); 2]> {
        match *self {
            Terminator::Jump(dest) => smallvec![(dest, Edge::Jump)],
            Terminator::Branch {
                then_dest,
                else_dest,
                ..
            } => smallvec![(then_dest, Edge::Then), (else_dest, Edge::Else)],
            Terminator::Return(_) => SmallVec::new(),
        }
    }
}

/// Which successor slot of a terminator an edge comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge {
    Jump,
    Then,
    Else,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub insts: Vec<Inst>,
    term: Terminator,
}

impl Block {
    pub fn terminator(&self) -> &Terminator {
        &self.term
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    params: Vec<ValueId>,
    value_names: Vec<String>,
    cfg: Cfg,
    entry: BlockIdx,
}

impl Function {
    /// Creates a function holding only an entry block that returns.
    pub fn new(name: impl Into<String>, entry_name: impl Into<String>) -> Function {
        let mut cfg = Cfg::default();
        let entry = cfg.add_node(Block {
            name: entry_name.into(),
            insts: Vec::new(),
            term: Terminator::Return(None),
        });
        Function {
            name: name.into(),
            params: Vec::new(),
            value_names: Vec::new(),
            cfg,
            entry,
        }
    }

    pub fn entry(&self) -> BlockIdx {
        self.entry
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    pub fn new_value(&mut self, name: impl Into<String>) -> ValueId {
        let id = ValueId(self.value_names.len() as u32);
        self.value_names.push(name.into());
        id
    }

    pub fn add_param(&mut self, name: impl Into<String>) -> ValueId {
        let id = self.new_value(name);
        self.params.push(id);
        id
    }

    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    pub fn value_name(&self, id: ValueId) -> &str {
        &self.value_names[id.index()]
    }

    pub fn value_by_name(&self, name: &str) -> Option<ValueId> {
        self.value_names
            .iter()
            .position(|n| n == name)
            .map(|idx| ValueId(idx as u32))
    }

    /// Adds a block that returns. Its real terminator is set later with
    /// [`Function::set_terminator`].
    pub fn add_block(&mut self, name: impl Into<String>) -> BlockIdx {
        self.cfg.add_node(Block {
            name: name.into(),
            insts: Vec::new(),
            term: Terminator::Return(None),
        })
    }

    pub fn contains_block(&self, idx: BlockIdx) -> bool {
        self.cfg.contains_node(idx)
    }

    pub fn block_count(&self) -> usize {
        self.cfg.node_count()
    }

    /// Blocks in program order.
    pub fn block_indices(&self) -> impl Iterator<Item = BlockIdx> + '_ {
        self.cfg.node_indices()
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockIdx> {
        self.cfg
            .node_indices()
            .find(|&idx| self.cfg[idx].name == name)
    }

    pub fn push_inst(&mut self, idx: BlockIdx, inst: Inst) {
        self.cfg[idx].insts.push(inst);
    }

    pub fn insts_mut(&mut self, idx: BlockIdx) -> &mut Vec<Inst> {
        &mut self.cfg[idx].insts
    }

    /// Replaces the terminator of `idx`, rewiring the edges in the same step, and returns the old
    /// one.
    pub fn set_terminator(&mut self, idx: BlockIdx, term: Terminator) -> Terminator {
        for dest in term.successors() {
            assert!(
                self.cfg.contains_node(dest),
                "terminator of `{}` targets a block that is not in `@{}`",
                self.cfg[idx].name,
                self.name
            );
        }

        let mut walk_outgoing = self
            .cfg
            .neighbors_directed(idx, Direction::Outgoing)
            .detach();
        while let Some(edge_idx) = walk_outgoing.next_edge(&self.cfg) {
            self.cfg.remove_edge(edge_idx);
        }
        for (dest, edge) in term.edges() {
            self.cfg.add_edge(idx, dest, edge);
        }

        std::mem::replace(&mut self.cfg[idx].term, term)
    }

    /// Swaps the two destinations of the branch ending `idx`.
    pub fn swap_successors(&mut self, idx: BlockIdx) {
        let Terminator::Branch {
            cond,
            then_dest,
            else_dest,
        } = self.cfg[idx].term
        else {
            panic!(
                "tried to swap the successors of `{}`, which does not end in a branch",
                self.cfg[idx].name
            );
        };
        self.set_terminator(
            idx,
            Terminator::Branch {
                cond,
                then_dest: else_dest,
                else_dest: then_dest,
            },
        );
    }

    /// Predecessors of `idx`, once per incoming edge.
    pub fn predecessors(&self, idx: BlockIdx) -> impl Iterator<Item = BlockIdx> + '_ {
        self.cfg
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| edge.source())
    }

    pub fn predecessor_count(&self, idx: BlockIdx) -> usize {
        self.cfg.edges_directed(idx, Direction::Incoming).count()
    }

    /// The predecessor of `idx` if exactly one edge leads into it.
    pub fn single_predecessor(&self, idx: BlockIdx) -> Option<BlockIdx> {
        self.predecessors(idx).exactly_one().ok()
    }

    pub fn successors(&self, idx: BlockIdx) -> SmallVec<[BlockIdx; 2]> {
        self.cfg[idx].term.successors()
    }

    /// Erases a block. Every edge into it must come from the block itself.
    pub fn remove_block(&mut self, idx: BlockIdx) -> Block {
        assert!(
            idx != self.entry,
            "tried to remove the entry block of `@{}`",
            self.name
        );
        assert!(
            self.predecessors(idx).all(|pred| pred == idx),
            "tried to remove block `{}` while other blocks still branch to it",
            self.cfg[idx].name
        );
        match self.cfg.remove_node(idx) {
            Some(block) => block,
            None => panic!("tried to remove a block that is not in `@{}`", self.name),
        }
    }

    /// Folds `block` into `pred`, which must be its only predecessor and must jump to it. `pred`
    /// takes over the instructions and the terminator of `block`.
    pub fn merge_into_predecessor(&mut self, pred: BlockIdx, block: BlockIdx) {
        assert_eq!(
            self.cfg[pred].term,
            Terminator::Jump(block),
            "`{}` does not jump to `{}`",
            self.cfg[pred].name,
            self.cfg[block].name
        );
        assert_eq!(
            self.single_predecessor(block),
            Some(pred),
            "`{}` has predecessors other than `{}`",
            self.cfg[block].name,
            self.cfg[pred].name
        );
        assert!(
            !self.successors(block).contains(&block),
            "cannot merge `{}`, it branches to itself",
            self.cfg[block].name
        );

        let term = self.set_terminator(block, Terminator::Return(None));
        self.set_terminator(pred, term);
        let merged = self.remove_block(block);
        self.cfg[pred].insts.extend(merged.insts);
    }

    /// Blocks reachable from the entry block.
    pub fn reachable_blocks(&self) -> FxHashSet<BlockIdx> {
        let mut reachable = FxHashSet::default();
        let mut dfs = Dfs::new(&self.cfg, self.entry);
        while let Some(idx) = dfs.next(&self.cfg) {
            reachable.insert(idx);
        }
        reachable
    }
}

impl Index<BlockIdx> for Function {
    type Output = Block;

    fn index(&self, idx: BlockIdx) -> &Block {
        &self.cfg[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// entry -> (a | b) -> join
    fn diamond() -> (Function, [BlockIdx; 4]) {
        let mut func = Function::new("diamond", "entry");
        let x = func.add_param("x");
        let c = func.new_value("c");
        let entry = func.entry();
        let a = func.add_block("a");
        let b = func.add_block("b");
        let join = func.add_block("join");
        func.push_inst(
            entry,
            Inst::cmp(c, Predicate::Sgt, Value::Local(x), Value::Const(0)),
        );
        func.set_terminator(
            entry,
            Terminator::Branch {
                cond: Value::Local(c),
                then_dest: a,
                else_dest: b,
            },
        );
        func.set_terminator(a, Terminator::Jump(join));
        func.set_terminator(b, Terminator::Jump(join));
        (func, [entry, a, b, join])
    }

    #[test]
    fn edges_follow_terminators() {
        let (mut func, [entry, a, b, join]) = diamond();
        assert_eq!(func.predecessor_count(join), 2);
        assert_eq!(func.single_predecessor(a), Some(entry));

        let old = func.set_terminator(entry, Terminator::Jump(a));
        assert!(old.is_branch());
        assert_eq!(func.predecessor_count(b), 0);
        assert_eq!(func.successors(entry).as_slice(), &[a]);
        assert_eq!(func.cfg().edge_count(), 3);
    }

    #[test]
    fn branch_to_same_block_counts_twice() {
        let (mut func, [entry, a, ..]) = diamond();
        func.set_terminator(
            entry,
            Terminator::Branch {
                cond: Value::Const(1),
                then_dest: a,
                else_dest: a,
            },
        );
        assert_eq!(func.predecessor_count(a), 2);
        assert_eq!(func.single_predecessor(a), None);
    }

    #[test]
    fn swap_successors_swaps_edges() {
        let (mut func, [entry, a, b, _]) = diamond();
        func.swap_successors(entry);
        assert_eq!(func.successors(entry).as_slice(), &[b, a]);
        let then_edge = func
            .cfg()
            .edges_directed(b, Direction::Incoming)
            .exactly_one()
            .ok()
            .map(|edge| *edge.weight());
        assert_eq!(then_edge, Some(Edge::Then));
    }

    #[test]
    fn merge_takes_over_terminator() {
        let (mut func, [entry, a, b, join]) = diamond();
        func.set_terminator(entry, Terminator::Jump(a));
        func.push_inst(a, Inst::new(None, InstKind::Copy(Value::Const(3))));
        func.remove_block(b);

        func.merge_into_predecessor(entry, a);
        assert!(!func.contains_block(a));
        assert_eq!(func[entry].insts.len(), 2);
        assert_eq!(*func[entry].terminator(), Terminator::Jump(join));
        assert_eq!(func.single_predecessor(join), Some(entry));
    }

    #[test]
    #[should_panic(expected = "still branch to it")]
    fn remove_block_with_predecessors() {
        let (mut func, [_, _, _, join]) = diamond();
        func.remove_block(join);
    }

    #[test]
    #[should_panic(expected = "entry block")]
    fn remove_entry_block() {
        let (mut func, [entry, ..]) = diamond();
        func.remove_block(entry);
    }

    #[test]
    fn reachability() {
        let (mut func, [entry, a, b, join]) = diamond();
        assert_eq!(func.reachable_blocks().len(), 4);
        func.set_terminator(entry, Terminator::Jump(a));
        let reachable = func.reachable_blocks();
        assert!(reachable.contains(&join));
        assert!(!reachable.contains(&b));
    }

    #[test]
    fn unsigned_evaluation() {
        assert!(Predicate::Ugt.evaluate(-1, 1));
        assert!(!Predicate::Sgt.evaluate(-1, 1));
        assert!(Predicate::Ule.evaluate(0, -5));
        assert_eq!(Predicate::from_mnemonic("uge"), Some(Predicate::Uge));
        assert_eq!(Predicate::from_mnemonic("ge"), None);
    }
}
