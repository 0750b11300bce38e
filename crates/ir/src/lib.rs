//! The intermediate representation rewritten by the pruning passes: functions made of basic blocks
//! stored in a petgraph [`StableGraph`](petgraph::stable_graph::StableGraph), plus a small textual
//! form used by the command line tool and the tests.

mod function;
mod range;
mod text;
mod verify;

pub use function::{
    BinOp, Block, BlockIdx, Cfg, CmpKind, Edge, Function, Inst, InstKind, Predicate, Terminator,
    Value, ValueId,
};
pub use range::Range;
pub use text::{parse_function, parse_module, ParseError, ParsedFunction};
pub use verify::VerifyError;
