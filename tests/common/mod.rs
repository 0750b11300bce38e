#![allow(dead_code)]

use rangeprune_ir::{parse_function, BlockIdx, Function, Terminator};
use rangeprune_pruner::{run_on_function, PruneOptions, PruneStats, RangeTable};
use std::collections::HashSet;

pub fn parse(src: &str) -> (Function, RangeTable) {
    let parsed = parse_function(src).unwrap();
    parsed.func.verify().unwrap();
    (parsed.func, parsed.ranges.into_iter().collect())
}

/// Runs the default pipeline with every check turned on.
pub fn prune(src: &str) -> (Function, PruneStats) {
    let (mut func, table) = parse(src);
    let options = PruneOptions {
        verify_each: true,
        ..Default::default()
    };
    let stats = run_on_function(&mut func, &table, &options);
    (func, stats)
}

pub fn block_names(func: &Function) -> Vec<String> {
    func.block_indices()
        .map(|idx| func[idx].name.clone())
        .collect()
}

pub fn block(func: &Function, name: &str) -> BlockIdx {
    func.block_by_name(name)
        .unwrap_or_else(|| panic!("no block named `{}`", name))
}

/// Every block is reachable and every terminator targets a block that is still there.
pub fn assert_well_formed(func: &Function) {
    func.verify().unwrap();
    let live: HashSet<BlockIdx> = func.block_indices().collect();
    for idx in func.block_indices() {
        for succ in func[idx].terminator().successors() {
            assert!(live.contains(&succ), "`{}` targets a removed block", func[idx].name);
        }
    }
}

/// No block is the only successor of its only predecessor.
pub fn assert_fully_merged(func: &Function) {
    for idx in func.block_indices() {
        let Some(pred) = func.single_predecessor(idx) else {
            continue;
        };
        if pred == idx || idx == func.entry() {
            continue;
        }
        assert!(
            !matches!(func[pred].terminator(), Terminator::Jump(_)),
            "`{}` should have been merged into `{}`",
            func[idx].name,
            func[pred].name
        );
    }
}

/// What running a function produced: the calls it made and the value it returned.
#[derive(Debug, PartialEq, Eq)]
pub struct Trace {
    pub calls: Vec<(String, Vec<i64>)>,
    pub ret: Option<i64>,
}

/// Runs `func` on concrete arguments. Calls return 0.
pub fn interpret(func: &Function, args: &[i64]) -> Trace {
    use rangeprune_ir::{InstKind, Value};
    use std::collections::HashMap;

    let mut env: HashMap<_, i64> = func
        .params()
        .iter()
        .copied()
        .zip(args.iter().copied())
        .collect();
    let get = |env: &HashMap<_, i64>, value: Value| match value {
        Value::Const(int) => int,
        Value::Local(id) => *env
            .get(&id)
            .unwrap_or_else(|| panic!("`%{}` used before it was defined", func.value_name(id))),
    };

    let mut calls = Vec::new();
    let mut idx = func.entry();
    for _ in 0..10_000 {
        for inst in &func[idx].insts {
            let result = match &inst.kind {
                InstKind::Cmp { pred, lhs, rhs } => {
                    pred.evaluate(get(&env, *lhs), get(&env, *rhs)) as i64
                }
                InstKind::Binary { op, lhs, rhs } => {
                    op.evaluate(get(&env, *lhs), get(&env, *rhs))
                }
                InstKind::Copy(value) => get(&env, *value),
                InstKind::Call { callee, args } => {
                    let args = args.iter().map(|&arg| get(&env, arg)).collect();
                    calls.push((callee.clone(), args));
                    0
                }
            };
            if let Some(id) = inst.result {
                env.insert(id, result);
            }
        }
        idx = match *func[idx].terminator() {
            Terminator::Jump(dest) => dest,
            Terminator::Branch {
                cond,
                then_dest,
                else_dest,
            } => {
                if get(&env, cond) != 0 {
                    then_dest
                } else {
                    else_dest
                }
            }
            Terminator::Return(value) => {
                return Trace {
                    calls,
                    ret: value.map(|value| get(&env, value)),
                };
            }
        };
    }
    panic!("`@{}` did not return", func.name);
}

/// Every combination of arguments with each one drawn from its inclusive range.
pub fn inputs(ranges: &[(i64, i64)]) -> Vec<Vec<i64>> {
    ranges.iter().fold(vec![Vec::new()], |acc, &(lo, hi)| {
        acc.into_iter()
            .flat_map(|prefix| {
                (lo..=hi).map(move |arg| {
                    let mut args = prefix.clone();
                    args.push(arg);
                    args
                })
            })
            .collect()
    })
}
