use crate::function::{BlockIdx, Function};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("terminator of block `{block}` targets a removed block")]
    DanglingTarget { block: String },
    #[error("edges leaving block `{block}` do not match its terminator")]
    EdgeMismatch { block: String },
    #[error("block `{block}` is unreachable from the entry block")]
    Unreachable { block: String },
}

impl Function {
    /// Checks that every terminator targets a live block, that the edge list agrees with the
    /// terminators, and that every block is reachable from the entry.
    pub fn verify(&self) -> Result<(), VerifyError> {
        self.verify_edges()?;
        let reachable = self.reachable_blocks();
        match self.block_indices().find(|idx| !reachable.contains(idx)) {
            Some(idx) => Err(VerifyError::Unreachable {
                block: self[idx].name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Like [`Function::verify`], but allows blocks that can't be reached from the entry.
    pub fn verify_edges(&self) -> Result<(), VerifyError> {
        for idx in self.block_indices() {
            let block = &self[idx];
            let mut expected = block.terminator().edges().into_vec();
            if expected.iter().any(|&(dest, _)| !self.contains_block(dest)) {
                return Err(VerifyError::DanglingTarget {
                    block: block.name.clone(),
                });
            }

            let mut actual: Vec<(BlockIdx, _)> = self
                .cfg()
                .edges_directed(idx, Direction::Outgoing)
                .map(|edge| (edge.target(), *edge.weight()))
                .collect();
            expected.sort();
            actual.sort();
            if expected != actual {
                return Err(VerifyError::EdgeMismatch {
                    block: block.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Terminator;

    #[test]
    fn detects_unreachable_block() {
        let mut func = Function::new("f", "entry");
        let exit = func.add_block("exit");
        func.set_terminator(func.entry(), Terminator::Jump(exit));
        assert_eq!(func.verify(), Ok(()));

        func.set_terminator(func.entry(), Terminator::Return(None));
        assert_eq!(
            func.verify(),
            Err(VerifyError::Unreachable {
                block: "exit".to_string()
            })
        );
        assert_eq!(func.verify_edges(), Ok(()));
    }
}
