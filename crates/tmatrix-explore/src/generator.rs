//! The output contract shared by the pairwise and exhaustive modes.
//!
//! A caller picks a mode once and consumes results the same way either way:
//! parameter names, then a lazy sequence of cases.

use rand::RngCore;
use tmatrix_ir::Value;

use crate::solver::aetg::AetgGenerator;
use crate::solver::matrix::MatrixGenerator;
use crate::solver::TestCase;

pub trait CaseGenerator {
    /// Parameter names, in the order tuple cases use.
    fn names(&self) -> Vec<&str>;

    /// Lazily produce cases.
    ///
    /// For [`AetgGenerator`] this drains the generator; a second call yields
    /// nothing. [`MatrixGenerator`] starts over on every call.
    fn cases(&mut self) -> Box<dyn Iterator<Item = TestCase> + '_>;

    /// Cases as value tuples ordered like [`names`](Self::names).
    fn tuple_cases(&mut self) -> Box<dyn Iterator<Item = Vec<Value>> + '_> {
        Box::new(self.cases().map(TestCase::into_tuple))
    }
}

impl<R: RngCore> CaseGenerator for AetgGenerator<R> {
    fn names(&self) -> Vec<&str> {
        AetgGenerator::names(self)
    }

    fn cases(&mut self) -> Box<dyn Iterator<Item = TestCase> + '_> {
        Box::new(self.by_ref())
    }
}

impl CaseGenerator for MatrixGenerator {
    fn names(&self) -> Vec<&str> {
        MatrixGenerator::names(self)
    }

    fn cases(&mut self) -> Box<dyn Iterator<Item = TestCase> + '_> {
        Box::new(MatrixGenerator::cases(self))
    }
}
