pub mod generator;
pub mod solver;

pub use generator::CaseGenerator;
pub use solver::aetg::{AetgGenerator, Round};
pub use solver::coverage::CoverageReport;
pub use solver::matrix::{MatrixError, MatrixGenerator};
pub use solver::TestCase;
