//! # Reporter-format parsers.
//!
//! One parser per console reporter format. Parsers are synchronous state
//! machines fed one [`LogLine`](crate::lines::LogLine) at a time; completed
//! runs go to the [`TestRunManager`](crate::testresult::TestRunManager).

mod mocha;
mod parser;
mod python;

pub use mocha::MochaParser;
pub use parser::TestResultParser;
pub use python::PythonParser;
