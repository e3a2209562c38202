pub mod parser;
pub mod solomon;
pub mod vrplib;

pub use parser::{DatasetParser, InstanceFormat, ParseError, RoundFunc, read};
