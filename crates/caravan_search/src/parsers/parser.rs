use std::path::Path;

use crate::{
    parsers::{solomon::SolomonParser, vrplib::VrplibParser},
    problem::{problem_data::ProblemData, problem_data::ProblemError},
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unknown edge weight type {0:?}")]
    UnknownEdgeWeightType(String),

    #[error("unknown edge weight format {0:?}")]
    UnknownEdgeWeightFormat(String),

    #[error("unknown section {0:?}")]
    UnknownSection(String),

    #[error("unknown rounding function {0:?}")]
    UnknownRoundFunc(String),

    #[error("the depot must be the first location")]
    DepotNotFirst,

    #[error("depots must occupy the lowest location indices contiguously")]
    DepotsNotContiguous,

    #[error("location {location} has a time window that opens after it closes")]
    TimeWindowOpenAfterClose { location: usize },

    #[error("edge weight section has {actual} entries, expected {expected}")]
    IncompleteEdgeWeights { actual: usize, expected: usize },

    #[error("malformed instance: {0}")]
    Malformed(String),

    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Supported instance file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFormat {
    /// The tabular VRPLIB-style format with keyed specifications and
    /// `*_SECTION` blocks.
    Vrplib,
    /// The Solomon VRPTW format.
    Solomon,
}

/// How raw floating-point values (coordinates, demands, windows, computed
/// distances) become the integers the engine works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundFunc {
    /// Values taken as-is; the data is expected to already be integral.
    #[default]
    None,
    /// Round to the nearest integer.
    Round,
    /// Truncate toward zero.
    Trunc,
    /// Scale by ten, then truncate: one-decimal fixed point.
    Trunc1,
    /// The DIMACS convention; identical to [`RoundFunc::Trunc1`].
    Dimacs,
}

impl RoundFunc {
    pub fn from_name(name: &str) -> Result<RoundFunc, ParseError> {
        match name {
            "none" => Ok(RoundFunc::None),
            "round" => Ok(RoundFunc::Round),
            "trunc" => Ok(RoundFunc::Trunc),
            "trunc1" => Ok(RoundFunc::Trunc1),
            "dimacs" => Ok(RoundFunc::Dimacs),
            _ => Err(ParseError::UnknownRoundFunc(name.to_owned())),
        }
    }

    pub fn apply(&self, value: f64) -> i64 {
        match self {
            RoundFunc::None | RoundFunc::Trunc => value as i64,
            RoundFunc::Round => value.round() as i64,
            RoundFunc::Trunc1 | RoundFunc::Dimacs => (10.0 * value) as i64,
        }
    }
}

pub trait DatasetParser {
    fn parse<P: AsRef<Path>>(
        &self,
        file: P,
        round_func: RoundFunc,
    ) -> Result<ProblemData, ParseError>;
}

/// Reads a problem instance from disk.
pub fn read<P: AsRef<Path>>(
    path: P,
    instance_format: InstanceFormat,
    round_func: RoundFunc,
) -> Result<ProblemData, ParseError> {
    match instance_format {
        InstanceFormat::Vrplib => VrplibParser.parse(path, round_func),
        InstanceFormat::Solomon => SolomonParser.parse(path, round_func),
    }
}
