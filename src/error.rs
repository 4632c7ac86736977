use std::io;
use std::path::PathBuf;

use derive_more::{Display, Error, From};
use shader_ast::{ParseError, ValidationErrors};
use shader_reduction::ReductionError;

#[derive(Debug, Display, Error, From)]
pub enum AppError {
    #[display("cannot access '{}': {source}", path.display())]
    #[from(ignore)]
    Io { path: PathBuf, source: io::Error },
    #[display("{_0}")]
    Parse(ParseError),
    #[display("{_0}")]
    Invalid(ValidationErrors),
    #[display("{_0}")]
    Reduction(ReductionError),
    #[display("no opportunity #{index}; {available} found")]
    #[from(ignore)]
    NoSuchOpportunity { index: usize, available: usize },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
