use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum MergeError {
    IoError(std::io::Error),
    FileNotFound(PathBuf),
    MissingColumn { column: String, path: PathBuf },
    CsvError(csv::Error),
    ParsingError(String),
    Msg(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MergeError::IoError(err) => write!(f, "I/O error: {err}"),
            MergeError::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            MergeError::MissingColumn { column, path } => {
                write!(f, "column '{column}' not found in {}", path.display())
            }
            MergeError::CsvError(err) => write!(f, "CSV error: {err}"),
            MergeError::ParsingError(msg) => write!(f, "parsing error: {msg}"),
            MergeError::Msg(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::IoError(err) => Some(err),
            MergeError::CsvError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MergeError {
    fn from(err: std::io::Error) -> Self {
        MergeError::IoError(err)
    }
}

impl From<csv::Error> for MergeError {
    fn from(err: csv::Error) -> Self {
        MergeError::CsvError(err)
    }
}

impl From<serde_json::Error> for MergeError {
    fn from(err: serde_json::Error) -> Self {
        MergeError::ParsingError(format!("JSON: {err}"))
    }
}
