use thiserror::Error;

/// Fatal failures. Anything not listed here is reported through
/// `errors`/`warnings` on the analysis records instead.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("no valid files found")]
    Empty,

    #[error("ZIP error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis superseded by a newer request")]
    Superseded,
}

/// A single token or line that could not be understood. Collected per file,
/// never propagated past the content parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: bad coordinate in `{word}`")]
    BadCoordinate { line: usize, word: String },

    #[error("line {line}: bad D-code in `{word}`")]
    BadDCode { line: usize, word: String },

    #[error("line {line}: bad format specification `{content}`: {reason}")]
    BadFormat {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("line {line}: bad aperture definition `{content}`: {reason}")]
    BadAperture {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("line {line}: bad tool definition `{content}`")]
    BadTool { line: usize, content: String },

    #[error("line {line}: unrecognized command `{word}`")]
    Unrecognized { line: usize, word: String },

    #[error("line {line}: unterminated extended command block")]
    Unterminated { line: usize },
}
