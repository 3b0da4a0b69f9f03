use thiserror::Error;

/// Every way a snapshot read can be refused. Each is recoverable: the
/// reader returns the error and the partially built project is dropped.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a snapshot: bad magic {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported snapshot version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("file count {count} exceeds limit {max}")]
    FileCountExceeded { count: u32, max: u32 },

    #[error("metric count {count} exceeds limit {max} (file index {file})")]
    MetricCountExceeded { file: u32, count: u32, max: u32 },

    #[error("string length {len} exceeds limit {max}")]
    StringTooLong { len: u32, max: u32 },

    #[error("string is not NUL-terminated")]
    MissingNulTerminator,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("string contains an interior NUL byte")]
    InteriorNul,

    #[error("unknown language code {value} (file index {file})")]
    UnknownLanguage { file: u32, value: u32 },

    #[error("metric '{name}' in file index {file} is NaN or infinite")]
    NonFiniteMetric { file: u32, name: String },

    #[error("snapshot truncated while reading {reading}")]
    Truncated { reading: &'static str },

    #[error("string id {id} does not resolve; refusing to write a corrupt project")]
    DanglingString { id: u32 },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
