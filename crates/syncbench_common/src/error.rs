use core::fmt;

/// syncbench error
#[derive(Clone, PartialEq, Debug)]
pub enum Error {
    /// Generic invalid parameter
    InvalidParameter(&'static str),
    /// Invalid count
    InvalidCount(&'static str, usize),
    /// Index into a container is out of range
    IndexOutOfRange { index: usize, len: usize },
    /// A worker panicked before it could be joined
    WorkerPanicked(usize),
    /// An append-only sequence ran out of slots
    SequenceFull(usize),
    /// The settings could not be loaded
    Settings(String),
    /// IO error, e.g. failing to spawn a thread
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(s)              => f.write_fmt(format_args!("Invalid parameter: {s}")),
            Error::InvalidCount(name, count)        => f.write_fmt(format_args!("Invalid count for {name}: {count}")),
            Error::IndexOutOfRange { index, len }   => f.write_fmt(format_args!("Index {index} is out of range for a container of size {len}")),
            Error::WorkerPanicked(index)            => f.write_fmt(format_args!("Worker {index} panicked")),
            Error::SequenceFull(capacity)           => f.write_fmt(format_args!("Sequence is full, capacity: {capacity}")),
            Error::Settings(s)                      => f.write_fmt(format_args!("Failed to load settings: {s}")),
            Error::Io(s)                            => f.write_fmt(format_args!("IO error: {s}")),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// syncbench result
pub type Result<T> = core::result::Result<T, Error>;
