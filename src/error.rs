#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LeapsecError {
    #[error("Leap second table is not valid for the provided time")]
    Expired,
    #[error("Time is before the first record of the leap second table")]
    OutOfRange,
    #[error("Leap second table parse error: {0}")]
    Parse(String),
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Fewer bytes were available than a Time64 requires.
    #[error("Not enough bytes: got {actual}, need {minimum}")]
    NotEnoughData { actual: usize, minimum: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Elapsed time would be negative, e.g., a timestamp before the version's epoch.
    #[error("Underflow")]
    Underflow,
    /// Elapsed time does not fit in an unsigned 64-bit count of microseconds.
    #[error("Overflow")]
    Overflow,

    #[error("Unsupported certificate version: {0}")]
    UnsupportedVersion(u8),
    #[error("Time cannot be represented as a calendar timestamp")]
    Unrepresentable,

    #[error(transparent)]
    Leapsec(#[from] LeapsecError),
}

pub type Result<T> = std::result::Result<T, Error>;
