use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("malformed vote encoding: {0}")]
    Malformed(String),

    #[error("vote contains no block hashes")]
    Empty,

    #[error("vote contains {0} block hashes, maximum is 12")]
    TooManyHashes(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid voting config: {0}")]
    Parse(String),
}
