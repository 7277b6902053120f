use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Bar {index} does not have a timestamp strictly after the previous bar")]
    NonMonotonicTimestamp { index: usize },
}
