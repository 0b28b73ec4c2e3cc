// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("endpoint_type must be 'Interface' or 'Gateway' (got '{0}')")]
    UnknownEndpointType(String),

    #[error("Invalid output format: {0}")]
    InvalidOutputFormat(String),
}
