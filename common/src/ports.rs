use std::net::Ipv4Addr;

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

use crate::types::{Indicator, LinkStatus, PollResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("wifi association failed: {0}")]
    Association(String),
    #[error("network interface did not come up: {0}")]
    NetifDown(String),
    #[error("link unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to open connection: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("http client error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to drive {} output: {kind}", .indicator.label())]
pub struct OutputError {
    pub indicator: Indicator,
    pub kind: ErrorKind,
}

/// Station-mode network association.
///
/// A single `connect` call is one association attempt; the controller owns
/// the retry loop and the optional deadline.
pub trait NetworkLink {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), LinkError>;

    fn current_address(&self) -> Option<Ipv4Addr>;

    fn status(&self) -> LinkStatus;
}

/// HTTPS GET against the fixed remote host.
///
/// Any response that made it back over the wire is `Ok`, whatever its status
/// code. `Err` is reserved for failures below HTTP.
pub trait DocumentClient {
    fn get(&mut self, path: &str) -> Result<PollResult, TransportError>;
}
