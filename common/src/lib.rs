pub mod body;
pub mod config;
pub mod controller;
pub mod desired;
pub mod outputs;
pub mod ports;
pub mod types;

#[cfg(test)]
mod testing;

pub use body::collect_body;
pub use config::{
    ConfigError, IndicatorPinConfig, MirrorConfig, NetworkConfig, PollConfig, RemoteConfig,
};
pub use controller::{ApplyReport, CycleReport, PollController, StartupError};
pub use desired::DesiredState;
pub use outputs::IndicatorOutputs;
pub use ports::{DocumentClient, LinkError, NetworkLink, OutputError, TransportError};
pub use types::{Indicator, LinkStatus, MatchMode, Phase, PollOutcome, PollResult, HTTP_OK};
