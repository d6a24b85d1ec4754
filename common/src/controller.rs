use std::{
    convert::Infallible,
    net::Ipv4Addr,
    time::{Duration, Instant},
};

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    config::MirrorConfig,
    desired::DesiredState,
    outputs::IndicatorOutputs,
    ports::{DocumentClient, LinkError, NetworkLink, OutputError},
    types::{LinkStatus, Phase, PollOutcome},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("wifi credentials are not configured")]
    MissingCredentials,
    #[error("wifi did not connect within {waited_ms} ms after {attempts} attempts: {last_error}")]
    ConnectTimeout {
        attempts: u32,
        waited_ms: u64,
        last_error: LinkError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyReport {
    /// `None` when the cycle held the previous pin levels.
    pub applied: Option<DesiredState>,
    pub write_failures: Vec<OutputError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub outcome: PollOutcome,
    pub apply: ApplyReport,
}

/// Fetches the indicator document once per interval and mirrors it onto the
/// three outputs.
///
/// INIT runs once via [`PollController::start`]; every [`PollController::cycle`]
/// then walks POLL, APPLY and WAIT. Pin levels are the only state carried
/// between cycles, and they live in the hardware.
pub struct PollController<L, C, P, D> {
    config: MirrorConfig,
    link: L,
    client: C,
    outputs: IndicatorOutputs<P>,
    delay: D,
    phase: Phase,
    cycles: u64,
}

impl<L, C, P, D> PollController<L, C, P, D>
where
    L: NetworkLink,
    C: DocumentClient,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(
        config: MirrorConfig,
        link: L,
        client: C,
        outputs: IndicatorOutputs<P>,
        delay: D,
    ) -> Self {
        Self {
            config,
            link,
            client,
            outputs,
            delay,
            phase: Phase::Init,
            cycles: 0,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// INIT: drive every output low, then wait for the station link.
    pub fn start(&mut self) -> Result<Option<Ipv4Addr>, StartupError> {
        self.phase = Phase::Init;

        for err in self.outputs.all_off() {
            warn!("startup: {err}");
        }

        if !self.config.network.has_station_credentials() {
            return Err(StartupError::MissingCredentials);
        }

        let address = self.establish_link()?;
        match address {
            Some(ip) => info!("wifi connected, address {ip}"),
            None => info!("wifi connected, address not yet assigned"),
        }

        self.phase = Phase::Poll;
        Ok(address)
    }

    fn establish_link(&mut self) -> Result<Option<Ipv4Addr>, StartupError> {
        let network = self.config.network.clone();
        let deadline = network.connect_timeout_ms.map(Duration::from_millis);
        let started = Instant::now();
        let mut attempt: u32 = 0;

        info!("connecting to wifi `{}`", network.wifi_ssid);

        loop {
            attempt = attempt.saturating_add(1);
            let last_error = match self.link.connect(&network.wifi_ssid, &network.wifi_pass) {
                Ok(()) => return Ok(self.link.current_address()),
                Err(err) => err,
            };
            warn!("wifi connect attempt {attempt} failed: {last_error}");

            if let Some(deadline) = deadline {
                let waited = started.elapsed();
                if waited >= deadline {
                    return Err(StartupError::ConnectTimeout {
                        attempts: attempt,
                        waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        last_error,
                    });
                }
            }

            self.sleep_ms(network.connect_retry_delay_ms);
        }
    }

    /// POLL: one GET for the configured document path.
    pub fn poll(&mut self) -> PollOutcome {
        self.phase = Phase::Poll;

        if self.link.status() == LinkStatus::Disconnected {
            warn!("wifi link down; trying one reconnect before polling");
            let network = &self.config.network;
            if let Err(err) = self.link.connect(&network.wifi_ssid, &network.wifi_pass) {
                warn!("reconnect failed, holding indicators: {err}");
                return PollOutcome::LinkDown(err);
            }
        }

        let outcome = PollOutcome::classify(self.client.get(&self.config.remote.path));
        match &outcome {
            PollOutcome::Success(response) => {
                debug!("fetched {} bytes: {}", response.body.len(), response.body);
            }
            PollOutcome::NonSuccess(response) => {
                warn!(
                    "GET {} returned HTTP {}, holding indicators",
                    self.config.remote.path, response.status_code
                );
            }
            PollOutcome::TransportFailure(err) => {
                warn!("GET {} failed: {err}", self.config.remote.path);
            }
            PollOutcome::LinkDown(_) => {}
        }
        outcome
    }

    /// APPLY: writes all three pins on HTTP 200, leaves them untouched otherwise.
    pub fn apply(&mut self, outcome: &PollOutcome) -> ApplyReport {
        self.phase = Phase::Apply;

        let PollOutcome::Success(response) = outcome else {
            return ApplyReport::default();
        };

        let desired = DesiredState::evaluate(&response.body, self.config.poll.match_mode);
        let write_failures = self.outputs.apply(&desired);
        for err in &write_failures {
            error!("{err}");
        }
        info!("indicators {desired}");

        ApplyReport {
            applied: Some(desired),
            write_failures,
        }
    }

    /// WAIT: the only suspension point of a cycle.
    pub fn wait(&mut self) {
        self.phase = Phase::Wait;
        self.sleep_ms(self.config.poll.interval_ms);
    }

    pub fn cycle(&mut self) -> CycleReport {
        self.cycles = self.cycles.saturating_add(1);
        let outcome = self.poll();
        let apply = self.apply(&outcome);
        self.wait();
        CycleReport {
            cycle: self.cycles,
            outcome,
            apply,
        }
    }

    /// Runs INIT and then cycles until reset. Returns only if startup fails.
    pub fn run(&mut self) -> Result<Infallible, StartupError> {
        self.start()?;
        loop {
            self.cycle();
        }
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.delay.delay_ms(u32::try_from(ms).unwrap_or(u32::MAX));
    }
}
