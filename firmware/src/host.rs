use std::{
    convert::Infallible,
    io::Read,
    net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    path::PathBuf,
    thread,
    time::Duration,
};

use anyhow::{anyhow, Context};
use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, OutputPin},
};
use reqwest::blocking::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ledmirror_common::{
    collect_body, DocumentClient, Indicator, IndicatorOutputs, LinkError, LinkStatus, MirrorConfig,
    NetworkLink, PollController, PollResult, TransportError,
};

/// Stands in for a GPIO on the desktop; level changes go to the log.
struct SimulatedPin {
    indicator: Indicator,
    gpio: i32,
    level: Option<bool>,
}

/// "Associated" means the remote host resolves.
struct HostLink {
    host: String,
    port: u16,
    resolved: Option<SocketAddr>,
}

struct HostClient {
    http: Client,
    base_url: String,
}

struct StdDelay;

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    info!(
        "simulating indicator mirror of {} every {} ms ({} match)",
        config.remote.url(),
        config.poll.interval_ms,
        config.poll.match_mode.as_str()
    );

    let outputs = IndicatorOutputs::new(
        SimulatedPin::new(Indicator::Red, config.pins.red_pin),
        SimulatedPin::new(Indicator::Green, config.pins.green_pin),
        SimulatedPin::new(Indicator::Blue, config.pins.blue_pin),
    );
    let link = HostLink {
        host: config.remote.host.clone(),
        port: config.remote.port,
        resolved: None,
    };
    let client = HostClient::new(&config)?;

    let mut controller = PollController::new(config, link, client, outputs, StdDelay);
    match controller.run() {
        Ok(never) => match never {},
        Err(err) => Err(anyhow!(err).context("indicator mirror failed to start")),
    }
}

fn load_config() -> anyhow::Result<MirrorConfig> {
    let mut config = match std::env::var_os("LEDMIRROR_CONFIG").map(PathBuf::from) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => MirrorConfig::default(),
    };

    if let Ok(host) = std::env::var("LEDS_HOST") {
        config.remote.host = host;
    }
    if let Some(port) = env_number("LEDS_PORT")? {
        config.remote.port = port;
    }
    if let Ok(path) = std::env::var("LEDS_PATH") {
        config.remote.path = path;
    }
    if let Some(interval_ms) = env_number("POLL_INTERVAL_MS")? {
        config.poll.interval_ms = interval_ms;
    }
    if let Some(timeout_ms) = env_number("CONNECT_TIMEOUT_MS")? {
        config.network.connect_timeout_ms = Some(timeout_ms);
    }
    if let Ok(mode) = std::env::var("MATCH_MODE") {
        config.poll.match_mode = mode
            .parse()
            .map_err(|_| anyhow!("MATCH_MODE `{mode}` must be `literal` or `structured`"))?;
    }

    // No radio on the host; any non-placeholder SSID lets startup proceed.
    if !config.network.has_station_credentials() {
        config.network.wifi_ssid =
            std::env::var("WIFI_SSID").unwrap_or_else(|_| "host-simulator".to_string());
    }

    config.sanitize();
    config.validate()?;
    Ok(config)
}

fn env_number<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} `{value}` is not a valid number")),
        Err(_) => Ok(None),
    }
}

impl SimulatedPin {
    fn new(indicator: Indicator, gpio: i32) -> Self {
        Self {
            indicator,
            gpio,
            level: None,
        }
    }

    fn write(&mut self, high: bool) {
        if self.level != Some(high) {
            info!(
                "GPIO{} ({}) -> {}",
                self.gpio,
                self.indicator.label(),
                if high { "HIGH" } else { "LOW" }
            );
        }
        self.level = Some(high);
    }
}

impl ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

impl NetworkLink for HostLink {
    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), LinkError> {
        let resolved = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| LinkError::Unavailable(format!("cannot resolve {}: {err}", self.host)))?
            .next()
            .ok_or_else(|| LinkError::Unavailable(format!("{} has no addresses", self.host)))?;
        self.resolved = Some(resolved);
        Ok(())
    }

    fn current_address(&self) -> Option<Ipv4Addr> {
        let remote = self.resolved?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).ok()?;
        socket.connect(remote).ok()?;
        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        }
    }

    fn status(&self) -> LinkStatus {
        if self.resolved.is_some() {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }
}

impl HostClient {
    fn new(config: &MirrorConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.poll.http_timeout_ms))
            .build()
            .context("failed to build https client")?;
        Ok(Self {
            http,
            base_url: config.remote.base_url(),
        })
    }
}

impl DocumentClient for HostClient {
    fn get(&mut self, path: &str) -> Result<PollResult, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let mut response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .send()
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = collect_body(|chunk| response.read(chunk))
            .map_err(|err| TransportError::Body(err.to_string()))?;
        info!("GET {url} -> HTTP {status}");

        Ok(PollResult::new(status, body))
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
