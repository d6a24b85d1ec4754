use std::{net::Ipv4Addr, thread, time::Duration};

use anyhow::{anyhow, Context};
use embedded_svc::{
    http::{client::Client as HttpClient, Method, Status},
    io::Read,
    wifi::{AuthMethod, ClientConfiguration, Configuration},
};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{
        delay::FreeRtos,
        gpio::{AnyOutputPin, Output, PinDriver},
        modem::Modem,
        prelude::Peripherals,
    },
    http::client::{Configuration as HttpClientConfiguration, EspHttpConnection},
    io::EspIOError,
    log::EspLogger,
    nvs::EspDefaultNvsPartition,
    wifi::{BlockingWifi, EspWifi},
};
use log::{error, info, warn};

use ledmirror_common::{
    collect_body, config::IndicatorPinConfig, DocumentClient, Indicator, IndicatorOutputs, LinkError,
    LinkStatus, MirrorConfig, NetworkLink, PollController, PollResult, TransportError,
};

const RESTART_DELAY_SEC: u64 = 10;

type IndicatorPin = PinDriver<'static, AnyOutputPin, Output>;

struct EspLink {
    wifi: BlockingWifi<EspWifi<'static>>,
}

struct EspDocumentClient {
    base_url: String,
    timeout: Duration,
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let config = build_config().context("invalid build-time configuration")?;
    info!(
        "mirroring {} every {} ms ({} match)",
        config.remote.url(),
        config.poll.interval_ms,
        config.poll.match_mode.as_str()
    );

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let Peripherals { modem, .. } = Peripherals::take()?;

    let outputs = init_outputs(&config.pins).context("failed to configure indicator outputs")?;
    let link = EspLink::new(modem, sys_loop, nvs_partition).context("wifi driver init failed")?;
    let client = EspDocumentClient::new(&config);

    let mut controller = PollController::new(config, link, client, outputs, FreeRtos);

    if let Err(err) = controller.run() {
        error!("startup failed: {err}");
        error!("restarting in {RESTART_DELAY_SEC}s");
        thread::sleep(Duration::from_secs(RESTART_DELAY_SEC));
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    Ok(())
}

fn build_config() -> anyhow::Result<MirrorConfig> {
    let mut config = MirrorConfig::default();

    config.network.wifi_ssid = option_env!("WIFI_SSID").unwrap_or("CHANGE_ME").to_string();
    config.network.wifi_pass = option_env!("WIFI_PASS").unwrap_or_default().to_string();

    if let Some(host) = option_env!("LEDS_HOST") {
        config.remote.host = host.to_string();
    }
    if let Some(port) = option_env!("LEDS_PORT") {
        config.remote.port = port
            .parse()
            .with_context(|| format!("LEDS_PORT `{port}` is not a port number"))?;
    }
    if let Some(path) = option_env!("LEDS_PATH") {
        config.remote.path = path.to_string();
    }
    if let Some(timeout) = option_env!("CONNECT_TIMEOUT_MS") {
        config.network.connect_timeout_ms = Some(
            timeout
                .parse()
                .with_context(|| format!("CONNECT_TIMEOUT_MS `{timeout}` is not a number"))?,
        );
    }
    if let Some(mode) = option_env!("MATCH_MODE") {
        config.poll.match_mode = mode
            .parse()
            .map_err(|_| anyhow!("MATCH_MODE `{mode}` must be `literal` or `structured`"))?;
    }

    config.sanitize();
    config.validate()?;
    Ok(config)
}

fn init_outputs(pins: &IndicatorPinConfig) -> anyhow::Result<IndicatorOutputs<IndicatorPin>> {
    let red = output_pin(pins, Indicator::Red)?;
    let green = output_pin(pins, Indicator::Green)?;
    let blue = output_pin(pins, Indicator::Blue)?;
    Ok(IndicatorOutputs::new(red, green, blue))
}

fn output_pin(pins: &IndicatorPinConfig, indicator: Indicator) -> anyhow::Result<IndicatorPin> {
    let pin = pins.pin(indicator);
    let driver = unsafe { PinDriver::output(AnyOutputPin::new(pin)) }
        .with_context(|| format!("GPIO{pin} cannot drive {}", indicator.label()))?;
    info!("{} indicator on GPIO{pin}", indicator.label());
    Ok(driver)
}

impl EspLink {
    fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs_partition: EspDefaultNvsPartition,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs_partition))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;
        Ok(Self { wifi })
    }

    fn configure(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };

        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: ssid
                    .try_into()
                    .map_err(|_| LinkError::Unavailable("wifi ssid too long".to_string()))?,
                password: password
                    .try_into()
                    .map_err(|_| LinkError::Unavailable("wifi password too long".to_string()))?,
                auth_method,
                ..Default::default()
            }))
            .map_err(|err| LinkError::Unavailable(err.to_string()))?;

        self.wifi
            .start()
            .map_err(|err| LinkError::Unavailable(err.to_string()))?;
        info!("wifi started, connecting to `{ssid}`");
        Ok(())
    }
}

impl NetworkLink for EspLink {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        if !self.wifi.is_started().unwrap_or(false) {
            self.configure(ssid, password)?;
        }

        if let Err(err) = self.wifi.connect() {
            let _ = self.wifi.disconnect();
            return Err(LinkError::Association(err.to_string()));
        }

        self.wifi
            .wait_netif_up()
            .map_err(|err| LinkError::NetifDown(err.to_string()))
    }

    fn current_address(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }

    fn status(&self) -> LinkStatus {
        match (self.wifi.is_connected(), self.wifi.is_up()) {
            (Ok(true), Ok(true)) => LinkStatus::Connected,
            (Ok(true), _) => LinkStatus::Connecting,
            (Ok(false), _) => LinkStatus::Disconnected,
            (Err(err), _) => {
                warn!("wifi status unavailable: {err}");
                LinkStatus::Disconnected
            }
        }
    }
}

impl EspDocumentClient {
    fn new(config: &MirrorConfig) -> Self {
        Self {
            base_url: config.remote.base_url(),
            timeout: Duration::from_millis(config.poll.http_timeout_ms),
        }
    }
}

impl DocumentClient for EspDocumentClient {
    fn get(&mut self, path: &str) -> Result<PollResult, TransportError> {
        let http_conf = HttpClientConfiguration {
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&http_conf)
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        let mut client = HttpClient::wrap(connection);

        let url = format!("{}{}", self.base_url, path);
        let request = client
            .request(Method::Get, &url, &[("accept", "application/json")])
            .map_err(transport_error)?;
        let mut response = request.submit().map_err(transport_error)?;

        let status = response.status();
        let body = collect_body(|chunk| response.read(chunk))
            .map_err(|err| TransportError::Body(format!("{err:?}")))?;
        info!("GET {url} -> HTTP {status}");

        Ok(PollResult::new(status, body))
    }
}

fn transport_error(err: EspIOError) -> TransportError {
    if err.0.code() == esp_idf_svc::sys::ESP_ERR_TIMEOUT as i32 {
        TransportError::Timeout
    } else {
        TransportError::Other(format!("{err:?}"))
    }
}
