const BUILD_ENV: [&str; 7] = [
    "WIFI_SSID",
    "WIFI_PASS",
    "LEDS_HOST",
    "LEDS_PORT",
    "LEDS_PATH",
    "CONNECT_TIMEOUT_MS",
    "MATCH_MODE",
];

fn main() {
    for key in BUILD_ENV {
        println!("cargo:rerun-if-env-changed={key}");
    }

    embuild::espidf::sysenv::output();
}
