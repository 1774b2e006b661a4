//! SmartSwitch Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter   Esp32Time  │
//! │  (relays, LED, button,  (EventSink)    (Storage)               │
//! │   RF mailbox, system)                                          │
//! │  WifiAdapter            MqttAdapter                            │
//! │  (NetworkPort)          (BrokerPort)                           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Connectivity · Debounce · Dispatcher · SwitchBank     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use smartswitch::adapters::hardware::HardwareAdapter;
use smartswitch::adapters::log_sink::LogEventSink;
use smartswitch::adapters::mqtt::MqttAdapter;
use smartswitch::adapters::nvs::NvsAdapter;
use smartswitch::adapters::rf_receiver::RfReceiver;
use smartswitch::adapters::time::Esp32TimeAdapter;
use smartswitch::adapters::wifi::WifiAdapter;
use smartswitch::app::service::AppService;
use smartswitch::config::SystemConfig;
use smartswitch::drivers::button::ResetButton;
use smartswitch::drivers::hw_init::{self, GpioInput, GpioOutput};
use smartswitch::drivers::relay::RelayBank;
use smartswitch::drivers::status_led::StatusLed;
use smartswitch::drivers::watchdog::Watchdog;
use smartswitch::error::Error;
use smartswitch::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SmartSwitch v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Storage + configuration ────────────────────────────
    let mut nvs = NvsAdapter::new().map_err(Error::from)?;
    let mut config = SystemConfig::from_build_env()?;
    if config.apply_stored_credentials(&nvs) {
        info!("Config: using stored WiFi credentials");
    }
    config.validate()?;

    // ── 3. Hardware ───────────────────────────────────────────
    hw_init::init_peripherals().map_err(|e| anyhow!("peripheral init failed: {e}"))?;
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    let mut hw = HardwareAdapter::new(
        RelayBank::new(pins::SWITCH_GPIOS.map(GpioOutput::new)),
        StatusLed::new(GpioOutput::new(pins::STATUS_LED_GPIO)),
        ResetButton::new(GpioInput::new(pins::RESET_BUTTON_GPIO), config.reset_hold_ms),
        RfReceiver::new(),
    );

    // ── 4. Network adapters ───────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?;

    let mut wifi = WifiAdapter::new(driver);
    if let Err(e) = wifi.set_credentials(&config.network.wifi_ssid, &config.network.wifi_password) {
        // The connectivity machine burns its cycle budget and restarts.
        warn!("WiFi: unusable credentials ({})", e);
    }
    let mut mqtt = MqttAdapter::new(&config.broker);
    let mut log_sink = LogEventSink::new();
    let time = Esp32TimeAdapter::new();

    // ── 5. App service ────────────────────────────────────────
    let mut app = AppService::new(&config);
    app.start(&mut hw, &nvs, &mut log_sink);

    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        app.tick(
            time.uptime_ms(),
            &mut hw,
            &mut wifi,
            &mut mqtt,
            &mut nvs,
            &mut log_sink,
        );
        watchdog.feed();
        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}
