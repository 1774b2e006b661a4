//! Full service wired to mock board/storage and the simulated WiFi and
//! MQTT adapters.

use smartswitch::adapters::mqtt::MqttAdapter;
use smartswitch::adapters::wifi::WifiAdapter;
use smartswitch::app::connectivity::TickOutcome;
use smartswitch::app::service::AppService;
use smartswitch::config::SystemConfig;
use smartswitch::identity;

use crate::mock_hw::{MockBoard, MockNvs, RecordingSink};

pub const DEVICE_ID: &str = "1225102502120006";
pub const PUB_TOPIC: &str = "DMA/SmartSwitch/PUB";
pub const HB_TOPIC: &str = "DMA/SmartSwitch/HB";

pub struct Rig {
    pub config: SystemConfig,
    pub app: AppService,
    pub board: MockBoard,
    pub wifi: WifiAdapter,
    pub mqtt: MqttAdapter,
    pub nvs: MockNvs,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_storage(MockNvs::new())
    }

    /// Boot a fresh device over existing storage.
    pub fn with_storage(nvs: MockNvs) -> Self {
        Self::boot(SystemConfig::default(), nvs)
    }

    /// Boot a fresh device with a custom (validated) configuration.
    pub fn with_config(config: SystemConfig) -> Self {
        config.validate().unwrap();
        Self::boot(config, MockNvs::new())
    }

    fn boot(config: SystemConfig, nvs: MockNvs) -> Self {
        let mut wifi = WifiAdapter::new();
        wifi.set_credentials(&config.network.wifi_ssid, &config.network.wifi_password)
            .unwrap();
        let mqtt = MqttAdapter::new(&config.broker);
        let mut rig = Self {
            app: AppService::new(&config),
            config,
            board: MockBoard::new(),
            wifi,
            mqtt,
            nvs,
            sink: RecordingSink::new(),
        };
        rig.app.start(&mut rig.board, &rig.nvs, &mut rig.sink);
        rig
    }

    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        self.app.tick(
            now_ms,
            &mut self.board,
            &mut self.wifi,
            &mut self.mqtt,
            &mut self.nvs,
            &mut self.sink,
        )
    }

    /// Link at t=0, session at t=10.
    pub fn bring_online(&mut self) {
        assert_eq!(self.tick(0), TickOutcome::Recovering);
        assert_eq!(self.tick(10), TickOutcome::SessionEstablished);
        assert!(self.app.is_online());
    }

    pub fn inbound_topic(&self) -> String {
        identity::inbound_topic(&self.config.broker, DEVICE_ID).to_string()
    }

    /// Deliver `payload` on the device's command topic.
    pub fn send(&mut self, payload: &str) {
        let topic = self.inbound_topic();
        assert!(self.mqtt.sim_inject(&topic, payload), "device not subscribed");
    }

    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.mqtt
            .sim_published()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn into_storage(self) -> MockNvs {
        self.nvs
    }
}
