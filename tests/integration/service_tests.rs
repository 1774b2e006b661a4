//! Integration tests for the AppService → dispatcher → outputs pipeline.
//!
//! Broker commands and RF samples go in through the simulated adapters;
//! assertions are on relay outputs, the persisted record and what was
//! published.

use smartswitch::app::debounce::IngestOutcome;
use smartswitch::app::events::AppEvent;
use smartswitch::app::switch_bank::{SWITCH_KEY, SWITCH_NAMESPACE};
use smartswitch::config::SystemConfig;
use smartswitch::identity::OUTBOUND_TOPIC_CAPACITY;

use crate::mock_hw::MockNvs;
use crate::rig::{DEVICE_ID, HB_TOPIC, PUB_TOPIC, Rig};

// ── Broker commands ───────────────────────────────────────────

#[test]
fn single_switch_command_drives_persists_and_acks() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.send("sw2:1");
    rig.tick(20);

    assert_eq!(rig.board.outputs, [false, true, false, false]);
    assert_eq!(rig.nvs.raw(SWITCH_NAMESPACE, SWITCH_KEY), Some(&[0u8, 1, 0, 0][..]));
    assert_eq!(rig.published_on(PUB_TOPIC), vec![format!("{DEVICE_ID},sw2:1")]);
    assert_eq!(rig.board.flashes, vec![1]);
}

#[test]
fn all_switches_command_sets_every_channel() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.send("sw1234:1");
    rig.tick(20);
    assert_eq!(rig.board.outputs, [true; 4]);

    rig.send("sw1234:0");
    rig.tick(30);
    assert_eq!(rig.board.outputs, [false; 4]);
    assert_eq!(rig.nvs.raw(SWITCH_NAMESPACE, SWITCH_KEY), Some(&[0u8; 4][..]));
    assert_eq!(
        rig.published_on(PUB_TOPIC).last().map(String::as_str),
        Some("1225102502120006,sw1234:0")
    );
}

#[test]
fn ping_reports_five_fields() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.send("ping");
    rig.tick(20);

    let replies = rig.published_on(PUB_TOPIC);
    assert_eq!(replies.len(), 1);
    let fields: Vec<&str> = replies[0].split(',').collect();
    assert_eq!(fields, [DEVICE_ID, "DMA-IR-Bluster", "192.168.4.2", "-60", "300000"]);
}

#[test]
fn unknown_payload_changes_nothing() {
    let mut rig = Rig::new();
    rig.bring_online();

    for junk in ["garbage", "sw5:1", "sw1:2", " ping", "SW1:1"] {
        rig.send(junk);
        rig.tick(20);
    }

    assert_eq!(rig.board.outputs, [false; 4]);
    assert!(rig.mqtt.sim_published().is_empty());
    assert!(rig.nvs.raw(SWITCH_NAMESPACE, SWITCH_KEY).is_none());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::CommandIgnored(_))), 5);
}

#[test]
fn longest_configured_topics_are_used_intact() {
    let mut config = SystemConfig::default();
    config.broker.publish_topic = "p".repeat(OUTBOUND_TOPIC_CAPACITY);
    config.broker.heartbeat_topic = "h".repeat(OUTBOUND_TOPIC_CAPACITY);
    let status = config.broker.publish_topic.clone();
    let heartbeat = config.broker.heartbeat_topic.clone();

    let mut rig = Rig::with_config(config);
    rig.bring_online();
    rig.send("sw3:1");
    rig.tick(20);
    rig.tick(300_010);

    assert_eq!(rig.published_on(&status), vec![format!("{DEVICE_ID},sw3:1")]);
    assert_eq!(rig.published_on(&heartbeat).len(), 1);
}

#[test]
fn one_inbound_message_per_tick() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.send("sw1:1");
    rig.send("sw3:1");
    rig.tick(20);
    assert_eq!(rig.board.outputs, [true, false, false, false]);
    rig.tick(30);
    assert_eq!(rig.board.outputs, [true, false, true, false]);
}

#[test]
fn storage_failure_still_switches_and_acks() {
    let mut rig = Rig::new();
    rig.bring_online();
    rig.nvs.fail_writes = true;

    rig.send("sw1:1");
    rig.tick(20);

    assert!(rig.board.outputs[0]);
    assert_eq!(rig.published_on(PUB_TOPIC), vec![format!("{DEVICE_ID},sw1:1")]);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::PersistFailed(_))), 1);
}

// ── RF ────────────────────────────────────────────────────────

#[test]
fn accepted_rf_code_is_reported_once() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.board.push_rf(12_345_678, 24, 20);
    rig.tick(20);
    assert_eq!(rig.published_on(PUB_TOPIC), vec![format!("{DEVICE_ID},12345678")]);
    assert_eq!(rig.board.flashes, vec![2]);

    // Same code again inside both windows.
    rig.board.push_rf(12_345_678, 24, 70);
    rig.tick(70);
    assert_eq!(rig.published_on(PUB_TOPIC).len(), 1);
    assert_eq!(rig.board.flashes, vec![2, 1]);
    assert!(rig.sink.events.contains(&AppEvent::RfSample {
        code: 12_345_678,
        bit_length: 24,
        outcome: IngestOutcome::RejectedGlobal,
    }));

    // RF never touches the relays.
    assert_eq!(rig.board.outputs, [false; 4]);
}

#[test]
fn short_rf_frames_are_noise() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.board.push_rf(0xABC, 12, 20);
    rig.tick(20);

    assert!(rig.mqtt.sim_published().is_empty());
    assert!(rig.sink.events.contains(&AppEvent::RfSample {
        code: 0xABC,
        bit_length: 12,
        outcome: IngestOutcome::RejectedShort,
    }));
}

#[test]
fn rf_while_offline_is_debounced_but_not_published() {
    let mut rig = Rig::new();
    rig.wifi.sim_set_reachable(false);

    rig.board.push_rf(42, 24, 0);
    rig.tick(0);

    assert!(rig.mqtt.sim_published().is_empty());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::PublishFailed(_))), 1);
}

// ── Heartbeat ─────────────────────────────────────────────────

#[test]
fn heartbeat_fires_one_interval_after_session_up() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.tick(300_009);
    assert!(rig.published_on(HB_TOPIC).is_empty());

    rig.tick(300_010);
    let beats = rig.published_on(HB_TOPIC);
    assert_eq!(beats, vec![format!("{DEVICE_ID},DMA-IR-Bluster,192.168.4.2,-60,300000")]);

    rig.tick(600_010);
    assert_eq!(rig.published_on(HB_TOPIC).len(), 2);
}

// ── Persistence across restart ────────────────────────────────

#[test]
fn switch_states_survive_a_restart() {
    let mut rig = Rig::new();
    rig.bring_online();
    rig.send("sw2:1");
    rig.tick(20);
    rig.send("sw4:1");
    rig.tick(30);

    let storage: MockNvs = rig.into_storage();
    let rebooted = Rig::with_storage(storage);

    assert_eq!(rebooted.board.outputs, [false, true, false, true]);
    assert_eq!(rebooted.app.switches().states(), [false, true, false, true]);
    assert!(rebooted
        .sink
        .events
        .contains(&AppEvent::Restored([false, true, false, true])));
}

#[test]
fn first_boot_restores_all_off() {
    let rig = Rig::new();
    assert_eq!(rig.board.outputs, [false; 4]);
    assert_eq!(rig.board.output_calls.len(), 4);
    assert!(!rig.board.link_up);
}
