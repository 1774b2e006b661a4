//! Integration tests for bounded recovery: link cycles, broker attempts,
//! the single restart, and the manual reset gesture.

use smartswitch::app::connectivity::{LinkStatus, TickOutcome};
use smartswitch::app::events::{AppEvent, RestartReason};
use smartswitch::app::ports::{NetworkPort, StoragePort};
use smartswitch::config::{CREDENTIAL_NAMESPACE, StoredCredentials, WIFI_CREDENTIAL_KEY};

use crate::rig::Rig;

fn restart_events(rig: &Rig) -> usize {
    rig.sink.count(|e| matches!(e, AppEvent::Restarting(_)))
}

// ── Exhaustion ────────────────────────────────────────────────

#[test]
fn unreachable_broker_restarts_exactly_once() {
    let mut rig = Rig::new();
    rig.mqtt.sim_set_accepting(false);

    let mut restart_at = None;
    for t in (0..=60_000).step_by(10) {
        if let TickOutcome::Restart(reason) = rig.tick(t) {
            assert_eq!(reason, RestartReason::BrokerExhausted);
            assert!(restart_at.is_none(), "second restart at {t}");
            restart_at = Some(t);
        }
    }

    // Attempts at 10, 5010, ... 45010.
    assert_eq!(restart_at, Some(45_010));
    assert_eq!(rig.mqtt.sim_client_ids().len(), 10);
    assert_eq!(rig.board.restarts, vec![RestartReason::BrokerExhausted]);
    assert_eq!(restart_events(&rig), 1);
    assert!(rig.app.is_halted());
    assert!(!rig.board.link_up);
}

#[test]
fn every_broker_attempt_uses_a_fresh_client_id() {
    let mut rig = Rig::new();
    rig.mqtt.sim_set_accepting(false);
    for t in (0..=50_000).step_by(10) {
        rig.tick(t);
    }

    let ids = rig.mqtt.sim_client_ids();
    for id in ids {
        assert!(id.starts_with("dma_ssw_"));
        assert_eq!(id.len(), "dma_ssw_".len() + 12);
        assert!(id["dma_ssw_".len()..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn unreachable_network_restarts_after_cycle_budget() {
    let mut rig = Rig::new();
    rig.wifi.sim_set_reachable(false);

    let mut restart_at = None;
    for t in (0..=400_000).step_by(1_000) {
        if let TickOutcome::Restart(reason) = rig.tick(t) {
            assert_eq!(reason, RestartReason::NetworkExhausted);
            assert!(restart_at.is_none());
            restart_at = Some(t);
        }
    }

    // Two cycles of 60 attempt polls + 60 wait polls, one second apart.
    assert_eq!(restart_at, Some(241_000));
    assert_eq!(rig.wifi.sim_begin_calls(), 2);
    assert_eq!(rig.board.restarts, vec![RestartReason::NetworkExhausted]);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::NetworkCycleFailed { .. })), 2);
    assert!(rig.mqtt.sim_client_ids().is_empty());
}

#[test]
fn halted_service_ignores_further_ticks() {
    let mut rig = Rig::new();
    rig.mqtt.sim_set_accepting(false);
    for t in (0..=45_010).step_by(10) {
        rig.tick(t);
    }
    assert!(rig.app.is_halted());

    rig.mqtt.sim_set_accepting(true);
    assert_eq!(rig.tick(50_000), TickOutcome::Halted);
    assert_eq!(rig.board.restarts.len(), 1);
}

// ── Recovery ──────────────────────────────────────────────────

#[test]
fn dropped_session_reconnects_with_new_identity() {
    let mut rig = Rig::new();
    rig.bring_online();
    assert!(rig.board.link_up);

    rig.mqtt.sim_drop_session();
    assert_eq!(rig.tick(20), TickOutcome::Recovering);
    assert!(!rig.board.link_up);
    assert_eq!(rig.app.connectivity().session, LinkStatus::Disconnected);

    assert_eq!(rig.tick(30), TickOutcome::SessionEstablished);
    assert!(rig.board.link_up);
    let ids = rig.mqtt.sim_client_ids();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(rig.mqtt.sim_subscriptions(), [rig.inbound_topic()]);
}

#[test]
fn lost_link_restarts_the_network_cycle() {
    let mut rig = Rig::new();
    rig.bring_online();

    rig.wifi.sim_drop_link();
    assert_eq!(rig.tick(20), TickOutcome::Recovering);
    assert!(rig.sink.events.contains(&AppEvent::NetworkLost));
    assert_eq!(rig.wifi.sim_begin_calls(), 2);
    assert!(!rig.board.link_up);

    // The fresh begin() reconnected; the session follows on the next tick.
    assert_eq!(rig.tick(30), TickOutcome::SessionEstablished);
    assert_eq!(rig.mqtt.sim_client_ids().len(), 2);
}

// ── Manual reset ──────────────────────────────────────────────

fn store_credentials(rig: &mut Rig) {
    let creds = StoredCredentials {
        ssid: "Office".try_into().unwrap(),
        password: "hunter2hunter2".try_into().unwrap(),
    };
    creds.save(&mut rig.nvs).unwrap();
}

#[test]
fn held_reset_wipes_credentials_and_restarts() {
    let mut rig = Rig::new();
    rig.bring_online();
    store_credentials(&mut rig);

    rig.board.button_pressed = true;
    rig.tick(1_000);
    assert!(rig.sink.events.contains(&AppEvent::ResetArmed));

    assert_ne!(rig.tick(5_999), TickOutcome::Restart(RestartReason::ManualReset));
    assert!(rig.board.restarts.is_empty());

    assert_eq!(rig.tick(6_000), TickOutcome::Restart(RestartReason::ManualReset));
    assert!(!rig.nvs.exists(CREDENTIAL_NAMESPACE, WIFI_CREDENTIAL_KEY));
    assert!(!rig.wifi.is_connected());
    assert_eq!(rig.board.restarts, vec![RestartReason::ManualReset]);
    assert!(rig.app.is_halted());
    assert_eq!(restart_events(&rig), 1);

    assert_eq!(rig.tick(7_000), TickOutcome::Halted);
}

#[test]
fn reset_is_honoured_while_the_network_is_down() {
    let mut rig = Rig::new();
    rig.wifi.sim_set_reachable(false);
    store_credentials(&mut rig);

    assert_eq!(rig.tick(0), TickOutcome::Recovering);
    rig.board.button_pressed = true;
    let mut outcome = TickOutcome::Recovering;
    for t in (1_000..=6_000).step_by(500) {
        outcome = rig.tick(t);
        if t < 6_000 {
            assert_eq!(outcome, TickOutcome::Recovering, "at {t}");
        }
    }

    assert_eq!(outcome, TickOutcome::Restart(RestartReason::ManualReset));
    assert!(!rig.app.is_online());
    assert!(!rig.nvs.exists(CREDENTIAL_NAMESPACE, WIFI_CREDENTIAL_KEY));
    assert_eq!(rig.board.restarts, vec![RestartReason::ManualReset]);
    assert!(rig.mqtt.sim_client_ids().is_empty());
}

#[test]
fn early_release_cancels_reset() {
    let mut rig = Rig::new();
    rig.bring_online();
    store_credentials(&mut rig);

    rig.board.button_pressed = true;
    rig.tick(1_000);
    rig.board.button_pressed = false;
    rig.tick(3_000);

    assert!(rig.sink.events.contains(&AppEvent::ResetCancelled));
    assert!(rig.board.restarts.is_empty());
    assert!(rig.nvs.exists(CREDENTIAL_NAMESPACE, WIFI_CREDENTIAL_KEY));
    assert!(rig.app.is_online());
}
