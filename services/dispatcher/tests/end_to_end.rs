//! Drives the real dispatcher FSM and protocol client over an actual
//! `tokio::net::UdpSocket` pair against [`FakeSymnetDevice`], instead of
//! only in-process unit tests (spec.md §8 "SUPPLEMENT": an end-to-end
//! integration test using a real datagram socket).

use std::sync::Arc;
use std::time::Duration;

use dispatcher_core::{
    ButtonEvent, ButtonKind, Dispatcher, DispatcherConfig, PersistenceStore, RecordingLampSink, Selector, State,
    Studio, StudioDefinition, SymnetDevice,
};
use dispatcher_test_utils::FakeSymnetDevice;
use symnet_protocol::SymnetClient;
use tokio::sync::mpsc;

async fn connect_to_fake(device: &FakeSymnetDevice) -> (SymnetClient, mpsc::Receiver<symnet_protocol::ControllerState>) {
    let (push_tx, push_rx) = mpsc::channel(16);
    let local = "127.0.0.1:0".parse().unwrap();
    let (client, _recv_task) = SymnetClient::connect(local, device.local_addr, push_tx).await.unwrap();
    (client, push_rx)
}

#[tokio::test]
async fn takeover_and_next_hour_drive_a_real_selector_over_udp() {
    let fake = FakeSymnetDevice::spawn().await.unwrap();
    let (client, push_rx) = connect_to_fake(&fake).await;

    let device = SymnetDevice::new(client);
    let controller = device.define_controller(1).await;
    let selector = Arc::new(Selector::live(controller, 3));
    tokio::spawn(device.run_push_router(push_rx));

    let studio_a = Studio::new("studio-a", Arc::new(RecordingLampSink::new()));
    let dir = tempfile::tempdir().unwrap();
    let persistence = PersistenceStore::new(dir.path().join("state.json"));
    let config = DispatcherConfig {
        automat_selector_position: 1,
        studios: vec![StudioDefinition { studio: studio_a.clone(), selector_position: 2 }],
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(config, selector.clone(), persistence);
    dispatcher.start().await.unwrap();
    assert_eq!(selector.get_position().await.unwrap(), 1);

    dispatcher
        .handle_button_event(ButtonEvent { studio: studio_a.clone(), button: ButtonKind::Takeover })
        .await;
    assert_eq!(dispatcher.current_state().await, State::FromAutomatChangeToStudioXOnNextHour);

    // Simulate the hour boundary directly rather than waiting for it.
    dispatcher.force_next_hour().await;
    assert_eq!(dispatcher.current_state().await, State::StudioXOnAir);

    // The selector's raw value was actually round-tripped over the UDP
    // socket to the fake device and back.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(selector.get_position().await.unwrap(), 2);

    fake.shutdown();
}

#[tokio::test]
async fn pushed_state_updates_the_controller_cache() {
    let fake = FakeSymnetDevice::spawn().await.unwrap();
    let (client, push_rx) = connect_to_fake(&fake).await;

    let device = SymnetDevice::new(client.clone());
    let controller = device.define_controller(7).await;
    tokio::spawn(device.run_push_router(push_rx));

    // Issue one request first so the fake device learns our address.
    let _ = client.gs2(7).await;
    fake.push(7, 12345).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(controller.get_raw_value().await.unwrap(), 12345);
    fake.shutdown();
}
