pub mod buttons;
pub mod config;
pub mod lamp;

use std::collections::HashMap;
use std::sync::Arc;

use config::DispatcherServiceConfig;
use dispatcher_core::{
    ButtonEvent, Dispatcher, DispatcherConfig, DispatcherError, PersistenceStore, Selector, Studio, StudioDefinition,
    SymnetDevice,
};
use lamp::LoggingLampSink;
use symnet_protocol::{ProtocolError, SymnetClient};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),
}

/// Everything `main` needs a handle to once the service is wired up.
pub struct Service {
    pub dispatcher: Arc<Dispatcher>,
    pub button_tx: mpsc::Sender<ButtonEvent>,
    pub studios_by_name: HashMap<String, Arc<Studio>>,
    /// The protocol client's receive loop (spec.md §5 cleanup step 4,
    /// "cancel the protocol-client push task"). Abort on shutdown.
    pub push_task: tokio::task::JoinHandle<()>,
    /// Our handle onto the transport (spec.md §5 cleanup step 4, "close
    /// the transport"). Drop on shutdown to release this reference to the
    /// underlying socket.
    pub client: SymnetClient,
}

/// Wires the protocol client, controller cache, studios and dispatcher
/// from config, following the dataflow in spec.md §2. Spawns the push
/// router and keepalive loop as background tasks; does not itself block.
pub async fn build(config: &DispatcherServiceConfig) -> Result<Service, ServiceError> {
    let (push_tx, push_rx) = mpsc::channel(64);
    let (client, push_task) = SymnetClient::connect(config.local_addr, config.remote_addr, push_tx).await?;

    let device = SymnetDevice::new(client.clone());
    let controller = device.define_controller(config.selector_controller_number).await;
    let selector = Arc::new(Selector::live(controller, config.selector_position_count));

    tokio::spawn(device.clone().run_push_router(push_rx));

    let mut studios_by_name = HashMap::new();
    let mut studio_defs = Vec::with_capacity(config.studios.len());
    for studio_config in &config.studios {
        let studio = Studio::new(studio_config.name.clone(), Arc::new(LoggingLampSink::new(studio_config.name.clone())));
        studios_by_name.insert(studio_config.name.clone(), studio.clone());
        studio_defs.push(StudioDefinition { studio, selector_position: studio_config.selector_position });
    }

    let dispatcher_config = DispatcherConfig {
        automat_selector_position: config.automat_selector_position,
        studios: studio_defs,
        immediate_state_duration: config.immediate_state_duration,
        immediate_release_duration: config.immediate_release_duration,
    };
    let persistence = PersistenceStore::new(config.persistence_path.clone());
    let dispatcher = Dispatcher::new(dispatcher_config, selector, persistence);
    dispatcher.start().await?;

    tokio::spawn(dispatcher.clone().run_keepalive_loop());

    let (button_tx, mut button_rx) = mpsc::channel(1);
    let dispatcher_for_events = dispatcher.clone();
    tokio::spawn(async move {
        while let Some(event) = button_rx.recv().await {
            dispatcher_for_events.handle_button_event(event).await;
        }
    });

    Ok(Service { dispatcher, button_tx, studios_by_name, push_task, client })
}
