//! # Region Host Container
//!
//! Owns every interregion subsystem instance for one host process and wires
//! them in dependency order:
//!
//! 1. Local dispatch registry (hosted regions register here)
//! 2. Nonce ledger (inbound crossing suppression)
//! 3. Region directory + transport client (REST mode only)
//! 4. Dispatcher (simulator-facing) and peer router (inbound)

use super::config::{ConfigError, HostConfig};
use crate::adapters::StandaloneScene;
use ir_01_peer_auth::{GridSendKey, PeerAuthConfig};
use ir_02_nonce_ledger::{NonceLedger, SystemTimeSource};
use ir_03_local_dispatch::{LocalDispatch, RegionScene, RegistryError};
use ir_04_transport::{RegionClient, TransportError};
use ir_05_region_directory::{InMemoryRegionDirectory, TimeoutDirectory, DEFAULT_LOOKUP_TIMEOUT};
use ir_06_dispatch::{router, InboundState, InterregionMode, RegionDispatcher};
use shared_types::{BincodeObjectCodec, ObjectCodec};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Interval of the background ledger sweep. Accesses also sweep.
pub const LEDGER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("peer surface: {0}")]
    Io(#[from] std::io::Error),
}

/// Every subsystem instance of one region host.
pub struct RegionHost {
    config: HostConfig,
    local: Arc<LocalDispatch>,
    ledger: Arc<NonceLedger>,
    codec: Arc<dyn ObjectCodec>,
    dispatcher: RegionDispatcher,
    auth: PeerAuthConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RegionHost {
    /// Validate `config` and build the subsystems. No region is registered yet.
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        config.validate()?;

        let local = Arc::new(LocalDispatch::new());
        let ledger = Arc::new(NonceLedger::with_config(config.nonce_retention(), Arc::new(SystemTimeSource)));
        let codec: Arc<dyn ObjectCodec> = Arc::new(BincodeObjectCodec);
        let key = GridSendKey::new(config.communications.grid_send_key.clone());

        let dispatcher = match config.communications.interregion {
            InterregionMode::Rest => {
                let directory = TimeoutDirectory::new(
                    InMemoryRegionDirectory::with_endpoints(config.neighbour_endpoints()),
                    DEFAULT_LOOKUP_TIMEOUT,
                );
                let client = RegionClient::new(&key)?;
                RegionDispatcher::rest(local.clone(), Arc::new(directory), client, codec.clone())
            }
            InterregionMode::Local => RegionDispatcher::local_only(local.clone(), codec.clone()),
        };
        info!(mode = %dispatcher.mode(), neighbours = config.neighbours.len(), "Interregion subsystems ready");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            local,
            ledger,
            codec,
            dispatcher,
            auth: PeerAuthConfig::new(key),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Simulator-facing API.
    pub fn dispatcher(&self) -> &RegionDispatcher {
        &self.dispatcher
    }

    pub fn ledger(&self) -> &Arc<NonceLedger> {
        &self.ledger
    }

    /// Host a region. Its handle becomes locally dispatched.
    pub fn register(&self, scene: Arc<dyn RegionScene>) -> Result<(), HostError> {
        let handle = scene.region_handle();
        self.local.register(scene)?;
        info!(region_handle = %handle, "Region hosted");
        Ok(())
    }

    /// Host every configured region on a [`StandaloneScene`].
    pub fn register_standalone_regions(&self) -> Result<Vec<Arc<StandaloneScene>>, HostError> {
        let mut scenes = Vec::with_capacity(self.config.regions.len());
        for region in &self.config.regions {
            let scene = Arc::new(StandaloneScene::new(region.name.clone(), region.region_id, region.handle()));
            self.register(scene.clone())?;
            scenes.push(scene);
        }
        Ok(scenes)
    }

    /// Peer-facing router over the hosted regions.
    pub fn router(&self) -> axum::Router {
        let state = InboundState::new(self.local.clone(), self.ledger.clone(), self.codec.clone());
        router(state, self.auth.clone())
    }

    /// Serve the peer surface on `listener` until [`shutdown`](Self::shutdown).
    pub async fn serve(&self, listener: TcpListener) -> Result<(), HostError> {
        let addr = listener.local_addr()?;
        info!(%addr, regions = self.local.len(), "Peer surface listening");

        let mut shutdown = self.shutdown_rx.clone();
        axum::serve(listener, self.router().into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await?;
        info!("Peer surface stopped");
        Ok(())
    }

    /// Periodically purge expired ledger entries until shutdown.
    pub fn spawn_ledger_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let ledger = self.ledger.clone();
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = ledger.sweep_expired();
                        if purged > 0 {
                            debug!(purged, remaining = ledger.len(), "Swept nonce ledger");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    /// Signal every task started by this host to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
