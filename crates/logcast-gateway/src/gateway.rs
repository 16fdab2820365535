//! The gateway facade.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use logcast_protocols::{FilterStore, Hub, Record};

use crate::buffer::BroadcastBuffer;
use crate::config::GatewayConfig;
use crate::gate::ConnectionGate;
use crate::hub::RecordHub;
use crate::router::MessageRouter;
use crate::throttle::Throttle;
use crate::transport::TransportHost;
use crate::LOG_SRC;

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;

/// Relays records from the pipeline to every authenticated viewer.
pub struct LogGateway {
    config: GatewayConfig,
    transport: Arc<TransportHost>,
    buffer: Arc<BroadcastBuffer>,
    throttle: Throttle,
    initialized: AtomicBool,
}

impl LogGateway {
    pub fn new(config: GatewayConfig, hub: Arc<dyn Hub>, filters: Arc<dyn FilterStore>) -> Self {
        let gate = Arc::new(ConnectionGate::new(config.authenticate.clone(), hub.clone()));
        let router = Arc::new(MessageRouter::new(gate, hub, filters));
        let transport = Arc::new(TransportHost::new(router));
        let buffer = Arc::new(BroadcastBuffer::new());

        let weak_transport = Arc::downgrade(&transport);
        let flush_buffer = buffer.clone();
        let throttle = Throttle::new(config.throttle, move || match weak_transport.upgrade() {
            Some(transport) => {
                flush_buffer.flush(&transport);
            }
            None => trace!("Transport released, flush skipped"),
        });

        Self {
            config,
            transport,
            buffer,
            throttle,
            initialized: AtomicBool::new(false),
        }
    }

    /// Bring up the configured channels.
    ///
    /// Channel failures are logged and leave that channel unavailable.
    pub async fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!(src = LOG_SRC, "Log gateway already initialized");
            return;
        }

        self.transport
            .start_standalone(self.config.bind, self.config.port)
            .await;
        if let Some(host) = self.config.external_host() {
            self.transport.attach_to_external_host(host);
        }

        if !self.transport.is_active() {
            warn!(src = LOG_SRC, "Log gateway has no active channel");
        }
        debug!("Log gateway initialized: {:?}", self.transport.active_kinds());
    }

    /// Close every channel. A trailing flush still pending afterwards
    /// reaches nobody.
    pub fn tear_down(&self) {
        self.transport.stop();
        if self.initialized.swap(false, Ordering::SeqCst) {
            info!(src = LOG_SRC, "Log gateway stopped");
        }
    }

    /// Queue a record for broadcast.
    pub fn process(&self, record: Record) {
        self.buffer.add_record(record);
        self.throttle.call();
    }

    /// Broadcast pending records now, bypassing the throttle.
    pub fn flush(&self) -> usize {
        self.buffer.flush(&self.transport)
    }

    /// Forward every record the hub emits into [`process`](Self::process).
    ///
    /// The task ends when the hub is dropped or the gateway is released.
    pub fn attach_to_hub(self: &Arc<Self>, hub: &RecordHub) -> JoinHandle<()> {
        let mut rx = hub.subscribe();
        let gateway = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(record) => match gateway.upgrade() {
                        Some(gateway) => gateway.process(record),
                        None => break,
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(src = LOG_SRC, "Gateway lagged behind hub, {} records skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Hub forwarder stopped");
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<TransportHost> {
        &self.transport
    }

    pub fn pending_records(&self) -> usize {
        self.buffer.len()
    }

    pub fn flush_pending(&self) -> bool {
        self.throttle.pending()
    }

    pub fn standalone_addr(&self) -> Option<SocketAddr> {
        self.transport.standalone_addr()
    }

    pub fn connection_count(&self) -> usize {
        self.transport.connection_count()
    }
}
