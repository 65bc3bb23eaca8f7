//! Core daemon orchestration.

use std::sync::Arc;

use multihead_input::{
    Block, ControlSignals, DeviceBackend, Dispatch, EventTranslator, HostQueue, InputError,
    InputLock, RawEventSource, StaticKeymaps,
};
use multihead_types::{DeviceId, GroupId, SourceEvent};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::DaemonError;
use crate::setup;

/// Events processed by the daemon's main loop.
#[derive(Debug)]
pub enum DaemonEvent {
    /// A raw event or motion sample from a transport.
    Source(SourceEvent),
    /// Force the next core motion through, e.g. after the host moved the
    /// pointer behind our back.
    InvalidatePosition,
    /// Stop delivering position updates to a group's backends.
    Detach(GroupId),
    /// Resume position updates to a group's backends.
    Attach(GroupId),
    /// Shutdown signal.
    Shutdown,
}

/// Snapshot of daemon state, published after every event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaemonStatus {
    pub running: bool,
    pub cursor: (i32, i32),
    pub cursor_valid: bool,
    /// Screen the host pointer is on.
    pub pointer_screen: Option<usize>,
    pub events_processed: u64,
    pub last_dispatch: Option<Dispatch>,
    pub detached_groups: Vec<GroupId>,
    pub terminate_requested: bool,
    /// VT switch waiting for the console handler.
    pub vt_switch: Option<u8>,
}

/// The multihead daemon: owns the translator and funnels every source
/// into it on one task.
pub struct Daemon<H: HostQueue> {
    translator: EventTranslator<H, StaticKeymaps>,
    sources: Vec<Box<dyn RawEventSource>>,
    block: Block,
    channel_capacity: usize,
    event_tx: mpsc::Sender<DaemonEvent>,
    event_rx: mpsc::Receiver<DaemonEvent>,
    status_tx: watch::Sender<DaemonStatus>,
    events_processed: u64,
    last_dispatch: Option<Dispatch>,
}

impl<H: HostQueue> Daemon<H> {
    /// Create a new daemon instance from config and the host's queue.
    pub fn new(config: &Config, host: H) -> Result<Self, DaemonError> {
        let ctx = setup::build_context(config)?;
        let keymaps = setup::build_keymaps(config);
        let capacity = config.daemon.channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (status_tx, _) = watch::channel(DaemonStatus::default());

        Ok(Self {
            translator: EventTranslator::new(ctx, host, keymaps),
            sources: Vec::new(),
            block: Block::from(config.daemon.blocking),
            channel_capacity: capacity,
            event_tx,
            event_rx,
            status_tx,
            events_processed: 0,
            last_dispatch: None,
        })
    }

    /// Share the queue lock with the host's own event thread.
    #[must_use]
    pub fn with_lock(mut self, lock: InputLock) -> Self {
        self.translator = self.translator.with_lock(lock);
        self
    }

    /// Register a per-transport event source, started by [`Daemon::run`].
    pub fn add_source(&mut self, source: Box<dyn RawEventSource>) {
        self.sources.push(source);
    }

    /// Bind a driver backend to a logical device.
    pub fn attach_backend(
        &mut self,
        device: DeviceId,
        backend: Arc<dyn DeviceBackend>,
    ) -> Result<(), DaemonError> {
        self.translator
            .context_mut()
            .registry
            .device_mut(device)
            .ok_or(InputError::UnknownDevice(device))?
            .set_backend(backend);
        Ok(())
    }

    /// Get a clone of the event sender for feeding events into the daemon.
    pub fn event_sender(&self) -> mpsc::Sender<DaemonEvent> {
        self.event_tx.clone()
    }

    /// Subscribe to status snapshots.
    pub fn status_receiver(&self) -> watch::Receiver<DaemonStatus> {
        self.status_tx.subscribe()
    }

    /// Process-wide terminate and VT-switch flags.
    pub fn signals(&self) -> Arc<ControlSignals> {
        Arc::clone(&self.translator.context().signals)
    }

    pub fn translator(&self) -> &EventTranslator<H, StaticKeymaps> {
        &self.translator
    }

    /// Run the daemon event loop until shutdown or a user termination
    /// request.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        let (source_tx, mut source_rx) = mpsc::channel::<SourceEvent>(self.channel_capacity);
        for source in &mut self.sources {
            source.start(source_tx.clone()).await?;
        }
        drop(source_tx);

        // Forward source events to daemon events
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = source_rx.recv().await {
                if event_tx.send(DaemonEvent::Source(event)).await.is_err() {
                    break;
                }
            }
        });

        info!(sources = self.sources.len(), "daemon running");
        self.publish_status(true);

        while let Some(event) = self.event_rx.recv().await {
            if matches!(event, DaemonEvent::Shutdown) {
                info!("shutting down");
                break;
            }
            self.handle_event(event);
            self.publish_status(true);

            if self.translator.context().signals.terminate_requested() {
                info!("termination requested, stopping");
                break;
            }
        }

        self.shutdown().await
    }

    /// Handle one event synchronously.
    pub fn handle_event(&mut self, event: DaemonEvent) {
        match event {
            DaemonEvent::Source(source) => {
                let dispatch = self.translator.handle(&source, self.block);
                debug!(?dispatch, "source event handled");
                self.events_processed += 1;
                self.last_dispatch = Some(dispatch);
            }
            DaemonEvent::InvalidatePosition => self.translator.invalidate_position(),
            DaemonEvent::Detach(group) => self.set_detached(group, true),
            DaemonEvent::Attach(group) => {
                self.set_detached(group, false);
                // The group missed updates while detached.
                self.translator.invalidate_position();
            }
            DaemonEvent::Shutdown => {}
        }
    }

    fn set_detached(&mut self, group: GroupId, detached: bool) {
        match self.translator.context_mut().registry.group_mut(group) {
            Some(g) => {
                info!(group = %g.name, detached, "group attachment changed");
                g.detached = detached;
            }
            None => warn!(group = group.0, "attachment change for unknown group"),
        }
    }

    /// Current status snapshot.
    pub fn status(&self, running: bool) -> DaemonStatus {
        let ctx = self.translator.context();
        DaemonStatus {
            running,
            cursor: ctx.cursor.read(),
            cursor_valid: ctx.cursor.is_valid(),
            pointer_screen: self.translator.host().pointer_screen(),
            events_processed: self.events_processed,
            last_dispatch: self.last_dispatch,
            detached_groups: ctx
                .registry
                .groups()
                .iter()
                .enumerate()
                .filter(|(_, g)| g.detached)
                .map(|(i, _)| GroupId(i))
                .collect(),
            terminate_requested: ctx.signals.terminate_requested(),
            vt_switch: ctx.signals.pending_vt_switch(),
        }
    }

    fn publish_status(&self, running: bool) {
        self.status_tx.send_replace(self.status(running));
    }

    async fn shutdown(&mut self) -> Result<(), DaemonError> {
        info!("daemon shutting down");
        for source in &mut self.sources {
            source.shutdown().await?;
        }
        self.publish_status(false);
        info!("daemon shut down complete");
        Ok(())
    }
}
