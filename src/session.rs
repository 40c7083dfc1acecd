//! Session - owns every piece of live state and drives the main loop
//!
//! One cooperative task on a current-thread runtime. Each frame runs an
//! input-poll pass first, so every control event that arrived before the
//! frame is routed before the scene is synchronized and rendered.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::console::ConsoleCommand;
use crate::midi::format_hex;
use crate::multiplexer::DeviceMultiplexer;
use crate::render_loop::RenderLoop;
use crate::router::{ControlInput, RouteOutcome, Router, Surfaces};
use crate::scene::{ModelMetadata, SceneContext, SceneSink};
use crate::state::{ParameterStore, SnapshotLog};
use crate::transport::MidiTransport;
use crate::widgets::WidgetPanel;

pub struct Session<T: MidiTransport, S: SceneSink> {
    multiplexer: DeviceMultiplexer<T>,
    router: Router,
    store: ParameterStore,
    widgets: WidgetPanel,
    ctx: SceneContext,
    render: RenderLoop,
    scene: S,
    snapshots: Option<SnapshotLog>,
    device_filter: Option<String>,
    frame_interval: Duration,
    poll_interval: Duration,
}

impl<T: MidiTransport, S: SceneSink> Session<T, S> {
    /// Build a session. No devices are opened and no model is loaded yet.
    pub fn new(config: &AppConfig, transport: T, scene: S) -> Result<Self> {
        let router = Router::from_config(&config.routing, config.render.spin_frames())?;
        let snapshots = config
            .snapshots
            .enabled
            .then(|| SnapshotLog::new(&config.snapshots.path));

        Ok(Self {
            multiplexer: DeviceMultiplexer::new(transport, config.midi.batch_size),
            router,
            store: ParameterStore::new(),
            widgets: WidgetPanel::new(),
            ctx: SceneContext::from_metadata(&ModelMetadata::default()),
            render: RenderLoop::new(&config.render),
            scene,
            snapshots,
            device_filter: config.midi.device_filter.clone(),
            frame_interval: config.render.frame_interval(),
            poll_interval: config.midi.poll_interval(),
        })
    }

    /// Open every matching input device
    pub fn open_devices(&mut self) -> usize {
        self.multiplexer.open_inputs(self.device_filter.as_deref())
    }

    /// Wire up a freshly loaded model. Returns the number of morph sliders.
    ///
    /// Only the first model is accepted; later calls are logged and ignored.
    pub fn load_model(&mut self, metadata: &ModelMetadata) -> usize {
        let names = &metadata.morph_target_names;
        if !self.store.resize_morph_targets(names.len()) {
            warn!("⚠️  Model {} ignored, a model is already loaded", metadata.name);
            return 0;
        }

        let sliders = self
            .widgets
            .morph_registry_mut()
            .register_labeled(names, &metadata.morph_labels);
        self.store.set_animation_available(metadata.has_animations);
        self.ctx = SceneContext::from_metadata(metadata);
        self.widgets.mirror_all(&self.store);
        self.store.mark_all_dirty();

        info!(
            "✅ Model {} loaded: {} morph targets, {} materials, animation: {}",
            metadata.name,
            sliders,
            self.ctx.materials.len(),
            self.ctx.active_clip.as_deref().unwrap_or("none")
        );
        sliders
    }

    /// Route one input, persisting approved snapshots
    pub fn handle(&mut self, input: impl Into<ControlInput>) -> RouteOutcome {
        let mut surfaces = Surfaces {
            store: &mut self.store,
            widgets: &mut self.widgets,
        };
        let outcome = self.router.route(input, &mut surfaces);

        if let RouteOutcome::Approved(snapshot) = &outcome {
            if let Some(log) = &self.snapshots {
                if let Err(e) = log.append(snapshot) {
                    warn!("⚠️  Failed to save snapshot: {:#}", e);
                }
            }
        }
        outcome
    }

    /// Drain and route pending device input. Returns the number of events.
    pub fn poll_input(&mut self) -> usize {
        let events = self.multiplexer.tick();
        let count = events.len();
        for event in events {
            let outcome = self.handle(event.message);
            debug!("{} [{}] → {:?}", event.device.tag(), format_hex(&event.raw.bytes), outcome);
        }
        count
    }

    /// Poll, then render one frame
    pub fn frame(&mut self) {
        self.poll_input();
        self.render.tick(&mut self.store, &self.ctx, &mut self.scene);
    }

    /// Close every device. Also done on drop.
    pub fn shutdown(&mut self) {
        self.multiplexer.shutdown();
    }

    /// Run until `shutdown` resolves or the console asks to quit. Devices are
    /// closed before returning.
    pub async fn run(
        &mut self,
        console: Option<mpsc::UnboundedReceiver<ConsoleCommand>>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let mut console = console;
        let mut frames = interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut polls = interval(self.poll_interval);
        polls.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Main loop started ({} devices, frame every {:?})",
            self.multiplexer.device_count(),
            self.frame_interval
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = frames.tick() => {
                    self.frame();
                }

                _ = polls.tick() => {
                    self.poll_input();
                }

                command = recv_console(&mut console) => {
                    match command {
                        Some(ConsoleCommand::Input(event)) => {
                            let outcome = self.handle(event);
                            debug!("console → {:?}", outcome);
                        }
                        Some(ConsoleCommand::Show) => self.log_state(),
                        Some(ConsoleCommand::Quit) => {
                            info!("Quit requested from console");
                            break;
                        }
                        None => {
                            debug!("Console closed");
                            console = None;
                        }
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping main loop");
                    break;
                }
            }
        }

        info!("Shutting down...");
        self.shutdown();
        info!("{} frames rendered", self.render.frames());
        Ok(())
    }

    fn log_state(&self) {
        let store = &self.store;
        info!(
            "hue={} scale={}% wireframe={} auto_rotate={} animation={:?} morph={:?}",
            store.hue(),
            store.scale_percent(),
            store.wireframe(),
            store.auto_rotate(),
            store.animation(),
            store.morph_weights()
        );
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn widgets(&self) -> &WidgetPanel {
        &self.widgets
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    pub fn device_count(&self) -> usize {
        self.multiplexer.device_count()
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        self.multiplexer.transport_mut()
    }
}

/// Next console command; never resolves once the console is gone
async fn recv_console(
    console: &mut Option<mpsc::UnboundedReceiver<ConsoleCommand>>,
) -> Option<ConsoleCommand> {
    match console {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::recording::RecordingScene;
    use crate::transport::fake::FakeTransport;
    use crate::widgets::{ButtonAction, SliderId, WidgetEvent};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.snapshots.path = dir.path().join("snapshots.jsonl").to_string_lossy().to_string();
        config
    }

    fn metadata(names: &[&str]) -> ModelMetadata {
        ModelMetadata {
            morph_target_names: names.iter().map(|s| s.to_string()).collect(),
            ..ModelMetadata::default()
        }
    }

    fn session(
        config: &AppConfig,
        transport: FakeTransport,
    ) -> Session<FakeTransport, RecordingScene> {
        Session::new(config, transport, RecordingScene::default()).unwrap()
    }

    #[test]
    fn test_idle_frame_renders_once_and_keeps_store() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&config_in(&dir), FakeTransport::new());
        session.load_model(&metadata(&["A"]));
        session.frame();

        let before = session.store().clone();
        session.frame();
        assert_eq!(session.store(), &before);
        assert_eq!(session.scene().frames(), 2);
        assert_eq!(session.device_count(), 0);
    }

    #[test]
    fn test_cc_from_device_moves_slider() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new().with_input("nanoKONTROL2");
        let mut session = session(&config_in(&dir), transport);
        assert_eq!(session.open_devices(), 1);
        assert_eq!(session.load_model(&metadata(&["Horns", "Tail", "Wings"])), 3);

        let refreshes_before = session
            .widgets()
            .slider(SliderId::Morph(2))
            .unwrap()
            .refreshes();
        session.transport_mut().push(0, &[0xB0, 112, 64]);
        session.frame();

        let slider = session.widgets().slider(SliderId::Morph(2)).unwrap();
        assert!((slider.value() - 0.504).abs() < 1e-3);
        assert_eq!(slider.refreshes(), refreshes_before + 1);
        assert_eq!(session.store().morph_weight(2), Some(64.0 / 127.0));
    }

    #[test]
    fn test_events_in_one_frame_apply_in_order() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            midi: crate::config::MidiConfig {
                batch_size: 8,
                ..Default::default()
            },
            ..config_in(&dir)
        };
        let mut session = session(&config, FakeTransport::new().with_input("pad"));
        session.open_devices();
        session.load_model(&metadata(&["A"]));

        session.transport_mut().push(0, &[0xB0, 116, 10]);
        session.transport_mut().push(0, &[0xB0, 116, 127]);
        session.frame();
        assert_eq!(session.store().hue(), 360.0);
    }

    #[test]
    fn test_second_model_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&config_in(&dir), FakeTransport::new());
        assert_eq!(session.load_model(&metadata(&["A", "B"])), 2);
        assert_eq!(session.load_model(&metadata(&["C"])), 0);
        assert_eq!(session.widgets().morph_registry().len(), 2);
        assert_eq!(session.store().morph_count(), 2);
    }

    #[test]
    fn test_note_26_toggles_wireframe() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&config_in(&dir), FakeTransport::new().with_input("keys"));
        session.open_devices();
        session.transport_mut().push(0, &[0x90, 26, 100]);
        session.frame();
        assert!(session.store().wireframe());
    }

    #[test]
    fn test_approve_appends_snapshot_and_resets() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut session = session(&config, FakeTransport::new());
        session.load_model(&metadata(&["Horns"]));

        session.handle(WidgetEvent::Slider {
            id: SliderId::Morph(0),
            value: 0.75,
        });
        let outcome = session.handle(WidgetEvent::Button(ButtonAction::Approve));
        assert!(matches!(outcome, RouteOutcome::Approved(_)));
        assert_eq!(session.store().morph_weight(0), Some(0.0));

        let saved = SnapshotLog::new(&config.snapshots.path).read_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].morph_targets.get("Horns"), Some(&0.75));
        assert_eq!(saved[0].scale, 1.0);
    }

    #[test]
    fn test_morph_labels_name_sliders_and_snapshots_keep_targets() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut session = session(&config, FakeTransport::new());
        let model = ModelMetadata {
            morph_labels: vec!["Cuernos".to_string()],
            ..metadata(&["Key 1", "Key 2"])
        };
        session.load_model(&model);

        let registry = session.widgets().morph_registry();
        assert_eq!(registry.get(0).unwrap().widget.label(), "Cuernos");
        assert_eq!(registry.get(1).unwrap().widget.label(), "Key 2");

        session.handle(WidgetEvent::Slider {
            id: SliderId::Morph(0),
            value: 0.5,
        });
        let RouteOutcome::Approved(snapshot) =
            session.handle(WidgetEvent::Button(ButtonAction::Approve))
        else {
            panic!("expected an approved snapshot");
        };
        assert_eq!(snapshot.morph_targets.get("Key 1"), Some(&0.5));
        assert!(!snapshot.morph_targets.contains_key("Cuernos"));
    }

    #[tokio::test]
    async fn test_interrupt_closes_every_device_once() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new().with_input("a").with_input("b");
        let log = transport.log.clone();

        let mut session = session(&config_in(&dir), transport);
        assert_eq!(session.open_devices(), 2);

        // An interrupt is a clean exit, not an error
        let interrupt = tokio::time::sleep(Duration::from_millis(50));
        assert!(session.run(None, interrupt).await.is_ok());
        assert_eq!(session.device_count(), 0);
        session.shutdown();

        let log = log.lock().unwrap();
        assert_eq!(log.opened, vec![0, 1]);
        assert_eq!(log.closed, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_console_commands_and_quit() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new().with_input("a");
        let log = transport.log.clone();

        let mut session = session(&config_in(&dir), transport);
        session.open_devices();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ConsoleCommand::Input(WidgetEvent::Button(ButtonAction::ToggleWireframe)))
            .unwrap();
        tx.send(ConsoleCommand::Input(WidgetEvent::Slider {
            id: SliderId::Color,
            value: 200.0,
        }))
        .unwrap();
        tx.send(ConsoleCommand::Show).unwrap();
        tx.send(ConsoleCommand::Quit).unwrap();
        // Never delivered: the loop stops at Quit
        tx.send(ConsoleCommand::Input(WidgetEvent::Button(ButtonAction::ToggleWireframe)))
            .unwrap();

        session
            .run(Some(rx), std::future::pending::<()>())
            .await
            .unwrap();
        assert!(session.store().wireframe());
        assert_eq!(session.store().hue(), 200.0);
        assert_eq!(session.widgets().slider(SliderId::Color).unwrap().value(), 200.0);
        assert_eq!(log.lock().unwrap().closed, vec![0]);
    }
}
