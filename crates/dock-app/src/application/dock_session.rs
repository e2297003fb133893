//! DockSession: the owner-thread coordinator.
//!
//! One session owns everything mutable about a running dock: the live
//! [`DockConfiguration`], the [`EdgeReservation`] and the view that draws the
//! items.  Every entry point takes `&mut self`, so all mutation happens on
//! whichever thread drives the session (the window thread on Windows, the
//! event loop when headless).  Other threads never touch the session; they
//! send it a [`DockEvent`] instead.
//!
//! # Failure policy
//!
//! Nothing here is fatal.  Load and save failures are logged, shown to the
//! user once through [`DockView::show_notice`] and otherwise leave the last
//! good state in place.

use dock_core::{DockConfiguration, Edge, LayoutExtent, Rect, ShellMessage};
use tracing::{debug, error, info, warn};

use crate::application::persistence::{ConfigError, ConfigRepository, LoadOrigin};
use crate::application::reserve_edge::{EdgeReservation, ShellHost};

/// What the session needs from the UI.
#[cfg_attr(test, mockall::automock)]
pub trait DockView {
    /// Size of the strip needed to show the visible items on `edge`.
    fn visible_layout_extent(&self, config: &DockConfiguration, edge: Edge) -> LayoutExtent;

    /// A new configuration is in effect; redraw items and colors.
    fn on_configuration_reloaded(&mut self, config: &DockConfiguration);

    /// The dock moved to a different edge; re-lay the items out.
    fn on_edge_changed(&mut self, edge: Edge);

    /// Shows a one-off message to the user.
    fn show_notice(&mut self, message: &str);
}

/// Work delivered to the owner thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockEvent {
    /// A shell notification arrived at the dock window.
    Shell(ShellMessage),
    /// The configuration file changed and the debounce period has passed.
    ReloadRequested,
    /// The process is exiting.
    Shutdown,
}

/// The running dock.
pub struct DockSession<R, H, V>
where
    R: ConfigRepository,
    H: ShellHost,
    V: DockView,
{
    repository: R,
    reservation: EdgeReservation<H>,
    view: V,
    config: DockConfiguration,
}

impl<R, H, V> DockSession<R, H, V>
where
    R: ConfigRepository,
    H: ShellHost,
    V: DockView,
{
    /// Builds an idle session.  Nothing is loaded or registered until
    /// [`start`](Self::start).
    pub fn new(repository: R, reservation: EdgeReservation<H>, view: V) -> Self {
        let config = DockConfiguration::default();
        Self {
            repository,
            reservation,
            view,
            config,
        }
    }

    pub fn config(&self) -> &DockConfiguration {
        &self.config
    }

    pub fn reservation(&self) -> &EdgeReservation<H> {
        &self.reservation
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Loads the configuration and reserves the configured edge.
    ///
    /// A missing file is written out with the defaults.  An unreadable file
    /// leaves the defaults in effect and tells the user.
    pub fn start(&mut self) {
        match self.repository.load() {
            Ok(loaded) => {
                self.config = loaded.config;
                self.report_origin(&loaded.origin);
                if loaded.origin == LoadOrigin::Missing {
                    // Errors are already reported to the user.
                    let _ = self.persist_now();
                }
            }
            Err(e) => {
                error!("{e}; starting with defaults");
                self.view.show_notice(&format!("Could not read dock settings: {e}"));
            }
        }

        let edge = self.config.edge;
        let extent = self.extent(edge);
        let rect = self.reservation.register(edge, extent);
        info!("dock started on {edge} edge at {rect}");
        self.view.on_configuration_reloaded(&self.config);
    }

    /// Re-reads the configuration file and applies it.
    ///
    /// An edge change in the file moves the reservation but is not written
    /// back; the file already says it.
    ///
    /// # Errors
    ///
    /// Returns the load error after showing it to the user; the previous
    /// configuration stays in effect.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let loaded = match self.repository.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("reload failed: {e}; keeping current settings");
                self.view.show_notice(&format!("Could not reload dock settings: {e}"));
                return Err(e);
            }
        };
        self.report_origin(&loaded.origin);

        let previous_edge = self.reservation.current_edge();
        self.config = loaded.config;
        self.apply_layout(previous_edge);
        info!("configuration reloaded ({} item(s))", self.config.items.len());

        if loaded.origin == LoadOrigin::Missing {
            let _ = self.persist_now();
        }
        Ok(())
    }

    /// Moves the dock to `edge` and saves the choice.
    ///
    /// Always a full unregister / register cycle, even for the current edge.
    ///
    /// # Errors
    ///
    /// Returns the save error after showing it; the move itself still
    /// happened.
    pub fn set_edge(&mut self, edge: Edge) -> Result<(), ConfigError> {
        self.config.edge = edge;
        let extent = self.extent(edge);
        self.reservation.switch_edge(edge, extent);
        self.view.on_edge_changed(edge);
        self.persist_now()
    }

    /// Replaces the configuration with one edited in the settings UI,
    /// applies it and saves it.
    ///
    /// # Errors
    ///
    /// Returns the save error after showing it.
    pub fn apply_settings(&mut self, mut config: DockConfiguration) -> Result<(), ConfigError> {
        config.normalize_height();
        let previous_edge = self.reservation.current_edge();
        self.config = config;
        self.apply_layout(previous_edge);
        self.persist_now()
    }

    /// Writes the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WriteFailed`] after showing it to the user.
    pub fn persist_now(&mut self) -> Result<(), ConfigError> {
        self.repository.save(&self.config).map_err(|e| {
            error!("{e}");
            self.view.show_notice(&format!("Could not save dock settings: {e}"));
            e
        })
    }

    /// Reacts to a shell notification.  Returns the newly applied rectangle,
    /// if the message caused a reposition.
    pub fn handle_shell_message(&mut self, message: ShellMessage) -> Option<Rect> {
        let extent = self.extent(self.reservation.current_edge());
        self.reservation.handle_message(message, extent)
    }

    /// Handles one event.  Returns `false` once the session has shut down.
    pub fn dispatch(&mut self, event: DockEvent) -> bool {
        match event {
            DockEvent::Shell(message) => {
                self.handle_shell_message(message);
                true
            }
            DockEvent::ReloadRequested => {
                // Failures are reported by reload itself.
                let _ = self.reload();
                true
            }
            DockEvent::Shutdown => {
                self.shutdown();
                false
            }
        }
    }

    /// Saves the configuration and releases the reserved edge.
    pub fn shutdown(&mut self) {
        let _ = self.persist_now();
        self.reservation.unregister();
        info!("dock shut down");
    }

    /// Brings the reservation and view in line with `self.config`.
    fn apply_layout(&mut self, previous_edge: Edge) {
        let edge = self.config.edge;
        let extent = self.extent(edge);
        if edge != previous_edge {
            debug!("configured edge changed {previous_edge} -> {edge}");
            self.reservation.switch_edge(edge, extent);
            self.view.on_edge_changed(edge);
        } else {
            self.reservation.reposition(extent);
        }
        self.view.on_configuration_reloaded(&self.config);
    }

    fn extent(&self, edge: Edge) -> LayoutExtent {
        self.view.visible_layout_extent(&self.config, edge)
    }

    fn report_origin(&mut self, origin: &LoadOrigin) {
        match origin {
            LoadOrigin::File | LoadOrigin::Missing => {}
            LoadOrigin::MigratedLegacy { persisted } => {
                if !persisted {
                    warn!("legacy configuration upgraded in memory only");
                    self.view
                        .show_notice("Dock settings were upgraded but could not be saved.");
                }
            }
            LoadOrigin::Recovered { reason, persisted } => {
                let mut notice = format!("Dock settings were reset to defaults: {reason}");
                if !persisted {
                    notice.push_str(" (the defaults could not be saved)");
                }
                self.view.show_notice(&notice);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::persistence::LoadedConfig;
    use crate::infrastructure::shell::mock::MockShellHost;
    use dock_core::{AppBarOp, LaunchItem};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    /// In-memory repository with scripted load results.
    #[derive(Default)]
    struct FakeRepository {
        loads: RefCell<VecDeque<Result<LoadedConfig, ConfigError>>>,
        saved: Rc<RefCell<Vec<DockConfiguration>>>,
        fail_saves: bool,
    }

    impl FakeRepository {
        fn with_load(self, result: Result<LoadedConfig, ConfigError>) -> Self {
            self.loads.borrow_mut().push_back(result);
            self
        }
    }

    impl ConfigRepository for FakeRepository {
        fn load(&self) -> Result<LoadedConfig, ConfigError> {
            self.loads.borrow_mut().pop_front().unwrap_or_else(|| {
                Ok(LoadedConfig {
                    config: self.saved.borrow().last().cloned().unwrap_or_default(),
                    origin: LoadOrigin::File,
                })
            })
        }

        fn save(&self, config: &DockConfiguration) -> Result<(), ConfigError> {
            if self.fail_saves {
                return Err(ConfigError::WriteFailed {
                    path: PathBuf::from("dock_apps.json"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.saved.borrow_mut().push(config.clone());
            Ok(())
        }
    }

    fn loaded(config: DockConfiguration, origin: LoadOrigin) -> Result<LoadedConfig, ConfigError> {
        Ok(LoadedConfig { config, origin })
    }

    fn read_failed() -> Result<LoadedConfig, ConfigError> {
        Err(ConfigError::ReadFailed {
            path: PathBuf::from("dock_apps.json"),
            attempts: 5,
            source: io::Error::new(io::ErrorKind::WouldBlock, "locked"),
        })
    }

    fn on_edge(edge: Edge) -> DockConfiguration {
        DockConfiguration {
            edge,
            ..DockConfiguration::default()
        }
    }

    /// A view that reports the configured height as thickness and accepts
    /// every callback.
    fn permissive_view() -> MockDockView {
        let mut view = MockDockView::new();
        view.expect_visible_layout_extent()
            .returning(|cfg, _| LayoutExtent {
                thickness: cfg.effective_height(),
                length: 68,
            });
        view.expect_on_configuration_reloaded().return_const(());
        view.expect_on_edge_changed().return_const(());
        view
    }

    fn session(
        repo: FakeRepository,
        host: &MockShellHost,
        view: MockDockView,
    ) -> DockSession<FakeRepository, MockShellHost, MockDockView> {
        let reservation =
            EdgeReservation::new(host.clone(), Edge::default()).with_settle_delay(Duration::ZERO);
        DockSession::new(repo, reservation, view)
    }

    #[test]
    fn test_start_registers_on_configured_edge() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default().with_load(loaded(on_edge(Edge::Left), LoadOrigin::File));
        let saved = Rc::clone(&repo.saved);
        let mut view = permissive_view();
        view.expect_show_notice().never();
        let mut s = session(repo, &host, view);

        // Act
        s.start();

        // Assert
        assert!(s.reservation().is_registered());
        assert_eq!(s.reservation().current_edge(), Edge::Left);
        assert_eq!(
            s.reservation().state().last_applied_rect,
            Some(Rect::new(0, 0, 26, 1080))
        );
        assert!(saved.borrow().is_empty(), "an existing file is not rewritten");
    }

    #[test]
    fn test_start_without_file_persists_defaults() {
        let host = MockShellHost::single_1080p();
        let repo =
            FakeRepository::default().with_load(loaded(DockConfiguration::default(), LoadOrigin::Missing));
        let saved = Rc::clone(&repo.saved);
        let mut s = session(repo, &host, permissive_view());

        s.start();

        assert_eq!(*saved.borrow(), vec![DockConfiguration::default()]);
        assert_eq!(s.reservation().current_edge(), Edge::Top);
    }

    #[test]
    fn test_start_with_unreadable_file_uses_defaults_and_notifies() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default().with_load(read_failed());
        let mut view = permissive_view();
        view.expect_show_notice()
            .withf(|msg: &str| msg.contains("Could not read"))
            .times(1)
            .return_const(());
        let mut s = session(repo, &host, view);

        // Act
        s.start();

        // Assert
        assert_eq!(*s.config(), DockConfiguration::default());
        assert!(s.reservation().is_registered());
    }

    #[test]
    fn test_start_after_recovery_tells_the_user() {
        let host = MockShellHost::single_1080p();
        let origin = LoadOrigin::Recovered {
            reason: "bad json".into(),
            persisted: true,
        };
        let repo = FakeRepository::default().with_load(loaded(DockConfiguration::default(), origin));
        let mut view = permissive_view();
        view.expect_show_notice()
            .withf(|msg: &str| msg.contains("reset to defaults") && msg.contains("bad json"))
            .times(1)
            .return_const(());
        let mut s = session(repo, &host, view);

        s.start();
    }

    #[test]
    fn test_set_edge_from_left_to_top_removes_then_registers_and_saves() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default().with_load(loaded(on_edge(Edge::Left), LoadOrigin::File));
        let saved = Rc::clone(&repo.saved);
        let mut view = MockDockView::new();
        view.expect_visible_layout_extent().returning(|_, _| LayoutExtent {
            thickness: 26,
            length: 68,
        });
        view.expect_on_configuration_reloaded().return_const(());
        view.expect_on_edge_changed()
            .withf(|edge| *edge == Edge::Top)
            .times(1)
            .return_const(());
        let mut s = session(repo, &host, view);
        s.start();
        host.clear();

        // Act
        s.set_edge(Edge::Top).expect("save");

        // Assert
        let ops = host.ops();
        let new = ops.iter().position(|op| *op == AppBarOp::New).expect("new");
        assert!(
            new > 0 && ops[..new].iter().all(|op| *op == AppBarOp::Remove),
            "removal must come first: {ops:?}"
        );
        let new_record = host.calls()[new].data;
        assert_eq!(new_record.callback_message, host.callback_message());
        assert_eq!(s.reservation().current_edge(), Edge::Top);
        assert_eq!(saved.borrow().last().map(|c| c.edge), Some(Edge::Top));
    }

    #[test]
    fn test_reload_failure_keeps_previous_configuration() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let original = DockConfiguration {
            items: vec![LaunchItem::new("Keep", "keep.exe")],
            ..on_edge(Edge::Right)
        };
        let repo = FakeRepository::default()
            .with_load(loaded(original.clone(), LoadOrigin::File))
            .with_load(read_failed());
        let mut view = permissive_view();
        view.expect_show_notice().times(1).return_const(());
        let mut s = session(repo, &host, view);
        s.start();
        host.clear();

        // Act
        let result = s.reload();

        // Assert
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
        assert_eq!(*s.config(), original);
        assert!(host.ops().is_empty(), "a failed reload must not touch the shell");
    }

    #[test]
    fn test_reload_with_new_edge_moves_without_saving() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default()
            .with_load(loaded(on_edge(Edge::Top), LoadOrigin::File))
            .with_load(loaded(on_edge(Edge::Bottom), LoadOrigin::File));
        let saved = Rc::clone(&repo.saved);
        let mut s = session(repo, &host, permissive_view());
        s.start();

        // Act
        s.reload().expect("reload");

        // Assert
        assert_eq!(s.reservation().current_edge(), Edge::Bottom);
        assert!(saved.borrow().is_empty());
    }

    #[test]
    fn test_reload_with_same_edge_only_repositions() {
        let host = MockShellHost::single_1080p();
        let taller = DockConfiguration {
            height: 40,
            ..on_edge(Edge::Top)
        };
        let repo = FakeRepository::default()
            .with_load(loaded(on_edge(Edge::Top), LoadOrigin::File))
            .with_load(loaded(taller, LoadOrigin::File));
        let mut s = session(repo, &host, permissive_view());
        s.start();
        host.clear();

        s.reload().expect("reload");

        assert!(!host.ops().contains(&AppBarOp::New));
        assert_eq!(host.placements(), vec![Rect::new(0, 0, 1920, 40)]);
    }

    #[test]
    fn test_persist_failure_is_reported_not_fatal() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository {
            fail_saves: true,
            ..FakeRepository::default()
        };
        let mut view = permissive_view();
        view.expect_show_notice()
            .withf(|msg: &str| msg.contains("Could not save"))
            .times(1)
            .return_const(());
        let mut s = session(repo, &host, view);

        // Act
        let result = s.persist_now();

        // Assert
        assert!(matches!(result, Err(ConfigError::WriteFailed { .. })));
    }

    #[test]
    fn test_position_changed_uses_current_extent() {
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default().with_load(loaded(on_edge(Edge::Top), LoadOrigin::File));
        let mut s = session(repo, &host, permissive_view());
        s.start();
        host.set_screen(Rect::from_size(1280, 720));

        let rect = s.handle_shell_message(ShellMessage::PositionChanged);

        assert_eq!(rect, Some(Rect::new(0, 0, 1280, 26)));
    }

    #[test]
    fn test_shutdown_event_saves_and_unregisters() {
        // Arrange
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default().with_load(loaded(on_edge(Edge::Right), LoadOrigin::File));
        let saved = Rc::clone(&repo.saved);
        let mut s = session(repo, &host, permissive_view());
        s.start();

        // Act
        let keep_running = s.dispatch(DockEvent::Shutdown);

        // Assert
        assert!(!keep_running);
        assert!(!s.reservation().is_registered());
        assert!(!host.is_registered());
        assert_eq!(saved.borrow().len(), 1);
    }

    #[test]
    fn test_apply_settings_raises_height_to_floor_and_saves() {
        let host = MockShellHost::single_1080p();
        let repo = FakeRepository::default().with_load(loaded(on_edge(Edge::Top), LoadOrigin::File));
        let saved = Rc::clone(&repo.saved);
        let mut s = session(repo, &host, permissive_view());
        s.start();

        s.apply_settings(DockConfiguration {
            height: 3,
            ..on_edge(Edge::Top)
        })
        .expect("save");

        assert_eq!(s.config().height, dock_core::DOCK_HEIGHT_FLOOR);
        assert_eq!(saved.borrow().len(), 1);
    }
}
