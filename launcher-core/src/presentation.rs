use url::Url;

use crate::{command::Port, logging::DesktopLog, LauncherError, Result};

pub const LOCAL_HOST: &str = "127.0.0.1";
pub const DEFAULT_WINDOW_WIDTH: f64 = 1280.0;
pub const DEFAULT_WINDOW_HEIGHT: f64 = 960.0;
pub const WINDOW_TITLE_PREFIX: &str = "whistle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub url: Url,
    pub title: String,
    pub width: f64,
    pub height: f64,
}

impl WindowSpec {
    pub fn for_port(port: Port) -> Result<Self> {
        Ok(Self {
            url: local_url(port)?,
            title: window_title(LOCAL_HOST, port.get()),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        })
    }
}

pub fn window_title(host: &str, port: u16) -> String {
    format!("{WINDOW_TITLE_PREFIX} - {host}:{port}")
}

pub fn local_url(port: Port) -> Result<Url> {
    Url::parse(&format!("http://{LOCAL_HOST}:{port}/"))
        .map_err(|error| LauncherError::Presentation(format!("invalid local url: {error}")))
}

/// Native window operations. The Tauri shell implements this with webview
/// windows; the page it loads must not be able to change the title.
pub trait Presenter {
    fn open_window(&mut self, spec: &WindowSpec) -> Result<WindowId>;
    fn close_window(&mut self, id: WindowId);
    fn is_window_open(&self, id: WindowId) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
struct OpenWindow {
    id: WindowId,
    spec: WindowSpec,
}

/// Keeps at most one launcher window alive.
#[derive(Debug)]
pub struct PresentationController<P> {
    presenter: P,
    current: Option<OpenWindow>,
}

impl<P: Presenter> PresentationController<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            current: None,
        }
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Replaces any open window with a fresh one pointed at `port`.
    pub fn show(&mut self, port: Port, log: &DesktopLog) -> Result<WindowId> {
        let spec = WindowSpec::for_port(port)?;
        if let Some(previous) = self.current.take() {
            log.runtime(&format!("closing window {} before reopening", previous.id.0));
            self.presenter.close_window(previous.id);
        }

        log.runtime(&format!("opening window at {}", spec.url));
        let id = self.presenter.open_window(&spec)?;
        self.current = Some(OpenWindow { id, spec });
        Ok(id)
    }

    /// Recreates the window if the platform closed it. Returns the new id, or
    /// `None` if a window was still open.
    pub fn ensure_visible(&mut self, port: Port, log: &DesktopLog) -> Result<Option<WindowId>> {
        if self.live_window().is_some() {
            return Ok(None);
        }
        self.show(port, log).map(Some)
    }

    /// Forgets `id` after the platform destroyed it.
    pub fn window_closed(&mut self, id: WindowId) {
        if self.current.as_ref().is_some_and(|window| window.id == id) {
            self.current = None;
        }
    }

    pub fn live_window(&self) -> Option<WindowId> {
        self.current
            .as_ref()
            .map(|window| window.id)
            .filter(|id| self.presenter.is_window_open(*id))
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|window| &window.spec.url)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Default)]
    struct FakePresenter {
        next_id: u64,
        open: BTreeMap<u64, WindowSpec>,
        fail_next_open: bool,
    }

    impl Presenter for FakePresenter {
        fn open_window(&mut self, spec: &WindowSpec) -> Result<WindowId> {
            if std::mem::take(&mut self.fail_next_open) {
                return Err(LauncherError::Presentation("no display".to_string()));
            }
            self.next_id += 1;
            self.open.insert(self.next_id, spec.clone());
            Ok(WindowId(self.next_id))
        }

        fn close_window(&mut self, id: WindowId) {
            self.open.remove(&id.0);
        }

        fn is_window_open(&self, id: WindowId) -> bool {
            self.open.contains_key(&id.0)
        }
    }

    fn port(raw: &str) -> Port {
        raw.parse().expect("port")
    }

    #[test]
    fn window_spec_points_at_loopback_port() {
        let spec = WindowSpec::for_port(port("9001")).expect("spec");
        assert_eq!(spec.url.as_str(), "http://127.0.0.1:9001/");
        assert_eq!(spec.url.port(), Some(9001));
        assert_eq!(spec.title, "whistle - 127.0.0.1:9001");
        assert_eq!((spec.width, spec.height), (1280.0, 960.0));
    }

    #[test]
    fn show_replaces_existing_window() {
        let log = DesktopLog::disabled();
        let mut controller = PresentationController::new(FakePresenter::default());

        let first = controller.show(port("8899"), &log).expect("first");
        let second = controller.show(port("9001"), &log).expect("second");

        assert_ne!(first, second);
        assert_eq!(controller.presenter().open.len(), 1);
        assert_eq!(controller.live_window(), Some(second));
        assert_eq!(
            controller.current_url().map(Url::as_str),
            Some("http://127.0.0.1:9001/")
        );
    }

    #[test]
    fn ensure_visible_only_recreates_missing_window() {
        let log = DesktopLog::disabled();
        let mut controller = PresentationController::new(FakePresenter::default());
        let id = controller.show(port("8899"), &log).expect("show");

        assert_eq!(controller.ensure_visible(port("8899"), &log).expect("noop"), None);

        controller.presenter_mut().close_window(id);
        controller.window_closed(id);
        let reopened = controller
            .ensure_visible(port("8899"), &log)
            .expect("reopen");
        assert!(reopened.is_some());
        assert_eq!(controller.presenter().open.len(), 1);
    }

    #[test]
    fn failed_open_leaves_no_window_tracked() {
        let log = DesktopLog::disabled();
        let mut controller = PresentationController::new(FakePresenter::default());
        controller.show(port("8899"), &log).expect("show");
        controller.presenter_mut().fail_next_open = true;

        assert!(controller.show(port("9001"), &log).is_err());
        assert_eq!(controller.live_window(), None);
        assert!(controller.presenter().open.is_empty());
    }
}
