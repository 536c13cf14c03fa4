pub(crate) const MAIN_WINDOW_LABEL_PREFIX: &str = "main-";
pub(crate) const PORT_PROMPT_WINDOW_LABEL: &str = "port-prompt";
pub(crate) const PORT_PROMPT_PAGE: &str = "prompt.html";
pub(crate) const PORT_PROMPT_WIDTH: f64 = 360.0;
pub(crate) const PORT_PROMPT_HEIGHT: f64 = 170.0;
pub(crate) const DEFAULT_SHELL_LOCALE: &str = "zh-CN";
pub(crate) const SHELL_LOCALE_ENV: &str = "WHISTLE_DESKTOP_LOCALE";
pub(crate) const DEFAULT_ZOOM: f64 = 1.0;
pub(crate) const MIN_ZOOM: f64 = 0.5;
pub(crate) const MAX_ZOOM: f64 = 3.0;
pub(crate) const ZOOM_STEP: f64 = 0.1;
