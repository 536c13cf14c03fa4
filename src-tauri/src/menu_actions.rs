pub const MENU_SET_PORT: &str = "menu_set_port";
pub const MENU_TOGGLE_GLOBAL_BINARY: &str = "menu_toggle_global_binary";
pub const MENU_OPEN_IN_BROWSER: &str = "menu_open_in_browser";
pub const MENU_RELOAD_WINDOW: &str = "menu_reload_window";
pub const MENU_TOGGLE_DEVTOOLS: &str = "menu_toggle_devtools";
pub const MENU_ZOOM_RESET: &str = "menu_zoom_reset";
pub const MENU_ZOOM_IN: &str = "menu_zoom_in";
pub const MENU_ZOOM_OUT: &str = "menu_zoom_out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SetPort,
    ToggleGlobalBinary,
    OpenInBrowser,
    ReloadWindow,
    ToggleDevtools,
    Zoom(ZoomStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomStep {
    Reset,
    In,
    Out,
}

pub fn action_from_menu_id(menu_id: &str) -> Option<MenuAction> {
    match menu_id {
        MENU_SET_PORT => Some(MenuAction::SetPort),
        MENU_TOGGLE_GLOBAL_BINARY => Some(MenuAction::ToggleGlobalBinary),
        MENU_OPEN_IN_BROWSER => Some(MenuAction::OpenInBrowser),
        MENU_RELOAD_WINDOW => Some(MenuAction::ReloadWindow),
        MENU_TOGGLE_DEVTOOLS => Some(MenuAction::ToggleDevtools),
        MENU_ZOOM_RESET => Some(MenuAction::Zoom(ZoomStep::Reset)),
        MENU_ZOOM_IN => Some(MenuAction::Zoom(ZoomStep::In)),
        MENU_ZOOM_OUT => Some(MenuAction::Zoom(ZoomStep::Out)),
        _ => None,
    }
}
