use std::env;

use crate::SHELL_LOCALE_ENV;

#[derive(Debug, Clone, Copy)]
pub struct ShellTexts {
    pub settings_menu: &'static str,
    pub set_port: &'static str,
    pub use_global_binary: &'static str,
    pub open_in_browser: &'static str,
    pub edit_menu: &'static str,
    pub view_menu: &'static str,
    pub reload: &'static str,
    pub toggle_devtools: &'static str,
    pub actual_size: &'static str,
    pub zoom_in: &'static str,
    pub zoom_out: &'static str,
    pub start_failed_title: &'static str,
    pub start_failed_message: &'static str,
    pub retry: &'static str,
    pub quit: &'static str,
    pub mode_switch_title: &'static str,
    pub mode_switch_to_global: &'static str,
    pub mode_switch_to_local: &'static str,
}

pub fn shell_texts_for_locale(locale: &str) -> ShellTexts {
    if locale == "en-US" {
        return ShellTexts {
            settings_menu: "whistle Settings",
            set_port: "Set Port…",
            use_global_binary: "Use Global w2",
            open_in_browser: "Open in Browser",
            edit_menu: "Edit",
            view_menu: "View",
            reload: "Reload",
            toggle_devtools: "Toggle Developer Tools",
            actual_size: "Actual Size",
            zoom_in: "Zoom In",
            zoom_out: "Zoom Out",
            start_failed_title: "whistle failed to start",
            start_failed_message: "Could not start whistle:",
            retry: "Retry",
            quit: "Quit",
            mode_switch_title: "Switch w2",
            mode_switch_to_global: "Use the globally installed w2? The app will relaunch.",
            mode_switch_to_local: "Use the bundled w2? The app will relaunch.",
        };
    }

    ShellTexts {
        settings_menu: "whistle 设置",
        set_port: "设置端口号",
        use_global_binary: "使用全局 w2",
        open_in_browser: "在浏览器中打开",
        edit_menu: "编辑",
        view_menu: "视图",
        reload: "重新加载",
        toggle_devtools: "切换开发者工具",
        actual_size: "实际大小",
        zoom_in: "放大",
        zoom_out: "缩小",
        start_failed_title: "whistle 启动失败",
        start_failed_message: "无法启动 whistle：",
        retry: "重试",
        quit: "退出",
        mode_switch_title: "切换 w2",
        mode_switch_to_global: "切换为全局安装的 w2？应用将重新启动。",
        mode_switch_to_local: "切换为内置的 w2？应用将重新启动。",
    }
}

pub fn resolve_shell_locale(default_shell_locale: &'static str) -> &'static str {
    for env_key in [SHELL_LOCALE_ENV, "LC_ALL", "LANG"] {
        if let Ok(value) = env::var(env_key) {
            if let Some(locale) = normalize_shell_locale(&value) {
                return locale;
            }
        }
    }

    default_shell_locale
}

pub fn current_shell_texts() -> ShellTexts {
    shell_texts_for_locale(resolve_shell_locale(crate::DEFAULT_SHELL_LOCALE))
}

pub(crate) fn normalize_shell_locale(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "zh-CN" {
        return Some("zh-CN");
    }
    if raw == "en-US" {
        return Some("en-US");
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("zh") {
        return Some("zh-CN");
    }
    if lowered.starts_with("en") {
        return Some("en-US");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_texts_for_locale_returns_english_copy() {
        let texts = shell_texts_for_locale("en-US");
        assert_eq!(texts.set_port, "Set Port…");
        assert_eq!(texts.quit, "Quit");
        assert_eq!(texts.actual_size, "Actual Size");
    }

    #[test]
    fn shell_texts_for_locale_falls_back_to_zh_cn_copy() {
        let texts = shell_texts_for_locale("fr-FR");
        assert_eq!(texts.set_port, "设置端口号");
        assert_eq!(texts.open_in_browser, "在浏览器中打开");
    }

    #[test]
    fn normalize_shell_locale_accepts_language_prefixes() {
        assert_eq!(normalize_shell_locale("en_US.UTF-8"), Some("en-US"));
        assert_eq!(normalize_shell_locale("zh_TW"), Some("zh-CN"));
        assert_eq!(normalize_shell_locale("C"), None);
    }
}
