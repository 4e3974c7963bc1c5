//! Well-known configuration keys.

/// Module path that bounds which declarations are registered. Empty or unset
/// registers everything.
pub const SCAN_ROOT: &str = "scan.root";
/// Platform token, usually `${TORTUGA_TOKEN}`.
pub const TOKEN: &str = "token";
/// Publish slash commands to the platform on startup.
pub const COMMAND_UPDATE: &str = "command.update";
pub const COMMAND_TEXT_PREFIX: &str = "command.text.prefix";
pub const MESSAGE_CHARACTER_LIMIT: &str = "message.character.limit";
pub const COLOR_SUCCESS: &str = "color.success";
pub const COLOR_WARNING: &str = "color.warning";
pub const COLOR_ERROR: &str = "color.error";
/// Maximum number of handlers running at once.
pub const DISPATCH_WORKERS: &str = "dispatch.workers";

pub const DEFAULT_MESSAGE_CHARACTER_LIMIT: i64 = 4_000;
pub const DEFAULT_DISPATCH_WORKERS: i64 = 16;
pub const DEFAULT_COLOR_SUCCESS: &str = "#00ff00";
pub const DEFAULT_COLOR_WARNING: &str = "#ffff00";
pub const DEFAULT_COLOR_ERROR: &str = "#ff0000";

/// `<task>.enabled`
pub fn task_enabled(task: &str) -> String {
    format!("{task}.enabled")
}

/// Per-task schedule override, `<task>.delay`, `<task>.period` or `<task>.unit`.
pub fn task_field(task: &str, field: &str) -> String {
    format!("{task}.{field}")
}
