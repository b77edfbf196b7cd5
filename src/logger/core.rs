/// Core logging implementation with filtering
///
/// Filtering is delegated to whatever logger is installed: a message is only
/// built into a `log::Record` when the installed logger accepts its target and
/// level.
use super::levels::LogLevel;
use super::tags::LogTag;

pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let level: log::Level = level.into();
    log::log_enabled!(target: tag.target(), level)
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    let level: log::Level = level.into();
    log::log!(target: tag.target(), level, "[{}] {}", tag, message);
}
