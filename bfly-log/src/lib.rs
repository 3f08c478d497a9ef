use chrono::Utc;
use log::{Level, LevelFilter, Metadata, Record};

pub struct MonitorLogger;
pub static MONITOR_LOGGER: MonitorLogger = MonitorLogger;

impl log::Log for MonitorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{}] {} {} - {}",
                Utc::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Install the logger at the given level. Safe to call once per process.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&MONITOR_LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
