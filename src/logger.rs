use env_logger::{Builder, Env};
use log::info;
use std::io::Write;

/// Installs the global logger. `RUST_LOG` overrides `default_level`.
pub fn setup_logger(default_level: &str) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    builder
        .format(|buf, record| {
            let level_color = match record.level() {
                log::Level::Error => "\x1B[1;31m",
                log::Level::Warn => "\x1B[1;33m",
                log::Level::Info => "\x1B[1;32m",
                log::Level::Debug => "\x1B[1;36m",
                log::Level::Trace => "\x1B[1;35m",
            };

            writeln!(
                buf,
                "[{}] {}{:<5}\x1B[0m {} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                level_color,
                record.level(),
                record.target(),
                record.args()
            )
        })
        // diesel's r2d2 pool is chatty at debug
        .filter_module("r2d2", log::LevelFilter::Warn)
        .init();

    info!("Logger initialized (default level {})", default_level);
}
