use log::LevelFilter;
use env_logger::Builder;
use std::io::Write;
use chrono::Local;

/// Installs the timestamped logger. `RUST_LOG` overrides the default `info` level.
/// Calling it twice is harmless.
pub fn init() {
    let installed = Builder::new()
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .try_init();

    if installed.is_ok() {
        log::info!("Logger initialized.");
    }
}
