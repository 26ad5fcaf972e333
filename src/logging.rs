use std::io::Write;

/// Environment variable holding the log filter (`env_logger` syntax).
pub const LOG_ENV: &str = "INKORG_LOG";

/// Initialise logging to stderr. Stdout is reserved for the CLI protocol.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "info"))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .init();
}
