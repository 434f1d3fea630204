use mapr_logger::{LevelFilter, Logger, level_for_verbosity};

#[test]
fn init_console_only_has_no_guard() {
    let logger = Logger::builder()
        .name("mapr-console-only")
        .console(true)
        .ansi(false)
        .level(level_for_verbosity(1))
        .init()
        .expect("logger should initialize");

    assert!(logger.guard().is_none(), "console-only logger should not create a file guard");
    tracing::info!(level = %LevelFilter::INFO, "console logger ready");
}
