//! Logger threshold follows the replay config

use arena_replay::logger::{self, LogLevel};
use arena_replay::{create_headless_app, ReplayConfig};

#[test]
fn test_config_log_level_reaches_logger() {
    let mut app = create_headless_app();
    app.update();
    assert_eq!(logger::log_level(), LogLevel::Debug);

    app.insert_resource(ReplayConfig {
        log_level: LogLevel::Warning,
        ..Default::default()
    });
    app.update();
    assert_eq!(logger::log_level(), LogLevel::Warning);
}
