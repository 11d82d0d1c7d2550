/// The current version of the Nusair player backend.
pub const VERSION: &str = "0.1.0";

pub mod core;

#[cfg(feature = "testing")]
pub mod testing {
    use log::LevelFilter;
    use log4rs::append::console::ConsoleAppender;
    use log4rs::config::{Appender, Logger, Root};
    use log4rs::encode::pattern::PatternEncoder;
    use log4rs::Config;
    use std::fs;
    use std::fs::OpenOptions;
    use std::io::Read;
    use std::sync::Once;
    use tempfile::TempDir;

    static INIT: Once = Once::new();

    /// Initializes the logger with the specified log level.
    #[macro_export]
    macro_rules! init_logger {
        ($level:expr) => {
            nusair_player_core::testing::init_logger_level($level)
        };
        () => {
            nusair_player_core::testing::init_logger_level(log::LevelFilter::Trace)
        };
    }

    /// Initializes the logger with the specified log level.
    pub fn init_logger_level(level: LevelFilter) {
        INIT.call_once(|| {
            log4rs::init_config(
                Config::builder()
                    .appender(Appender::builder().build(
                        "stdout",
                        Box::new(
                            ConsoleAppender::builder()
                                .encoder(Box::new(PatternEncoder::new(
                                    "\x1B[37m{d(%Y-%m-%d %H:%M:%S%.3f)}\x1B[0m {h({l:>5.5})} \x1B[35m{I:>6.6}\x1B[0m \x1B[37m---\x1B[0m \x1B[37m[{T:>15.15}]\x1B[0m \x1B[36m{t:<60.60}\x1B[0m \x1B[37m:\x1B[0m {m}{n}",
                                )))
                                .build(),
                        ),
                    ))
                    .logger(Logger::builder().build("fx_callback", LevelFilter::Info))
                    .logger(Logger::builder().build("mio", LevelFilter::Info))
                    .build(Root::builder().appender("stdout").build(level))
                    .unwrap(),
            )
            .unwrap();
        })
    }

    /// Write the given contents to a file within the temp directory.
    /// It returns the absolute path of the written file.
    pub fn write_temp_dir_file(temp_dir: &TempDir, filename: &str, contents: &str) -> String {
        let path = temp_dir.path().join(filename);
        fs::write(&path, contents).expect("expected the file to be written");
        path.to_str().unwrap().to_string()
    }

    /// Read the contents of the given filename within the temp directory as a [String].
    pub fn read_temp_dir_file_as_string(temp_dir: &TempDir, filename: &str) -> String {
        let mut data = String::new();
        let mut file = OpenOptions::new()
            .read(true)
            .open(temp_dir.path().join(filename))
            .expect("expected the file to exist within the temp directory");

        file.read_to_string(&mut data)
            .expect("expected the file to be readable");
        data
    }
}
