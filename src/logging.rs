use console::style;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

/// Initialize the logger. Default level is warn so a normal launch is
/// silent; `-v` (or `RUST_LOG`) raises it to debug, which also shows
/// skipped setup steps and cache refresh activity.
pub fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };

    Builder::from_env(Env::default().filter_or("RUST_LOG", default))
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => style("ERROR").red().bold(),
                Level::Warn => style("WARN ").yellow(),
                Level::Info => style("INFO ").green(),
                Level::Debug => style("DEBUG").dim(),
                Level::Trace => style("TRACE").dim(),
            };
            writeln!(buf, "{} {}", level, record.args())
        })
        .init();
}
