//! Log output for the command-line tools

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber
///
/// `RUST_LOG` takes precedence; otherwise `-v` enables info and `-vv` debug
/// output for the dartprep crates. `quiet` installs nothing.
pub fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(filter_for(verbose)).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .try_init();
}

fn filter_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,dartprep_jobs=info",
        1 => "dartprep_core=info,dartprep_io=info,dartprep_reconstruction=info,dartprep_simplification=info,dartprep_jobs=info",
        2 => "dartprep_core=debug,dartprep_io=debug,dartprep_reconstruction=debug,dartprep_simplification=debug,dartprep_jobs=debug",
        _ => "trace",
    }
}
