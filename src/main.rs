use std::error::Error;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use cmdkit::cli::commands::execute_command;
use cmdkit::cli::{output, Cli};
use cmdkit::exitcode;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(exitcode::USAGE);
        }
    };

    setup_logging(cli.verbose);

    if let Err(e) = execute_command(&cli) {
        output::error(&error_chain(&e));
        std::process::exit(e.exit_code());
    }
}

/// Render an error and its sources on one line.
fn error_chain(e: &dyn Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        // Wrapping variants repeat their inner message
        if !msg.ends_with(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }
    msg
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // Create a subscriber with formatted output directed to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use cmdkit::infrastructure::InfraError;

    #[test]
    fn given_nested_error_when_error_chain_then_single_line_with_cause() {
        let err = InfraError::io(
            "write /tmp/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(error_chain(&err), "I/O error: write /tmp/x: denied");
    }
}
