use std::{
    io::{self, stderr, IsTerminal, Write as _},
    path::PathBuf,
};

use clap::Parser;
use eyre::Context as _;
use testgen::{config::Config, format::GoImports, Generator};
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt as _, EnvFilter};

/// Generates a stub of a Go interface: a struct with an overridable function
/// field per method and forwarding methods that return zero values.
///
/// Example: testgen Test github.com/test/test.Test
#[derive(Parser, Debug)]
#[command(name = "testgen")]
struct Cmd {
    /// Name of the generated struct.
    #[arg()]
    recv: String,

    /// Interface to stub, as `path/to/pkg.Name` or `pkg.Name`.
    #[arg()]
    iface: String,

    /// Output file relative to the output root; printed to stdout if absent.
    #[arg()]
    out: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Path of the goimports program.
    #[arg(long)]
    goimports: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    silent: bool,
}

fn main() -> Result<(), eyre::Error> {
    color_eyre::install()?;

    let cmd = Cmd::parse();

    if !cmd.silent {
        let mut subscriber = tracing_subscriber::fmt::layer().with_writer(io::stderr);

        if !stderr().is_terminal() {
            subscriber.set_ansi(false);
        }

        tracing::subscriber::set_global_default(
            tracing_subscriber::Registry::default()
                .with(
                    EnvFilter::builder()
                        .with_env_var("TESTGEN_LOG")
                        .with_default_directive(LevelFilter::WARN.into())
                        .from_env_lossy(),
                )
                .with(ErrorLayer::default())
                .with(subscriber),
        )
        .wrap_err("failed to configure tracing")?;
    }

    let mut config = match &cmd.config {
        | Some(path) => Config::from_path(path)?,
        | None => Config::default(),
    };

    if cmd.goimports.is_some() {
        config.goimports = cmd.goimports;
    }

    let config = config.fill_from_env();
    let goimports = GoImports::from_config(&config);
    let generator = Generator::new(config, goimports);
    let generated = generator.generate(&cmd.recv, &cmd.iface, cmd.out.as_deref())?;

    match &generated.path {
        | Some(path) => {
            generated.save()?;
            println!("generated file: {}", path.display());
        },
        | None => io::stdout()
            .write_all(generated.source.as_bytes())
            .wrap_err("failed to write to stdout")?,
    }

    Ok(())
}
