// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Error};
use cfn_addons::{addons::AddonsDir, classify_outputs, AddonsError};
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cfn-addons", version, about = "Merge and inspect CloudFormation addon templates")]
struct Args {
    /// Raise log verbosity. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the templates of an addons directory.
    Merge {
        /// Addons directory holding params, outputs and resource templates.
        dir: PathBuf,

        /// Write the merged template here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List which outputs of a rendered template are secrets or managed policies.
    Classify {
        template: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Conflicts are fixed by hand, so show both definitions.
            match err.downcast_ref::<AddonsError>() {
                Some(AddonsError::Conflict { path, source }) => {
                    eprintln!("error: {}: {}", path.display(), source.human_error());
                }
                _ => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Merge { dir, output } => {
            let addons = AddonsDir::open(dir)?.load()?;
            let yaml = addons.template.emit();
            match output {
                Some(output) => {
                    fs::write(&output, yaml).with_context(|| format!("cannot write {}", output.display()))?;
                }
                None => print!("{}", yaml),
            }
        }
        Command::Classify { template } => {
            let input =
                fs::read_to_string(&template).with_context(|| format!("cannot read {}", template.display()))?;
            let mut descriptors = classify_outputs(&input).with_context(|| format!("{}", template.display()))?;
            descriptors.sort_by(|a, b| a.name.cmp(&b.name));
            for descriptor in descriptors {
                println!(
                    "{} secret={} managed_policy={}",
                    descriptor.name, descriptor.is_secret, descriptor.is_managed_policy
                );
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG takes precedence over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
