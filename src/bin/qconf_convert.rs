//! Converts a serialized configuration record between scheduler
//! releases, printing the result as JSON or as the native text format.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use log::debug;

use gridconf::objects::ObjectFactory;
use gridconf::{QconfApi, QconfSettings, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Uge,
}

#[derive(Debug, Parser)]
#[command(
    name = "qconf-convert",
    about = "Convert a configuration object between scheduler releases"
)]
struct Args {
    /// JSON file holding the serialized object.
    #[arg(long)]
    input_file: PathBuf,

    /// Target scheduler release. Defaults to the release of the cluster
    /// reachable from the current environment.
    #[arg(long)]
    to_version: Option<String>,

    /// Output representation.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output_format: OutputFormat,
}

fn run(args: Args) -> Result<()> {
    let settings = QconfSettings::from_env()?;
    let json = fs::read_to_string(&args.input_file)?;

    let target = match args.to_version {
        Some(version) => version,
        None => {
            let api = QconfApi::new(settings.clone())?;
            api.get_version()?.to_string()
        }
    };
    debug!("converting {} to release {}", args.input_file.display(), target);

    let factory = ObjectFactory::new(target.clone(), settings)?;
    let object = factory.generate_from_json(&json, Some(&target))?;
    match args.output_format {
        OutputFormat::Json => println!("{}", object.to_json_string()),
        OutputFormat::Uge => print!("{}", object.to_text()?),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        println!("{}", err);
        process::exit(err.exit_code());
    }
}
