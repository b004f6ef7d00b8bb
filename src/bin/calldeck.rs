use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use calldeck::aggregate::aggregate;
use calldeck::app::{App, ChartSnapshot};
use calldeck::config::ConfigLoader;
use calldeck::controller::Status;
use calldeck::domain::{DatasetKind, sample_dataset};
use calldeck::entry::{CategoryCharset, EntryParser, ParsePolicy};
use calldeck::error::CalldeckError;
use calldeck::output::JsonOutput;
use calldeck::remote::RestDatasetClient;

#[derive(Parser)]
#[command(name = "calldeck")]
#[command(about = "Call-center analytics core with personalized remote datasets")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Work with chart datasets")]
    Data(DataArgs),
}

#[derive(Args)]
struct DataArgs {
    #[command(subcommand)]
    command: DataCommand,
}

#[derive(Subcommand)]
enum DataCommand {
    #[command(about = "Fetch a stored dataset and print its ranked series")]
    Show(ShowArgs),
    #[command(about = "Validate entries and upsert them for an identifier")]
    Set(SetArgs),
    #[command(about = "Parse and rank entries locally, without the remote store")]
    Preview(PreviewArgs),
    #[command(about = "Print the ranked built-in sample dataset")]
    Sample(SampleArgs),
}

#[derive(Args)]
struct ShowArgs {
    #[arg(long)]
    identifier: String,

    #[arg(long, value_enum, default_value = "call-analysis")]
    kind: DatasetKind,

    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct SetArgs {
    #[arg(long)]
    identifier: String,

    #[arg(long)]
    entries: String,

    #[arg(long, value_enum, default_value = "call-analysis")]
    kind: DatasetKind,

    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct PreviewArgs {
    #[arg(long)]
    entries: String,

    #[arg(long, value_enum, default_value = "call-analysis")]
    kind: DatasetKind,

    #[arg(long, value_enum, default_value = "strict")]
    policy: ParsePolicy,

    #[arg(long, value_enum, default_value = "alphanumeric")]
    charset: CategoryCharset,
}

#[derive(Args)]
struct SampleArgs {
    #[arg(long, value_enum, default_value = "call-analysis")]
    kind: DatasetKind,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CalldeckError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CalldeckError) -> u8 {
    match error {
        CalldeckError::MissingConfig
        | CalldeckError::ConfigRead(_)
        | CalldeckError::ConfigParse(_) => 2,
        CalldeckError::RemoteHttp(_)
        | CalldeckError::RemoteStatus { .. }
        | CalldeckError::RemoteDecode(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Data(args) => run_data(args.command),
    }
}

fn run_data(command: DataCommand) -> miette::Result<()> {
    match command {
        DataCommand::Show(args) => {
            let mut app = connect(args.config.as_deref(), args.kind)?;
            app.set_identifier(&args.identifier).into_diagnostic()?;
            JsonOutput::print_snapshot(&app.snapshot()).into_diagnostic()?;
            Ok(())
        }
        DataCommand::Set(args) => {
            let mut app = connect(args.config.as_deref(), args.kind)?;
            // A transport failure on the initial fetch still leaves the
            // identifier assigned; the save below can proceed and is the
            // operation the user asked for.
            if let Err(err) = app.set_identifier(&args.identifier) {
                if !err.is_transport() {
                    return Err(err.into());
                }
            }
            let ignored = app.submit_raw_entries(&args.entries).into_diagnostic()?;
            if !ignored.is_empty() {
                eprintln!("ignored entries: {}", ignored.join(", "));
            }
            JsonOutput::print_snapshot(&app.snapshot()).into_diagnostic()?;
            Ok(())
        }
        DataCommand::Preview(args) => {
            let parser = EntryParser::new(args.policy, args.charset);
            let parsed = parser.parse(&args.entries).into_diagnostic()?;
            if !parsed.ignored.is_empty() {
                eprintln!("ignored entries: {}", parsed.ignored.join(", "));
            }
            let aggregation = aggregate(&parsed.entries);
            let snapshot = ChartSnapshot::new(args.kind, None, Status::Default, &aggregation);
            JsonOutput::print_snapshot(&snapshot).into_diagnostic()?;
            Ok(())
        }
        DataCommand::Sample(args) => {
            let aggregation = aggregate(&sample_dataset(args.kind));
            let snapshot = ChartSnapshot::new(args.kind, None, Status::Default, &aggregation);
            JsonOutput::print_snapshot(&snapshot).into_diagnostic()?;
            Ok(())
        }
    }
}

fn connect(config: Option<&str>, kind: DatasetKind) -> miette::Result<App<RestDatasetClient>> {
    let resolved = ConfigLoader::resolve(config).into_diagnostic()?;
    let client = RestDatasetClient::new(&resolved.remote).into_diagnostic()?;
    let parser = EntryParser::new(resolved.policy, resolved.charset);
    Ok(App::new(client, parser, kind))
}
