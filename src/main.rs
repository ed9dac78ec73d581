use std::path::PathBuf;
use std::process::ExitCode;

use kassenexport::config::Config;
use kassenexport::core::{InvoiceGapScan, LedgerError, split_list};
use kassenexport::logging;
use kassenexport::operator::Terminal;
use kassenexport::run::{Run, RunOutcome};

const USAGE: &str = "\
usage:
  kassenexport [--config FILE] run SOURCE [--place PLACE]
  kassenexport [--config FILE] sources
  kassenexport gaps --dirs DIR[,DIR..] --prefixes P[,P..] [--digits N] [--filter LEADING]

The configuration document defaults to ./config.json.";

enum Command {
    Run { source: String, place: Option<String> },
    Sources,
    Gaps {
        dirs: Vec<PathBuf>,
        prefixes: String,
        digits: usize,
        filter: Option<String>,
    },
    Help,
}

struct Args {
    config: PathBuf,
    command: Command,
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1).collect()) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<(), LedgerError> {
    match args.command {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Sources => {
            let config = Config::from_path(&args.config)?;
            for (name, source) in &config.sources {
                println!(
                    "{name:<12} {:<18} {} -> {}",
                    source.kind.label(),
                    source.import_dir.join(source.pattern()).display(),
                    config.export_dir_for(source).display()
                );
            }
            Ok(())
        }
        Command::Run { source, place } => {
            let config = Config::from_path(&args.config)?;
            logging::init_file(&config.log_file)?;
            let mut run = Run::new(&config, &source)?;
            if let Some(place) = place {
                run = run.place(place);
            }
            match run.execute(&mut Terminal::stdio())? {
                RunOutcome::Declined => println!("Exiting without processing files."),
                RunOutcome::NothingToExport {
                    reason,
                    diagnostics,
                } => {
                    for d in &diagnostics {
                        println!("  {d}");
                    }
                    println!("Nothing exported: {reason}.");
                }
                RunOutcome::Exported(report) => print!("{report}"),
            }
            Ok(())
        }
        Command::Gaps {
            dirs,
            prefixes,
            digits,
            filter,
        } => {
            logging::init_stderr();
            let mut scan = InvoiceGapScan::from_list(&prefixes, digits);
            if let Some(filter) = filter {
                scan = scan.with_filter(filter);
            }
            let report = scan.scan(&dirs)?;
            for dir in &report.skipped_dirs {
                println!("skipped missing directory {}", dir.display());
            }
            let Some((min, max)) = report.range() else {
                println!("No invoice numbers found.");
                return Ok(());
            };
            println!(
                "{} invoice numbers from {} to {}",
                report.found.len(),
                report.display_number(min),
                report.display_number(max)
            );
            if report.missing.is_empty() {
                println!("No gaps.");
            } else {
                println!("Missing ({}):", report.missing.len());
                for n in &report.missing {
                    println!("  {}", report.display_number(*n));
                }
            }
            Ok(())
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    let mut config = PathBuf::from("config.json");
    let mut positional = Vec::new();
    let mut place = None;
    let mut dirs = None;
    let mut prefixes = None;
    let mut digits = 5usize;
    let mut filter = None;

    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(Args {
                    config,
                    command: Command::Help,
                });
            }
            "--config" => config = PathBuf::from(value("--config")?),
            "--place" => place = Some(value("--place")?),
            "--dirs" => dirs = Some(value("--dirs")?),
            "--prefixes" => prefixes = Some(value("--prefixes")?),
            "--digits" => {
                let raw = value("--digits")?;
                digits = raw
                    .parse()
                    .map_err(|_| format!("--digits expects a number, got '{raw}'"))?;
            }
            "--filter" => filter = Some(value("--filter")?),
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ => positional.push(arg),
        }
    }

    let command = match positional.as_slice() {
        [cmd, source] if cmd == "run" => Command::Run {
            source: source.clone(),
            place,
        },
        [cmd] if cmd == "run" => return Err("run needs a SOURCE".into()),
        [cmd] if cmd == "sources" => Command::Sources,
        [cmd] if cmd == "gaps" => Command::Gaps {
            dirs: split_list(&dirs.ok_or("gaps needs --dirs")?)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            prefixes: prefixes.ok_or("gaps needs --prefixes")?,
            digits,
            filter,
        },
        [] => Command::Help,
        other => return Err(format!("unexpected arguments: {}", other.join(" "))),
    };
    Ok(Args { config, command })
}
