use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, IntoDiagnostic, Result};

use oneaddr::console::{Console, Scripted, Terminal};
use oneaddr::Machine;

/// Assembler and simulator for a one-address accumulator machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble and run a `.asm` file
    Run {
        /// `.asm` file to run
        name: PathBuf,
        /// Trace every fetch, increment and execute on stderr
        #[arg(short, long)]
        verbose: bool,
        /// Print registers, memory and symbols after the run
        #[arg(short, long)]
        dump: bool,
        /// Read console input from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Assemble a `.asm` file and print the loaded machine without running it
    Dump {
        /// `.asm` file to load
        name: PathBuf,
    },
    /// Check a `.asm` file for skipped lines and unknown labels without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Place a watch on a `.asm` file to re-check it on every change
    Watch {
        /// `.asm` file to watch
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    oneaddr::env::init();
    oneaddr::output::is_verbose::set(oneaddr::env::is_verbose());

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(2)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(&path, RunOptions::default());
        }
        println!("\n~ oneaddr v{VERSION} ~");
        println!("{SHORT_INFO}");
        std::process::exit(0);
    };

    match command {
        Command::Run {
            name,
            verbose,
            dump,
            input,
        } => {
            if verbose {
                oneaddr::output::is_verbose::set(true);
            }
            run(&name, RunOptions { dump, input })
        }
        Command::Dump { name } => {
            file_message(Green, "Loading", &name);
            let (machine, _) = Machine::from_source(&read_source(&name)?);
            println!("{}", machine.dump());
            Ok(())
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            check(&read_source(&name)?);
            Ok(())
        }
        Command::Watch { name } => {
            if !name.exists() {
                bail!("File does not exist. Exiting...")
            }
            // Editors replace files on save, so watch the parent folder
            let folder_path = match name.parent() {
                Some(pth) if pth.is_dir() => pth.to_path_buf(),
                _ => Path::new(".").to_path_buf(),
            };

            // Clear screen and move cursor to top left
            print!("\x1B[2J\x1B[2;1H");
            file_message(Green, "Watching", &name);
            message(Cyan, "Help", "press CTRL+C to exit");

            let mut watcher = Hotwatch::new_with_custom_delay(Duration::from_millis(500))
                .into_diagnostic()?;

            watcher
                .watch(folder_path, move |event: Event| match event.kind {
                    EventKind::Modify(_) | EventKind::Remove(_) => {
                        print!("\x1B[2J\x1B[2;1H");
                        file_message(Green, "Watching", &name);
                        message(Green, "Re-checking", "file change detected");
                        message(Cyan, "Help", "press CTRL+C to exit");

                        // Let the editor finish writing
                        sleep(Duration::from_millis(50));

                        match fs::read_to_string(&name) {
                            Ok(src) => check(&src),
                            Err(e) => {
                                eprintln!("{e}. Exiting...");
                                std::process::exit(1)
                            }
                        }
                        Flow::Continue
                    }
                    _ => Flow::Continue,
                })
                .into_diagnostic()?;
            watcher.run();
            Ok(())
        }
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn read_source(name: &Path) -> Result<String> {
    match name.extension().and_then(|ext| ext.to_str()) {
        Some("asm") | Some("txt") => fs::read_to_string(name).into_diagnostic(),
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    }
}

#[derive(Default)]
struct RunOptions {
    dump: bool,
    input: Option<PathBuf>,
}

fn run(name: &Path, opts: RunOptions) -> Result<()> {
    file_message(MsgColor::Green, "Assembling", name);
    let (mut machine, report) = Machine::from_source(&read_source(name)?);
    for (line, digits) in &report.out_of_range {
        message(
            MsgColor::Red,
            "Range",
            &format!("line {line}: literal `{digits}` is out of range"),
        );
    }
    message(
        MsgColor::Green,
        "Loaded",
        &format!("{} instructions", report.loaded),
    );

    let mut console: Box<dyn Console> = match &opts.input {
        Some(path) => {
            let text = fs::read_to_string(path).into_diagnostic()?;
            Box::new(Scripted::from_text(&text).echo(true))
        }
        None => Box::new(Terminal::new()),
    };

    message(MsgColor::Green, "Running", "loaded program");
    let result = machine.run(console.as_mut());

    if opts.dump || oneaddr::env::is_dump() {
        println!("{}", machine.dump());
    }

    match result {
        Ok(halt) => {
            message(
                MsgColor::Cyan,
                "Halted",
                &format!("after {} instructions", halt.steps),
            );
            file_message(MsgColor::Green, "Completed", name);
            Ok(())
        }
        Err(fault) => {
            message(
                MsgColor::Red,
                "Faulted",
                &format!("at address {}", fault.addr),
            );
            Err(fault.into())
        }
    }
}

/// Assemble without running and report anything the loader quietly dropped.
fn check(src: &str) {
    let (_, report) = Machine::from_source(src);
    let lines: Vec<&str> = src.lines().collect();
    for &line in &report.skipped {
        let text = lines.get(line - 1).copied().unwrap_or_default();
        message(
            MsgColor::Red,
            "Skipped",
            &format!("line {line}: `{}`", text.trim()),
        );
    }
    for (line, label) in &report.unresolved {
        message(
            MsgColor::Red,
            "Unknown",
            &format!("line {line}: label `{label}` is never defined"),
        );
    }
    for (line, digits) in &report.out_of_range {
        message(
            MsgColor::Red,
            "Range",
            &format!("line {line}: literal `{digits}` is out of range"),
        );
    }
    message(
        MsgColor::Green,
        "Loaded",
        &format!("{} instructions", report.loaded),
    );
    if report.skipped.is_empty() && report.unresolved.is_empty() && report.out_of_range.is_empty()
    {
        message(MsgColor::Green, "Success", "no problems found!");
    }
}

const SHORT_INFO: &str = r"
A simulator for a single-accumulator, one-address computer.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
