use clap::Parser;
use logic_sim::console::Console;
use logic_sim::Circuit;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const BANNER: &str = "Logic circuit simulator. Type \"help\" for the list of commands.";

#[derive(Parser, Debug)]
#[command(version, about = "Interactive combinational logic circuit simulator")]
struct Args {
    /// Number of circuit inputs.
    #[arg(short, long, default_value_t = 4)]
    inputs: usize,
    /// Number of circuit outputs.
    #[arg(short, long, default_value_t = 4)]
    outputs: usize,
    /// Circuit file to load at startup, replaces --inputs/--outputs.
    #[arg(short, long)]
    load: Option<PathBuf>,
    /// Commands to run before the prompt, one per line.
    #[arg(short, long)]
    script: Option<PathBuf>,
    /// Exit after the script instead of starting the prompt.
    #[arg(long)]
    batch: bool,
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim(), "exit" | "quit" | "q")
}

/// Runs every line of `input`, returns false once an exit command is seen.
fn run<R: BufRead, W: Write>(
    console: &mut Console<W>,
    input: R,
    prompt: bool,
) -> io::Result<bool> {
    let mut lines = input.lines();
    loop {
        if prompt {
            print!("> ");
            io::stdout().flush().unwrap_or(());
        }
        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(true),
        };
        if is_exit(&line) {
            return Ok(false);
        }
        console.execute_line(&line)?;
    }
}

fn session(args: &Args) -> io::Result<()> {
    let mut circuit = Circuit::try_new(args.inputs, args.outputs)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    if let Some(path) = &args.load {
        if let Err(err) = circuit.load(path) {
            error!(%err, "initial load failed");
            return Err(io::Error::new(io::ErrorKind::InvalidData, err));
        }
        info!(path = %path.display(), "circuit loaded");
    }
    let stdout = io::stdout();
    let mut console = Console::new(circuit, stdout.lock());
    if let Some(path) = &args.script {
        let file = std::fs::File::open(path)?;
        if !run(&mut console, io::BufReader::new(file), false)? {
            return Ok(());
        }
    }
    if args.batch {
        return Ok(());
    }
    println!("{}", BANNER);
    let stdin = io::stdin();
    run(&mut console, stdin.lock(), true)?;
    println!();
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = session(&args) {
        eprintln!("ERR: {}", err);
        std::process::exit(1);
    }
}

#[test]
fn test_run_stops_on_exit() {
    let mut console = Console::new(Circuit::new(1, 1), Vec::new());
    let script = "ac 2 1 3 0\nsc 0\nro\nquit\nro\n";
    assert!(!run(&mut console, script.as_bytes(), false).unwrap());
    let (_, out) = console.into_inner();
    assert_eq!(String::from_utf8(out).unwrap(), "OK\nOK\n1\nOK\n");
}

#[test]
fn test_args() {
    let args = Args::parse_from(["logic_sim", "-i", "2", "--batch"]);
    assert_eq!(args.inputs, 2);
    assert_eq!(args.outputs, 4);
    assert!(args.batch);
    assert!(args.load.is_none());
}
