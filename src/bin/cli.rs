use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use rummy::dsl::builtins::{BUILTINS, CONSTANTS};
use rummy::{dsl, Deck, DeckError, SymbolTable, Syntax};

/// Built-in physical constants compiled ahead of every deck file.
const PHYSICAL_CONSTANTS: &str = "\
<physical/constants>
c = 2.99792458e8    # speed of light [m/s]
kb = 1.380649e-23   # Boltzmann constant [J/K]
";

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rummy", about = "Compile and inspect card decks", version)]
struct Cli {
    /// Deck file to compile. Without one, start an interactive session.
    file: Option<PathBuf>,

    /// Extra deck text compiled after the built-in constants, before FILE
    #[arg(long, value_name = "FILE")]
    prelude: Option<PathBuf>,

    /// Skip the built-in physical constants
    #[arg(long)]
    no_prelude: bool,

    /// JSON file overriding the dialect punctuation
    #[arg(long, value_name = "FILE")]
    syntax: Option<PathBuf>,

    /// Print the compiled deck as JSON
    #[arg(long, conflicts_with = "write")]
    json: bool,

    /// Print the compiled deck back in the source dialect
    #[arg(long)]
    write: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.file {
        Some(path) => run_file(&cli, path),
        None => run_session(),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run_file(cli: &Cli, path: &Path) -> Result<(), DeckError> {
    let syntax = match &cli.syntax {
        Some(file) => Syntax::load(file)?,
        None => Syntax::default(),
    };

    let mut prelude = String::new();
    if !cli.no_prelude {
        prelude.push_str(PHYSICAL_CONSTANTS);
    }
    if let Some(file) = &cli.prelude {
        let text = std::fs::read_to_string(file).map_err(|source| DeckError::Open {
            path: file.clone(),
            source,
        })?;
        prelude.push_str(&text);
        prelude.push('\n');
    }

    let mut deck = Deck::with_syntax(syntax);
    deck.build_file(path, &prelude)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &deck).map_err(io::Error::from)?;
        writeln!(out)?;
    } else if cli.write {
        deck.write_deck(&mut out)?;
    } else {
        deal(&deck, &mut out)?;
    }
    Ok(())
}

/// Print every suit with its cards, one `NN: name = value` line per card.
fn deal(deck: &Deck, out: &mut impl Write) -> io::Result<()> {
    for (suit, cards) in deck.iter() {
        writeln!(out, "{suit}")?;
        for card in cards.values() {
            let line = card.line.map_or_else(|| "--".to_string(), |l| format!("{l:02}"));
            writeln!(out, "{line}: {} = {}", card.name, card.get_string())?;
        }
    }
    Ok(())
}

/// Read statements from stdin until `exit`, `quit` or end of input. `help`
/// lists the builtins.
fn run_session() -> Result<(), DeckError> {
    let mut globals = SymbolTable::new();
    let stdin = io::stdin();
    let stdout = io::stdout();

    prompt(&stdout)?;
    for line in stdin.lock().lines() {
        let line = line?;
        let statement = line.trim();
        if statement == "exit" || statement == "quit" {
            break;
        }
        if statement == "help" {
            help(&mut stdout.lock())?;
        } else if !statement.is_empty() {
            match dsl::interpret(statement, &mut globals, None) {
                Ok(Some(value)) => println!("{value}"),
                Ok(None) => {}
                Err(e) => eprintln!("{}", e.format_with_source(statement)),
            }
        }
        prompt(&stdout)?;
    }
    Ok(())
}

/// List the builtin functions by category, then the named constants.
fn help(out: &mut impl Write) -> io::Result<()> {
    let mut category = "";
    for builtin in BUILTINS {
        if builtin.category != category {
            category = builtin.category;
            writeln!(out, "{category}:")?;
        }
        let call = format!("{}({})", builtin.name, builtin.params.join(", "));
        writeln!(out, "  {call:<20} {}", builtin.description)?;
    }
    writeln!(out, "constants:")?;
    for (name, value) in CONSTANTS {
        writeln!(out, "  {name:<20} {value}")?;
    }
    Ok(())
}

fn prompt(stdout: &io::Stdout) -> io::Result<()> {
    let mut out = stdout.lock();
    write!(out, "> ")?;
    out.flush()
}
