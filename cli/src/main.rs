mod error_formatter;
mod formatter;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use formatter::Formatter;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tributary::{
    Captures, Engine, Expression, OperationKind, ResourceLimits, TerminalCall, Value,
};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Compile reactive expression trees into service operations.")]
#[command(
    long_about = "Tributary normalizes expression trees over URI-addressed reactive resources and compiles them into the operations a service backend executes.\nThe CLI reads expression text, closes it over --let bindings and prints the normal form, the compiled operation or a structural report."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pipeline stages to stderr (same as RUST_LOG=tributary=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum expression nesting depth for parsing and reduction
    #[arg(long, global = true, value_name = "N")]
    max_depth: Option<usize>,

    /// Maximum number of beta-reduction steps
    #[arg(long, global = true, value_name = "N")]
    max_steps: Option<usize>,
}

#[derive(Args)]
struct Input {
    /// Expression text; read from --file or stdin when omitted
    expression: Option<String>,

    /// Read the expression from a file
    #[arg(short, long, value_name = "PATH", conflicts_with = "expression")]
    file: Option<PathBuf>,

    /// Bind a free name to a literal (format: name=value)
    ///
    /// Examples: --let limit=10, --let name="north", --let period=1500ms
    #[arg(long = "let", value_name = "NAME=VALUE")]
    bindings: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normal form of an expression
    ///
    /// Parses the expression, replaces --let names by constants, folds field
    /// reads on constants and beta-reduces until no redex remains.
    Normalize {
        #[command(flatten)]
        input: Input,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compile a terminal call into a service operation
    ///
    /// Examples:
    ///   tributary compile create-subscription --target rx://s '<rx://builtin/subscribe>(<rx://xs>, <rx://ob>)'
    ///   tributary compile delete-subscription --target rx://s
    ///   tributary compile observer-on-next --target rx://ob --value 42
    Compile {
        /// Operation kind (e.g. CreateSubscription or create-subscription)
        kind: String,
        #[command(flatten)]
        input: Input,
        /// Target URI of the operation
        #[arg(short, long, value_name = "URI")]
        target: Option<String>,
        /// Literal value for observer notifications
        #[arg(long, value_name = "LITERAL")]
        value: Option<String>,
        /// Literal state passed with create and define operations
        #[arg(long, value_name = "LITERAL")]
        state: Option<String>,
        /// Print the operation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show structure, residue and normal form of an expression
    Inspect {
        #[command(flatten)]
        input: Input,
    },
    /// List the known-resource table
    Registry {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let engine = build_engine(&cli);

    let result = match &cli.command {
        Commands::Normalize { input, json } => normalize_command(&engine, input, *json),
        Commands::Compile {
            kind,
            input,
            target,
            value,
            state,
            json,
        } => compile_command(
            &engine,
            kind,
            input,
            target.as_deref(),
            value.as_deref(),
            state.as_deref(),
            *json,
        ),
        Commands::Inspect { input } => inspect_command(&engine, input),
        Commands::Registry { json } => registry_command(&engine, *json),
    };

    if let Err(e) = result {
        if let Some(err) = e.downcast_ref::<tributary::TributaryError>() {
            eprintln!("{}", error_formatter::format_error(err));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tributary=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "tributary=warn".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_engine(cli: &Cli) -> Engine {
    let mut limits = ResourceLimits::default();
    if let Some(depth) = cli.max_depth {
        limits = limits.with_max_expression_depth(depth);
    }
    if let Some(steps) = cli.max_steps {
        limits = limits.with_max_reduction_steps(steps);
    }
    Engine::new().with_limits(limits)
}

fn normalize_command(engine: &Engine, input: &Input, json: bool) -> Result<()> {
    let normalized = load_normalized(engine, input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&normalized)?);
    } else {
        println!("{}", normalized);
    }
    Ok(())
}

fn compile_command(
    engine: &Engine,
    kind: &str,
    input: &Input,
    target: Option<&str>,
    value: Option<&str>,
    state: Option<&str>,
    json: bool,
) -> Result<()> {
    let kind: OperationKind = kind.parse()?;
    let mut call = TerminalCall::new(kind);
    if let Some(target) = target {
        call = call.with_target(target);
    }
    if let Some(value) = value {
        call = call.with_value(parse_literal_value(engine, value)?);
    }
    if let Some(state) = state {
        call = call.with_state(Some(parse_literal_value(engine, state)?));
    }
    if kind.requires_expression() {
        call = call.with_expression(load_closed(engine, input)?);
    }

    let operation = engine.compile(call)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&operation)?);
    } else {
        println!("{}", operation);
    }
    Ok(())
}

fn inspect_command(engine: &Engine, input: &Input) -> Result<()> {
    let expression = load_closed(engine, input)?;
    let normalized = engine.normalize(&expression)?;
    let formatter = Formatter::default();
    print!(
        "{}",
        formatter.format_inspection(&expression, &normalized, engine.registry())
    );
    Ok(())
}

fn registry_command(engine: &Engine, json: bool) -> Result<()> {
    let formatter = Formatter::default();
    if json {
        println!("{}", formatter.registry_json(engine.registry()));
    } else {
        print!("{}", formatter.format_registry(engine.registry()));
    }
    Ok(())
}

fn read_source(input: &Input) -> Result<(String, String)> {
    if let Some(text) = &input.expression {
        return Ok((text.clone(), "<argument>".to_string()));
    }
    if let Some(path) = &input.file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok((text, path.to_string_lossy().to_string()));
    }
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok((text, "<stdin>".to_string()))
}

/// Parse the input and close its free names over the --let bindings
fn load_closed(engine: &Engine, input: &Input) -> Result<Expression> {
    let (text, source_id) = read_source(input)?;
    let expression = engine.parse(&text, Some(source_id))?;
    let captures = parse_bindings(engine, &input.bindings)?;
    debug!(bindings = captures.names().count(), "closing over --let bindings");
    Ok(captures.close_over(&expression)?)
}

fn load_normalized(engine: &Engine, input: &Input) -> Result<Expression> {
    let expression = load_closed(engine, input)?;
    Ok(engine.normalize(&expression)?)
}

fn parse_bindings(engine: &Engine, bindings: &[String]) -> Result<Captures> {
    let mut captures = Captures::new();
    for binding in bindings {
        let (name, value) = binding
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid binding '{}': expected name=value", binding))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Invalid binding '{}': empty name", binding));
        }
        captures.insert(name, parse_literal_value(engine, value.trim())?);
    }
    Ok(captures)
}

/// A literal in expression notation; anything else is taken as text
fn parse_literal_value(engine: &Engine, text: &str) -> Result<Value> {
    match engine.parse(text, Some("<literal>".to_string())) {
        Ok(expression) => match expression.as_constant() {
            Some(value) => Ok(value.clone()),
            None => Ok(Value::String(text.to_string())),
        },
        Err(_) => Ok(Value::String(text.to_string())),
    }
}
