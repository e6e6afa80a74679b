use clap::{Parser as ClapParser, Subcommand};
use jmes_lang::{
    NullCheckStyle,
    cli::{self, CheckOptions, CliError, CodegenOptions, SearchOptions},
    to_json_pretty, Value,
};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "jmes")]
#[command(about = "jmes - JMESPath expressions: evaluate, check, or compile to Rust accessors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against JSON input
    Search {
        /// The JMESPath expression
        expression: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Parse an expression and print its canonical form
    Check {
        /// The JMESPath expression
        expression: String,

        /// Also print the syntax tree
        #[arg(long)]
        ast: bool,
    },

    /// Generate a Rust accessor for an expression
    Codegen {
        /// The JMESPath expression
        expression: String,

        /// JSON file with codegen settings (camelCase keys)
        #[arg(long)]
        config: Option<String>,

        /// Prefix for generated temporaries
        #[arg(long)]
        prefix: Option<String>,

        /// explicit-if or null-coalescing
        #[arg(long)]
        style: Option<NullCheckStyle>,

        /// Module path of the runtime helpers
        #[arg(long)]
        namespace: Option<String>,

        /// Name of the input variable
        #[arg(long)]
        input_var: Option<String>,

        /// Emit a complete `pub fn` with this name
        #[arg(long)]
        fn_name: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search {
            expression,
            input,
            pretty,
        } => run_search(expression, input, pretty),
        Commands::Check { expression, ast } => run_check(expression, ast),
        Commands::Codegen {
            expression,
            config,
            prefix,
            style,
            namespace,
            input_var,
            fn_name,
        } => {
            let options = CodegenOptions {
                expression,
                config_path: config,
                prefix,
                style,
                namespace,
                input_variable: input_var,
                function_name: fn_name,
            };
            cli::execute_codegen(&options).map(|code| println!("{}", code))
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_search(expression: String, input: Option<String>, pretty: bool) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let output = cli::execute_search(&SearchOptions { expression, input })?;
    let json = if pretty {
        to_json_pretty(&Value::from(output))
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);
    Ok(())
}

fn run_check(expression: String, ast: bool) -> Result<(), CliError> {
    let result = cli::execute_check(&CheckOptions { expression, ast })?;
    println!("{}", result.canonical);
    if let Some(tree) = result.ast {
        println!("{}", tree);
    }
    Ok(())
}
