use std::{fs, path::PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use hornlite::{
    build_model_from_json, generate_seeded, query, Descent, GeneratorConfig, Shape, Strategy,
};

#[derive(Parser)]
#[command(name = "hornlite")]
#[command(about = "Propositional Horn-clause reasoning, forward and backward")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the question of a JSON rule-set description
    Query {
        /// Description file
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = EngineArg::Both)]
        engine: EngineArg,
        #[arg(long, value_enum, default_value_t = DescentArg::Iterative)]
        descent: DescentArg,
        /// Ask this instead of the description's question
        #[arg(long)]
        question: Option<String>,
        /// Print work counters after each answer
        #[arg(long)]
        stats: bool,
    },
    /// Print a random description as JSON
    Generate {
        #[arg(long, default_value = "10")]
        rules: usize,
        #[arg(long, default_value = "3")]
        max_antecedents: usize,
        /// Let antecedents point back into the graph
        #[arg(long)]
        cyclic: bool,
        #[arg(long, default_value = "0.4")]
        back_edge_probability: f64,
        /// Chance that each leaf is a known fact
        #[arg(long, default_value = "1.0")]
        grounding: f64,
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineArg {
    Forward,
    Backward,
    Both,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DescentArg {
    Iterative,
    Recursive,
}

impl From<DescentArg> for Descent {
    fn from(arg: DescentArg) -> Self {
        match arg {
            DescentArg::Iterative => Descent::Iterative,
            DescentArg::Recursive => Descent::Recursive,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query { file, engine, descent, question, stats } => {
            let input = fs::read_to_string(&file)?;
            let mut model = build_model_from_json(&input)?;
            let question = match question {
                Some(text) => model.parse_question(&text)?,
                None => model.question().clone(),
            };
            let rendered = model.describe_formula(&question);

            let mut strategies = vec![];
            if engine != EngineArg::Backward {
                strategies.push(("forward", Strategy::Forward));
            }
            if engine != EngineArg::Forward {
                strategies.push(("backward", Strategy::Backward(descent.into())));
            }

            for (label, strategy) in strategies {
                let answer = query(&mut model, &question, strategy);
                println!("{label}: {rendered} is {}", answer.holds);
                if stats {
                    println!("  {}", answer.stats);
                }
            }
        }
        Commands::Generate {
            rules,
            max_antecedents,
            cyclic,
            back_edge_probability,
            grounding,
            seed,
        } => {
            let config = GeneratorConfig {
                rules,
                max_antecedents,
                shape: if cyclic { Shape::Cyclic } else { Shape::Acyclic },
                back_edge_probability,
                grounding,
            };
            println!("{}", generate_seeded(&config, seed).to_json()?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
