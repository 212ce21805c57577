use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ktest::{KTest, KTestReport};
use solver::{ConstraintSolver, SatSolver};
use symtest::explorer::DEFAULT_MAX_INSTRUCTIONS;
use symtest::output::{OutputDirectory, RunInfo, TestRecord};
use symtest::{explore, replay_with_limit, ExplorerConfig, Program, TestVector, KTEST_FILE};

#[derive(Parser, Debug)]
#[command(name = "symtest", version)]
#[command(about = "Generate tests by symbolic execution and replay them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Explore every feasible path of a program and write one test per path
    Explore(ExploreArgs),

    /// Run a program on a test vector and exit with the resulting status
    Replay(ReplayArgs),

    /// Print the contents of a KTEST file
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct ExploreArgs {
    /// Program in JSON form
    program: PathBuf,

    /// Directory to write tests to. Must not exist. Defaults to the next free `symtest-out-N`
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, env = "SYMTEST_JOBS", default_value_t = 1)]
    jobs: usize,

    /// Instructions a path may execute before it is dropped
    #[arg(long, default_value_t = DEFAULT_MAX_INSTRUCTIONS)]
    max_instructions: usize,

    #[arg(long, value_enum, default_value_t = SolverKind::default())]
    solver: SolverKind,

    /// Conflicts before the fallback `sat` solver gives up on a query. 0 removes the limit
    #[arg(long, default_value_t = SatSolver::DEFAULT_MAX_CONFLICTS)]
    max_conflicts: usize,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Program in JSON form
    program: PathBuf,

    /// Test vector to replay
    #[arg(long, env = KTEST_FILE)]
    ktest_file: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MAX_INSTRUCTIONS)]
    max_instructions: usize,
}

#[derive(Args, Debug)]
struct ShowArgs {
    file: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SolverKind {
    /// Built-in DPLL solver, for narrow constraints only
    Sat,

    /// Z3. Requires a build with the `z3` feature
    Z3,
}

impl Default for SolverKind {
    fn default() -> Self {
        if cfg!(feature = "z3") {
            Self::Z3
        } else {
            Self::Sat
        }
    }
}

impl SolverKind {
    fn build(self, max_conflicts: usize) -> anyhow::Result<Box<dyn ConstraintSolver>> {
        match self {
            Self::Sat => Ok(Box::new(SatSolver::with_max_conflicts(
                (max_conflicts > 0).then_some(max_conflicts),
            ))),
            #[cfg(feature = "z3")]
            Self::Z3 => Ok(Box::new(solver::Z3Solver::new())),
            #[cfg(not(feature = "z3"))]
            Self::Z3 => anyhow::bail!("symtest was built without the `z3` feature"),
        }
    }
}

fn main() -> ExitCode {
    initialize_logger();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Explore(args) => explore_command(args),
        Command::Replay(args) => replay_command(args),
        Command::Show(args) => show_command(args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn initialize_logger() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_program(path: &Path) -> anyhow::Result<Program> {
    Program::from_file(path).with_context(|| format!("failed to load program {}", path.display()))
}

fn explore_command(args: ExploreArgs) -> anyhow::Result<ExitCode> {
    let program = load_program(&args.program)?;
    let solver = args.solver.build(args.max_conflicts)?;
    let config = ExplorerConfig {
        max_instructions_per_path: args.max_instructions,
        jobs: args.jobs,
    };

    let output = match &args.output_dir {
        Some(path) => OutputDirectory::create(path),
        None => OutputDirectory::create_next("."),
    }
    .context("failed to create output directory")?;
    tracing::info!(output = %output.path().display(), "writing tests");

    let program_args = [program.name.clone()];
    let mut tests = Vec::new();
    let mut errors = Vec::new();

    let mut exploration = explore(&program, solver, config.clone());
    for result in exploration.by_ref() {
        match result {
            Ok((vector, outcome)) => {
                output
                    .write_test(&vector, &outcome, &program_args)
                    .with_context(|| format!("failed to write {}", vector.file_name()))?;
                tests.push(TestRecord {
                    file: vector.file_name(),
                    exit_status: outcome.exit_status(),
                    outcome,
                });
            }
            Err(err) => {
                tracing::error!("{err}");
                errors.push(err.to_string());
            }
        }
    }

    let stats = exploration.stats();
    let info = RunInfo {
        program: program.name.clone(),
        solver: exploration.solver().name().to_owned(),
        config,
        stats,
        tests,
        errors,
    };
    output
        .write_info(&info)
        .context("failed to write run summary")?;

    println!("output directory = {}", output.path().display());
    println!("completed paths  = {}", stats.completed_paths);
    println!("generated tests  = {}", stats.generated_tests);
    println!("pruned forks     = {}", stats.pruned_forks);
    println!("dropped paths    = {}", stats.dropped_paths);
    println!("failed paths     = {}", stats.failed_paths);

    if info.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn replay_command(args: ReplayArgs) -> anyhow::Result<ExitCode> {
    let program = load_program(&args.program)?;
    let vector = TestVector::load(&args.ktest_file)
        .with_context(|| format!("failed to read {}", args.ktest_file.display()))?;

    let outcome = replay_with_limit(&program, &vector, args.max_instructions)
        .with_context(|| format!("failed to replay {}", args.ktest_file.display()))?;
    let status = outcome.exit_status();
    tracing::info!(%outcome, %status, "replayed {}", args.ktest_file.display());

    println!("{outcome}");
    Ok(ExitCode::from(status.0))
}

fn show_command(args: ShowArgs) -> anyhow::Result<ExitCode> {
    let ktest = KTest::from_file(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let report = KTestReport::new(&ktest, Some(args.file.display().to_string()));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    Ok(ExitCode::SUCCESS)
}
