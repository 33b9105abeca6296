use std::io;
use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use bayou_evidence::EvidenceRequest;
use bayou_protocol::DEFAULT_MAX_FRAME_BYTES;
use bayou_search::model::CorpusPredictor;
use bayou_search::SamplingSearch;
use bayou_server::extract::{self, ExtractOptions, DEFAULT_MAX_SEQS, DEFAULT_MAX_SEQ_LENGTH};
use bayou_server::logging::{self, LogOptions};
use bayou_server::settings::{self, SearchOverrides, DEFAULT_BIND};
use bayou_server::{client, serve, shutdown_on, ServerOptions, SynthesisEngine};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "bayou")]
#[command(about = "Synthesize program ASTs from API, type and context evidence", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve length-prefixed evidence requests over TCP
    Serve(ServeArgs),

    /// Send one evidence request to a running server
    Query(QueryArgs),

    /// Run a single search in-process and print the response
    Infer(InferArgs),

    /// Derive evidence for every program of a driver dump
    #[command(name = "extract-evidence")]
    ExtractEvidence(ExtractArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Model directory holding config.json and corpus.json
    #[arg(long)]
    save_dir: PathBuf,

    /// Seed for the predictor's sampler
    #[arg(long)]
    seed: Option<u64>,

    /// Upper bound on predictor draws per request
    #[arg(long)]
    max_draws: Option<usize>,

    /// Stop once the top AST leads the runner-up by this many draws
    #[arg(long)]
    gap_threshold: Option<u32>,

    /// Number of ranked ASTs considered for the response
    #[arg(long)]
    top_k: Option<usize>,
}

impl SearchArgs {
    fn overrides(&self) -> SearchOverrides {
        SearchOverrides {
            max_draws: self.max_draws,
            gap_threshold: self.gap_threshold,
            top_k: self.top_k,
        }
    }
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Write logs to <DIR>/ast_server.log instead of stderr
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[derive(Args)]
struct QueryArgs {
    /// Server address
    #[arg(long, default_value = DEFAULT_BIND)]
    addr: String,

    /// Evidence as a JSON object
    evidence: String,
}

#[derive(Args)]
struct InferArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Evidence as a JSON object
    evidence: String,
}

#[derive(Args)]
struct ExtractArgs {
    /// Driver output: {"programs": [{"sequences": [{"calls": [...]}], ...}]}
    input: PathBuf,

    /// Where to write the programs with evidence attached
    output: PathBuf,

    /// Skip programs with more sequences than this
    #[arg(long, default_value_t = DEFAULT_MAX_SEQS)]
    max_seqs: usize,

    /// Skip programs with any sequence longer than this
    #[arg(long, default_value_t = DEFAULT_MAX_SEQ_LENGTH)]
    max_seq_length: usize,

    /// Random evidence subsets per program (0 keeps the full evidence)
    #[arg(long, default_value_t = 0)]
    num_samples: usize,

    /// Seed for evidence subsampling
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logs_dir = match &cli.command {
        Commands::Serve(args) => args.logs_dir.clone(),
        _ => None,
    };
    logging::init(&LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        logs_dir,
    })?;

    match cli.command {
        Commands::Serve(args) => run_serve(args).await?,
        Commands::Query(args) => run_query(args).await?,
        Commands::Infer(args) => run_infer(args).await?,
        Commands::ExtractEvidence(args) => run_extract(args).await?,
    }

    Ok(())
}

async fn load_engine(args: &SearchArgs) -> Result<SynthesisEngine<CorpusPredictor>> {
    let config = settings::resolve_search_config(&args.save_dir, &args.overrides())?;
    let search = SamplingSearch::new(config)?;

    let save_dir = args.save_dir.clone();
    let seed = args.seed;
    let predictor = tokio::task::spawn_blocking(move || CorpusPredictor::load(&save_dir, seed))
        .await
        .context("model loader panicked")?
        .context("Failed to load model")?;
    Ok(SynthesisEngine::new(predictor, search))
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    // Refuse an unsafe bind before spending time on the model.
    let addr = settings::listen_addr(&args.bind, args.public).await?;

    let engine = load_engine(&args.search).await?;
    let options = ServerOptions {
        io_timeout: settings::io_timeout(),
        max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    log::info!("AST server listening on {}", listener.local_addr()?);

    let shutdown_rx = shutdown_on(tokio::signal::ctrl_c());
    serve(listener, engine, options, shutdown_rx).await
}

async fn run_query(args: QueryArgs) -> Result<()> {
    let response = client::query(&args.addr, &args.evidence, settings::io_timeout()).await?;
    print_stdout(&response)
}

async fn run_infer(args: InferArgs) -> Result<()> {
    let request = EvidenceRequest::from_json_str(&args.evidence).context("invalid evidence")?;
    let engine = load_engine(&args.search).await?;
    let response = tokio::task::spawn_blocking(move || engine.generate(&request))
        .await
        .context("search worker panicked")??;
    print_stdout(&response.to_json_pretty()?)
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let options = ExtractOptions {
        max_seqs: args.max_seqs,
        max_seq_length: args.max_seq_length,
        num_samples: args.num_samples,
        seed: args.seed,
    };
    tokio::task::spawn_blocking(move || {
        extract::extract_evidence_file(&args.input, &args.output, &options)
    })
    .await
    .context("extraction worker panicked")?
}

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}
