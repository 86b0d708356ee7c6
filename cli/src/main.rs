//! juripdf CLI - ingest legal PDFs and ask questions about them

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use juripdf::store::{ChunkStore, PdfDirectory, TextSplitter};
use juripdf::{
    validate_input, ColumnOrder, DedupPolicy, Error, IngestOptions, IngestOutcome, IngestState,
    Ingestor, Layout, LayoutDetector, LinguisticModel, QueryEngine, TextNormalizer,
};

/// Word that ends the question loop.
const EXIT_KEYWORD: &str = "exit";

#[derive(Parser)]
#[command(name = "juripdf")]
#[command(version)]
#[command(about = "Ingest legal PDFs and ask questions about them", long_about = None)]
struct Cli {
    /// Working directory holding ingested PDFs
    #[arg(long, global = true, env = "JURIPDF_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Chunk store file
    #[arg(long, global = true, env = "JURIPDF_INDEX", default_value = "index/chunks.jsonl")]
    index: PathBuf,

    /// Directory with stop_words.txt and lemmas.tsv (embedded French model if absent)
    #[arg(long, global = true, env = "JURIPDF_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[arg(long, global = true, default_value_t = juripdf::store::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, global = true, default_value_t = juripdf::store::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Order of normalization and column splitting on dual-column pages
    #[arg(long, global = true, value_enum, default_value = "normalize-then-split")]
    column_order: ColumnOrderArg,

    /// How already-ingested documents are recognised
    #[arg(long, global = true, value_enum, default_value = "file-name")]
    dedup: DedupArg,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest PDF files into the working directory and the index
    Ingest {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Process files in parallel
        #[arg(long)]
        parallel: bool,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the layout of a PDF (simple, double or error)
    Detect {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Normalize text (reads stdin when TEXT is absent)
    Normalize {
        /// Text to normalize
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },

    /// Clear the index and rebuild it from the working directory
    Reindex,

    /// Answer one question from the index
    Ask {
        /// Question
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ColumnOrderArg {
    /// Normalize each page, then split columns
    NormalizeThenSplit,
    /// Split raw page text at column gaps, then normalize
    SplitThenNormalize,
}

impl From<ColumnOrderArg> for ColumnOrder {
    fn from(arg: ColumnOrderArg) -> Self {
        match arg {
            ColumnOrderArg::NormalizeThenSplit => ColumnOrder::NormalizeThenSplit,
            ColumnOrderArg::SplitThenNormalize => ColumnOrder::SplitThenNormalize,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum DedupArg {
    /// Same file name means already ingested
    FileName,
    /// Same content hash means already ingested
    ContentHash,
}

impl From<DedupArg> for DedupPolicy {
    fn from(arg: DedupArg) -> Self {
        match arg {
            DedupArg::FileName => DedupPolicy::FileName,
            DedupArg::ContentHash => DedupPolicy::ContentHash,
        }
    }
}

/// Shared pieces every command builds on.
struct App {
    store: Arc<ChunkStore>,
    ingestor: Ingestor,
}

impl App {
    fn new(cli: &Cli, normalizer: TextNormalizer) -> Result<Self, Box<dyn std::error::Error>> {
        let store = Arc::new(ChunkStore::open(&cli.index, normalizer.clone())?);
        let options = IngestOptions::new()
            .with_data_dir(&cli.data_dir)
            .with_column_order(cli.column_order.into())
            .with_dedup(cli.dedup.into())
            .with_parallel(matches!(
                cli.command,
                Some(Commands::Ingest { parallel: true, .. })
            ));
        let ingestor = Ingestor::new(
            options,
            normalizer,
            Arc::new(TextSplitter::new(cli.chunk_size, cli.chunk_overlap)),
            store.clone(),
        );
        Ok(Self { store, ingestor })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(Commands::Version) = cli.command {
        cmd_version();
        return;
    }

    // Without a linguistic model nothing can be normalized.
    let normalizer = match load_normalizer(cli.model_dir.as_deref()) {
        Ok(normalizer) => normalizer,
        Err(e) => {
            log::error!("Linguistic model failed to load: {}", e);
            eprintln!("{}: {}", "Fatal".red().bold(), e);
            std::process::exit(2);
        }
    };

    let result = match &cli.command {
        Some(Commands::Detect { input }) => cmd_detect(input),
        Some(Commands::Normalize { text }) => cmd_normalize(&normalizer, text.as_deref()),
        _ => App::new(&cli, normalizer).and_then(|app| match &cli.command {
            Some(Commands::Ingest { inputs, json, .. }) => cmd_ingest(&app, inputs, *json),
            Some(Commands::Reindex) => cmd_reindex(&app, &cli.data_dir),
            Some(Commands::Ask { question }) => cmd_ask(&app, question),
            _ => cmd_session(&app),
        }),
    };

    if let Err(e) = result {
        log::debug!("Command failed: {:?}", e);
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_normalizer(model_dir: Option<&Path>) -> juripdf::Result<TextNormalizer> {
    let model = match model_dir {
        Some(dir) => LinguisticModel::load_dir(dir)?,
        None => LinguisticModel::french()?,
    };
    Ok(TextNormalizer::new(Arc::new(model)))
}

/// Interactive session: one document, then questions until the exit keyword.
fn cmd_session(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    log::info!("Session started");

    let outcome = choose_document(
        || prompt("PDF file path:"),
        |path| ingest_with_spinner(&app.ingestor, path),
    )?;
    let Some(outcome) = outcome else {
        log::info!("No document chosen, session ended");
        return Ok(());
    };
    print_outcome(&outcome);

    println!(
        "\n{} (type '{}' to quit)",
        "Ask your questions".cyan().bold(),
        EXIT_KEYWORD
    );
    let mut asked_count = 0usize;
    loop {
        let Some(question) = prompt("?")? else {
            break;
        };
        if question.is_empty() {
            eprintln!("{}", "Please type a question.".yellow());
            continue;
        }
        if is_exit(&question) {
            break;
        }
        let asked = Instant::now();
        match app.store.answer_query(&question) {
            Ok(answer) => println!("\n{}\n", answer),
            Err(e) => {
                log::warn!("Question failed: {}", e);
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
        }
        asked_count += 1;
        log::info!("Answered in {:.2} s", asked.elapsed().as_secs_f64());
        println!(
            "{}",
            format!("Answered in {:.2} s", asked.elapsed().as_secs_f64()).dimmed()
        );
    }

    log::info!(
        "Session ended after {} questions in {:.2} s",
        asked_count,
        started.elapsed().as_secs_f64()
    );
    println!(
        "{} {:.2} s",
        "Session time:".green(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Ask for paths until one is accepted and ingested. Invalid paths and
/// ingestion refusals (such as a name clash) ask again; `None` at end of
/// input.
fn choose_document<R, I>(
    mut read_path: R,
    mut ingest: I,
) -> Result<Option<IngestOutcome>, Box<dyn std::error::Error>>
where
    R: FnMut() -> io::Result<Option<String>>,
    I: FnMut(&Path) -> juripdf::Result<IngestOutcome>,
{
    loop {
        let Some(line) = read_path()? else {
            return Ok(None);
        };
        if let Err(e) = validate_input(&line) {
            eprintln!("{} {}", "✗".red(), e);
            continue;
        }
        match ingest(Path::new(&line)) {
            Ok(outcome) => {
                log::info!("{} ingested: {}", outcome.file_name, outcome.state);
                return Ok(Some(outcome));
            }
            Err(Error::InputValidation(msg)) => {
                log::warn!("{} refused: {}", line, msg);
                eprintln!("{} {}", "✗".red(), msg);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn cmd_ingest(app: &App, inputs: &[PathBuf], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Ingesting {} files", inputs.len());
    let outcomes: Vec<IngestOutcome> = if inputs.len() == 1 {
        vec![ingest_with_spinner(&app.ingestor, &inputs[0])?]
    } else {
        let mut outcomes = Vec::new();
        for (input, result) in inputs.iter().zip(app.ingestor.ingest_many(inputs)) {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    log::warn!("{} not ingested: {}", input.display(), e);
                    eprintln!("{} {}: {}", "✗".red(), input.display(), e);
                }
            }
        }
        outcomes
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            print_outcome(outcome);
        }
    }
    Ok(())
}

fn cmd_detect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match LayoutDetector::new().detect(input) {
        Layout::Error(msg) => Err(msg.into()),
        layout => {
            println!("{}", layout);
            Ok(())
        }
    }
}

fn cmd_normalize(
    normalizer: &TextNormalizer,
    text: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match text {
        Some(text) => text.to_string(),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    println!("{}", normalizer.normalize(&text));
    Ok(())
}

fn cmd_reindex(app: &App, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    log::info!("Re-indexing {}", data_dir.display());
    let outcomes = app.ingestor.reindex(&PdfDirectory::new(data_dir))?;
    for outcome in &outcomes {
        print_outcome(outcome);
    }
    let indexed = outcomes.iter().filter(|o| o.is_indexed()).count();
    println!(
        "\n{} {} of {} documents in {:.2} s",
        "Re-indexed".green().bold(),
        indexed,
        outcomes.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn cmd_ask(app: &App, question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let answer = app.store.answer_query(question)?;
    log::info!("Answered in {:.2} s", started.elapsed().as_secs_f64());
    println!("{}", answer);
    println!(
        "{}",
        format!("Answered in {:.2} s", started.elapsed().as_secs_f64()).dimmed()
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "juripdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Legal PDF ingestion and question answering");
    println!();
    println!("License: MIT");
}

fn ingest_with_spinner(ingestor: &Ingestor, path: &Path) -> juripdf::Result<IngestOutcome> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Ingesting {}...", path.display()));
    let result = ingestor.ingest(path);
    pb.finish_and_clear();
    result
}

fn print_outcome(outcome: &IngestOutcome) {
    let state = match outcome.state {
        IngestState::Indexed => outcome.state.to_string().green().bold(),
        IngestState::SkippedDuplicate => outcome.state.to_string().yellow().bold(),
        IngestState::Failed => outcome.state.to_string().red().bold(),
        _ => outcome.state.to_string().yellow(),
    };
    println!("{} {}", outcome.file_name.bold(), state);
    if let Some(layout) = &outcome.layout {
        println!("  {} layout: {}", "├─".dimmed(), layout);
    }
    if outcome.chunks_total > 0 {
        println!(
            "  {} chunks: {} of {} indexed",
            "├─".dimmed(),
            outcome.chunks_indexed,
            outcome.chunks_total
        );
    }
    if let Some(error) = &outcome.error {
        println!("  {} {}", "└─".dimmed(), error.red());
    }
}

/// Print a label and read one trimmed line; `None` at end of input.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{} ", label.cyan().bold());
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_exit(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(EXIT_KEYWORD)
}
