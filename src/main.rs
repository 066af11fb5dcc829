use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use redirect_matchmaker::domain::common_columns;
use redirect_matchmaker::models::config::Settings;
use redirect_matchmaker::processing::{FastEmbedProvider, Matcher};
use redirect_matchmaker::repository::{CsvRepository, DatasetReader, MatchWriter, OutputFormat};

/// Map URLs of an old site to their closest counterpart on a new site.
#[derive(Parser, Debug)]
#[command(name = "redirect-matchmaker", version, about)]
struct Cli {
    /// Crawl export of the site being retired.
    #[arg(long)]
    origin: PathBuf,

    /// Crawl export of the new site.
    #[arg(long)]
    destination: PathBuf,

    /// Columns to match on, in order. Defaults to `matching.columns` from the config.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// YAML settings file.
    #[arg(long, env = "MATCHMAKER_CONFIG")]
    config: Option<PathBuf>,

    /// Write the result table here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Print the columns both exports share and exit.
    #[arg(long)]
    list_columns: bool,
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load settings: {e}");
            std::process::exit(1);
        }
    };
    if settings.embedding.hf_token.is_none() {
        settings.embedding.hf_token = std::env::var("HF_TOKEN").ok();
    }

    let repo = CsvRepository::new(settings.matching.url_column.as_str());
    let (origin, destination) = match (
        repo.read_dataset(&cli.origin),
        repo.read_dataset(&cli.destination),
    ) {
        (Ok(origin), Ok(destination)) => (origin, destination),
        (Err(e), _) => {
            log::error!("Failed to read {}: {e}", cli.origin.display());
            std::process::exit(1);
        }
        (_, Err(e)) => {
            log::error!("Failed to read {}: {e}", cli.destination.display());
            std::process::exit(1);
        }
    };

    let shared = common_columns(&origin, &destination);
    if cli.list_columns {
        for column in shared {
            println!("{column}");
        }
        return;
    }

    let columns = if cli.columns.is_empty() {
        settings.matching.columns.clone()
    } else {
        cli.columns.clone()
    };
    if columns.is_empty() {
        log::error!("No columns selected; shared columns are: {}", shared.join(", "));
        std::process::exit(1);
    }

    let mut embedder = match FastEmbedProvider::load(&settings.embedding) {
        Ok(embedder) => embedder,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let report = match Matcher::new(&mut embedder)
        .with_low_similarity_threshold(settings.matching.low_similarity_threshold)
        .run(&origin, &destination, &columns)
    {
        Ok(report) => report,
        Err(e) => {
            log::error!("Matching failed: {e}");
            std::process::exit(1);
        }
    };

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => {
                log::error!("Failed to create {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Box::new(io::stdout().lock()),
    };

    if let Err(e) = repo.write_matches(writer.as_mut(), &report.matches, cli.format) {
        log::error!("Failed to write matches: {e}");
        std::process::exit(1);
    }
    if let Err(e) = writer.flush() {
        log::error!("Failed to flush output: {e}");
        std::process::exit(1);
    }
}
