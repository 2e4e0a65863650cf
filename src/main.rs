use animalpedia::{
    Animalpedia, Attachment, Catalog, CatalogFilter, Conversation, Diet, GeminiConfig, IucnStatus,
    Lookup, MockProvider, QuizCategory, Region, SpiritAnswers, StreamEvent, spawn_events,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, stdin, stdout};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "animalpedia", version, about = "Ask the Animalpedia content layer")]
struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, default_value = animalpedia::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, default_value = animalpedia::DEFAULT_BASE_URL)]
    base_url: String,

    /// Answer from an in-memory provider instead of the network
    #[arg(long)]
    offline: bool,

    /// Catalog JSON file; the bundled catalog is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a surprising animal fact
    Fact,
    /// Generate a quiz question
    Quiz {
        /// general, diet or habitat
        #[arg(short, long, default_value = "general")]
        category: QuizCategory,
    },
    /// Chat on stdin, one question per line
    Chat {
        /// Slug of the catalog animal to talk about
        #[arg(long, conflicts_with = "page")]
        animal: Option<String>,
        /// Page id the site assistant should assume
        #[arg(long, default_value = "explore")]
        page: String,
    },
    /// Identify an animal from an audio recording
    IdentifySound { file: PathBuf },
    /// Identify an animal from a photo
    IdentifyImage { file: PathBuf },
    /// Describe the sounds an animal makes
    Sounds { animal: String },
    /// Look an animal up and add it to the catalog
    Lookup { name: String },
    /// List catalog entries matching the filters
    Browse {
        /// Name substring
        term: Option<String>,
        #[arg(long, value_parser = label::<Diet>)]
        diet: Option<Diet>,
        #[arg(long, value_parser = label::<IucnStatus>)]
        status: Option<IucnStatus>,
        #[arg(long, value_parser = label::<Region>)]
        region: Option<Region>,
    },
    /// Imagine an animal as a human
    Persona { animal: String },
    /// Find a spirit animal from four answers
    Spirit {
        #[arg(long)]
        vacation: String,
        #[arg(long)]
        social: String,
        #[arg(long)]
        hobby: String,
        #[arg(long)]
        time: String,
    },
}

/// Parse a display label such as `North America` into its enum.
fn label<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn client(cli: &Cli) -> anyhow::Result<Animalpedia> {
    if cli.offline {
        return Ok(Animalpedia::new(Arc::new(MockProvider::default()))?);
    }
    let key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("API_KEY").ok())
        .context("no API key; set GEMINI_API_KEY or pass --offline")?;
    let config = GeminiConfig::new(key)?
        .with_model(cli.model.clone())
        .with_base_url(&cli.base_url)?;
    Ok(Animalpedia::gemini(config)?)
}

async fn catalog(path: Option<&PathBuf>) -> anyhow::Result<Catalog> {
    Ok(match path {
        Some(path) => Catalog::load(path).await?,
        None => Catalog::bundled()?,
    })
}

async fn attachment(path: &PathBuf) -> anyhow::Result<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(Attachment::from_bytes(mime.essence_str(), &bytes))
}

/// Final reply text still to print, or `None` when streaming already showed it.
fn unstreamed<'a>(streamed: &str, reply: &'a str) -> Option<&'a str> {
    (reply != streamed).then_some(reply)
}

async fn chat(conversation: Conversation) -> anyhow::Result<()> {
    let mut out = stdout();
    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (mut events, _task) = spawn_events(conversation.submit(&line)?);
        let mut streamed = String::new();
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Partial(snapshot) => {
                    out.write_all(snapshot.text[streamed.len()..].as_bytes())
                        .await?;
                    out.flush().await?;
                    streamed = snapshot.text;
                }
                StreamEvent::Completed(reply) => {
                    if let Some(text) = unstreamed(&streamed, &reply.content) {
                        if !streamed.is_empty() {
                            out.write_all(b"\n").await?;
                        }
                        out.write_all(text.as_bytes()).await?;
                    }
                    out.write_all(b"\n").await?;
                    for source in reply.sources.iter().flatten() {
                        out.write_all(format!("  [{}] {}\n", source.title, source.uri).as_bytes())
                            .await?;
                    }
                }
            }
        }
        out.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let app = client(&cli)?;

    match &cli.command {
        Command::Fact => println!("{}", app.daily_fact().await),
        Command::Quiz { category } => {
            let question = app.quiz_question(*category).await;
            println!("{}", serde_json::to_string_pretty(&question)?);
        }
        Command::Chat { animal, page } => {
            let conversation = match animal {
                Some(slug) => {
                    let catalog = catalog(cli.catalog.as_ref()).await?;
                    let entry = catalog
                        .get(slug)
                        .with_context(|| format!("no animal `{slug}` in the catalog"))?;
                    Conversation::about_animal(app.clone(), entry)
                }
                None => {
                    println!("{}", animalpedia::fallback::GLOBAL_GREETING);
                    Conversation::site_assistant(app.clone(), page.clone())
                }
            };
            chat(conversation).await?;
        }
        Command::IdentifySound { file } => {
            let result = app.identify_sound(&attachment(file).await?).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::IdentifyImage { file } => {
            let result = app.identify_image(&attachment(file).await?).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Sounds { animal } => println!("{}", app.sound_description(animal).await?),
        Command::Lookup { name } => {
            let mut catalog = catalog(cli.catalog.as_ref()).await?;
            match app.discover(&mut catalog, name).await? {
                Lookup::Found(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                Lookup::NotFound { message, .. } => println!("{message}"),
            }
        }
        Command::Browse {
            term,
            diet,
            status,
            region,
        } => {
            let catalog = catalog(cli.catalog.as_ref()).await?;
            let filter = CatalogFilter {
                name: term.clone(),
                diet: *diet,
                status: *status,
                region: *region,
            };
            for entry in catalog.filter(&filter) {
                println!("{}\t{}\t{}", entry.id, entry.name, entry.iucn_status);
            }
        }
        Command::Persona { animal } => println!("{}", app.persona(animal).await?.text),
        Command::Spirit {
            vacation,
            social,
            hobby,
            time,
        } => {
            let answers = SpiritAnswers {
                vacation: vacation.clone(),
                social: social.clone(),
                hobby: hobby.clone(),
                time: time.clone(),
            };
            let spirit = app.spirit(&answers).await?;
            println!("{}", serde_json::to_string_pretty(&spirit)?);
        }
    }
    Ok(())
}
