use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use faqdesk_backlog::{BacklogFilter, DeskDb};
use faqdesk_core::{BacklogItem, BacklogStatus, FaqConfig, FaqError, OutputFormat, Priority};
use faqdesk_mcp::desk::AnswerResponse;
use faqdesk_mcp::FaqDesk;

const DEFAULT_CONFIG_PATH: &str = ".faqdesk.toml";

#[derive(Parser)]
#[command(
    name = "faqdesk",
    version,
    about = "FAQ answering desk with a triaged backlog",
    long_about = "faqdesk answers questions from a directory of Q:/A: text files and records\n\
                   everything it cannot answer in a deduplicated, prioritized review backlog.\n\n\
                   Examples:\n  \
                     faqdesk ask 'How do I reset my password?'   Answer one question\n  \
                     faqdesk files                               List loaded FAQ files\n  \
                     faqdesk backlog list --status pending       Show open questions\n  \
                     faqdesk backlog resolve <id>                Mark a question answered\n  \
                     faqdesk stats                               Interaction success rates\n  \
                     faqdesk mcp                                 Serve the desk over MCP stdio"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .faqdesk.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summaries (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question from the knowledge base
    #[command(long_about = "Answer a question from the knowledge base.\n\n\
        Every FAQ file is scored against the question; the best file above the\n\
        answer threshold supplies the answer. Otherwise the question is merged\n\
        into (or added to) the review backlog.\n\n\
        Examples:\n  faqdesk ask 'Do you ship to Canada?'\n  faqdesk ask 'reset password' --format json")]
    Ask {
        /// The question, in free text
        query: String,
    },
    /// List loaded FAQ files with their question counts
    Files,
    /// Re-read the knowledge directory and report what it contains
    #[command(long_about = "Re-read the knowledge directory and report what it contains.\n\n\
        Use this to check FAQ edits before a running `faqdesk mcp` server picks\n\
        them up through its reload_faq_content tool.")]
    Reload,
    /// Inspect and work the review backlog
    Backlog {
        #[command(subcommand)]
        action: BacklogCommand,
    },
    /// Show interaction totals and per-file success rates
    Stats {
        /// Also show the most recent interactions
        #[arg(long, default_value = "0")]
        recent: usize,
    },
    /// Start MCP server on stdio
    #[command(long_about = "Start an MCP (Model Context Protocol) server on stdio.\n\n\
        Exposes answer_faq, list_faq_files, reload_faq_content,\n\
        get_analytics_summary, and list_backlog to MCP clients.\n\n\
        Example config for Claude Desktop:\n  \
        {\"mcpServers\": {\"faqdesk\": {\"command\": \"faqdesk\", \"args\": [\"mcp\"]}}}")]
    Mcp,
    /// Create a default .faqdesk.toml configuration file
    Init,
    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum BacklogCommand {
    /// List backlog items, most frequently asked first
    List {
        /// Only items in this status (pending, in_progress, answered, rejected)
        #[arg(long)]
        status: Option<BacklogStatus>,

        /// Maximum items to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Assign an item to someone and move it to in_progress
    Assign {
        /// Backlog item id
        id: Uuid,
        /// Who is working on it
        assignee: String,
    },
    /// Mark an in-progress item as answered
    Resolve {
        /// Backlog item id
        id: Uuid,
    },
    /// Reject an open item
    Reject {
        /// Backlog item id
        id: Uuid,
    },
    /// Override an item's priority
    Priority {
        /// Backlog item id
        id: Uuid,
        /// low, medium, high, or urgent
        priority: Priority,
    },
    /// Override an item's category
    Category {
        /// Backlog item id
        id: Uuid,
        /// New category label
        category: String,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mfaqdesk\x1b[0m v{version}: answers from your FAQ, a backlog for the rest\n");

        println!("Quick start:");
        println!("  \x1b[36mfaqdesk init\x1b[0m                  Create a .faqdesk.toml config file");
        println!("  \x1b[36mfaqdesk ask 'question'\x1b[0m        Answer a question");
        println!("  \x1b[36mfaqdesk backlog list\x1b[0m          See what users asked that the FAQ missed\n");

        println!("All commands:");
        println!("  \x1b[32mask\x1b[0m       Answer a question or defer it to the backlog");
        println!("  \x1b[32mfiles\x1b[0m     List loaded FAQ files");
        println!("  \x1b[32mreload\x1b[0m    Re-read the FAQ directory");
        println!("  \x1b[32mbacklog\x1b[0m   List, assign, resolve, and reject open questions");
        println!("  \x1b[32mstats\x1b[0m     Interaction totals and success rates");
        println!("  \x1b[32mmcp\x1b[0m       Start MCP server for assistant integration");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("faqdesk v{version}: answers from your FAQ, a backlog for the rest\n");

        println!("Quick start:");
        println!("  faqdesk init                  Create a .faqdesk.toml config file");
        println!("  faqdesk ask 'question'        Answer a question");
        println!("  faqdesk backlog list          See what users asked that the FAQ missed\n");

        println!("All commands:");
        println!("  ask       Answer a question or defer it to the backlog");
        println!("  files     List loaded FAQ files");
        println!("  reload    Re-read the FAQ directory");
        println!("  backlog   List, assign, resolve, and reject open questions");
        println!("  stats     Interaction totals and success rates");
        println!("  mcp       Start MCP server for assistant integration");
        println!("  init      Create default configuration\n");
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "faqdesk=debug" } else { "faqdesk=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // stdout carries command output and the MCP transport
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<FaqConfig> {
    let config = match path {
        Some(path) => FaqConfig::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                FaqConfig::from_file(default_path)?
            } else {
                FaqConfig::default()
            }
        }
    };
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(FaqError::from)?;
    println!("{json}");
    Ok(())
}

fn print_item_line(item: &BacklogItem) {
    println!(
        "{}  x{:<3} {:<8} {:<12} {:<20} {}",
        item.id,
        item.frequency,
        item.priority,
        item.status,
        item.category,
        item.raw_text,
    );
}

fn print_item(item: &BacklogItem, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(item)?,
        OutputFormat::Text => {
            print_item_line(item);
            if let Some(assignee) = &item.assignee {
                println!("  assigned to {assignee}");
            }
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# faqdesk configuration

[knowledge]
# Directory of FAQ files; only its top level is read
# directory = "faq"
# extension = "txt"

[matching]
# A file must score strictly above answer_threshold to be answered
# answer_threshold = 0.5
# high_relevance = 0.8
# medium_relevance = 0.6
# Added when the whole query appears verbatim in a file
# phrase_bonus = 0.3

[backlog]
# Word-set similarity above which a question merges into an open item
# similarity_threshold = 0.7
# database = ".faqdesk/desk.db"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    let command = match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Init) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                miette::bail!("{DEFAULT_CONFIG_PATH} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {DEFAULT_CONFIG_PATH} with default configuration");
            return Ok(());
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "faqdesk", &mut std::io::stdout());
            return Ok(());
        }
        Some(command) => command,
    };

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(
        directory = %config.knowledge.directory.display(),
        database = %config.backlog.database.display(),
        format = %cli.format,
        "loaded configuration"
    );

    match command {
        Command::Ask { query } => {
            let desk = FaqDesk::open(&config)?;
            let response = desk.answer(&query)?;
            match cli.format {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Text => match response {
                    AnswerResponse::Success {
                        answer,
                        source_file,
                        relevance,
                        score,
                        ..
                    } => {
                        println!("{answer}\n");
                        println!("Source: {source_file} ({relevance} relevance, score {score:.2})");
                    }
                    AnswerResponse::NoAnswer {
                        message,
                        reasoning,
                        backlog,
                        ..
                    } => {
                        println!("{message}\n");
                        println!("{reasoning}");
                        let verb = if backlog.merged { "Merged into" } else { "Added" };
                        println!(
                            "{verb} backlog item {} (asked {} time(s))",
                            backlog.id, backlog.frequency
                        );
                    }
                },
            }
        }
        Command::Files => {
            let desk = FaqDesk::open(&config)?;
            let listing = desk.list_files();
            match cli.format {
                OutputFormat::Json => print_json(&listing)?,
                OutputFormat::Text => {
                    println!(
                        "{} file(s), {} question(s) in {}",
                        listing.total_files,
                        listing.total_qa_pairs,
                        config.knowledge.directory.display()
                    );
                    for file in &listing.files {
                        println!("  {:<32} {:>4}  {}", file.filename, file.qa_count, file.category);
                    }
                }
            }
        }
        Command::Reload => {
            let kb = faqdesk_kb::load_directory(&config.knowledge)?;
            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "filesLoaded": kb.len(),
                    "totalQaPairs": kb.total_entries(),
                    "loadedAt": kb.loaded_at,
                }))?,
                OutputFormat::Text => println!(
                    "Loaded {} FAQ file(s) with {} question(s) from {}",
                    kb.len(),
                    kb.total_entries(),
                    config.knowledge.directory.display()
                ),
            }
        }
        Command::Backlog { action } => {
            let db = DeskDb::open(&config.backlog.database)?;
            match action {
                BacklogCommand::List { status, limit } => {
                    let items = db.list_backlog(&BacklogFilter { status, limit })?;
                    match cli.format {
                        OutputFormat::Json => print_json(&items)?,
                        OutputFormat::Text => {
                            if items.is_empty() {
                                println!("Backlog is empty.");
                            }
                            for item in &items {
                                print_item_line(item);
                            }
                        }
                    }
                }
                BacklogCommand::Assign { id, assignee } => {
                    print_item(&db.assign(id, &assignee)?, cli.format)?;
                }
                BacklogCommand::Resolve { id } => {
                    print_item(&db.resolve(id)?, cli.format)?;
                }
                BacklogCommand::Reject { id } => {
                    print_item(&db.reject(id)?, cli.format)?;
                }
                BacklogCommand::Priority { id, priority } => {
                    print_item(&db.set_priority(id, priority)?, cli.format)?;
                }
                BacklogCommand::Category { id, category } => {
                    print_item(&db.set_category(id, &category)?, cli.format)?;
                }
            }
        }
        Command::Stats { recent } => {
            let db = DeskDb::open(&config.backlog.database)?;
            let summary = db.analytics_summary()?;
            let files = db.file_stats(None)?;
            let interactions = if recent > 0 {
                db.recent_interactions(recent)?
            } else {
                Vec::new()
            };

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "summary": summary,
                    "files": files,
                    "recent": interactions,
                }))?,
                OutputFormat::Text => {
                    println!(
                        "{} interaction(s), {} answered ({:.2}%), {} pending question(s)",
                        summary.total_interactions,
                        summary.successful_interactions,
                        summary.success_rate,
                        summary.pending_questions,
                    );
                    if !files.is_empty() {
                        println!("\nPer file:");
                        for stat in &files {
                            println!(
                                "  {}  {:<32} {:>5}/{:<5} {:>6.2}%",
                                stat.day,
                                stat.file_name,
                                stat.successful_queries,
                                stat.total_queries,
                                stat.success_rate,
                            );
                        }
                    }
                    if !interactions.is_empty() {
                        println!("\nRecent:");
                        for record in &interactions {
                            println!(
                                "  {}  {:<9} {}",
                                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                                record.status.as_str(),
                                record.query_text,
                            );
                        }
                    }
                }
            }
        }
        Command::Mcp => {
            faqdesk_mcp::server::run_server(config).await?;
        }
        Command::Init | Command::Completions { .. } => unreachable!(),
    }

    Ok(())
}
