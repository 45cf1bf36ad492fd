mod server;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mi_core::{EmptyContext, extract_modified_files, render_memory_section};
use mi_store::{ContextEngine, resolve_root};
use rmcp::service::ServerInitializeError;
use rmcp::{ServiceExt, transport::stdio};

#[derive(Parser)]
#[command(name = "mi", about = "Inject project manuals and memory into model prompts")]
struct Cli {
    /// Project root holding manuals/ and memory/ (defaults to $MI_ROOT, then the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Print the manuals that match a task
    Context {
        /// Task description
        task: String,

        /// File paths the task touches
        paths: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the full system prompt and user message for a task
    Prompt {
        /// Task description
        task: String,

        /// File paths the task touches
        paths: Vec<String>,

        /// Agent issuing the task
        #[arg(long)]
        agent: Option<String>,
    },

    /// List catalog entries, or print one manual
    Manuals {
        /// Print the content of the manual with this name
        #[arg(long)]
        show: Option<String>,
    },

    /// Read or update project memory
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },

    /// Extract MODIFIED_FILES from a model response
    ModifiedFiles {
        /// Response file (reads stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MemoryCommands {
    /// Print the memory section as injected into prompts
    Show,

    /// Overwrite a memory field (plan, notes, checklist)
    Save {
        /// Field name
        field: String,

        /// Content file (reads stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Append a dated entry to the notes
    AppendNotes {
        /// Entry text
        entry: String,
    },
}

fn open_engine(cli: &Cli) -> Result<ContextEngine> {
    let root = resolve_root(cli.root.as_deref());
    ContextEngine::open(&root)
        .with_context(|| format!("failed to open project at {}", root.display()))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        Commands::Context { task, paths, json } => cmd_context(&cli, task, paths, *json).await,
        Commands::Prompt { task, paths, agent } => {
            cmd_prompt(&cli, task, paths, agent.as_deref()).await
        }
        Commands::Manuals { show } => cmd_manuals(&cli, show.as_deref()).await,
        Commands::Memory { command } => match command {
            MemoryCommands::Show => cmd_memory_show(&cli).await,
            MemoryCommands::Save { field, file } => {
                cmd_memory_save(&cli, field, file.as_deref()).await
            }
            MemoryCommands::AppendNotes { entry } => cmd_append_notes(&cli, entry).await,
        },
        Commands::ModifiedFiles { file } => cmd_modified_files(file.as_deref()),
    }
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let engine = open_engine(cli)?;
    tracing::info!(
        manuals = %engine.config().manuals_dir.display(),
        "starting MCP server"
    );

    let server = server::MiServer::new(engine);
    let service = match server.serve(stdio()).await {
        Ok(service) => service,
        Err(ServerInitializeError::ConnectionClosed(_)) => {
            tracing::info!("stdin closed before initialization");
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to start MCP server"),
    };

    tokio::select! {
        res = service.waiting() => {
            res.context("MCP server terminated abnormally")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn cmd_context(cli: &Cli, task: &str, paths: &[String], json: bool) -> Result<()> {
    let engine = open_engine(cli)?;
    let result = engine
        .select_and_assemble_with(task, paths, EmptyContext::Sentinel)
        .await
        .context("failed to build context")?;

    if json {
        let out = serde_json::json!({
            "context_prefix": result.prompt_prefix,
            "matched_manuals": result.matched_names,
            "warnings": result.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let rule = "═".repeat(60);
    let matched = if result.matched_names.is_empty() {
        "none".to_string()
    } else {
        result.matched_names.join(", ")
    };
    println!("{rule}");
    println!("MATCHED MANUALS: {matched}");
    println!("{rule}");
    println!();
    println!("{}", result.prompt_prefix);

    if cli.verbose {
        for warning in &result.warnings {
            eprintln!("--- warning: {warning} ---");
        }
    }
    Ok(())
}

async fn cmd_prompt(cli: &Cli, task: &str, paths: &[String], agent: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;
    let prepared = engine
        .prepare_prompt(task, paths, agent)
        .await
        .context("failed to build prompt")?;

    println!("=== SYSTEM ===");
    println!("{}", prepared.system_prompt);
    println!("=== USER ===");
    println!("{}", prepared.user_message);

    if cli.verbose {
        eprintln!("--- matched: {} ---", prepared.matched_names.join(", "));
        eprintln!("--- warnings: {} ---", prepared.warnings.len());
    }
    Ok(())
}

async fn cmd_manuals(cli: &Cli, show: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;
    let manuals = engine
        .list_manuals()
        .await
        .context("failed to list manuals")?;

    if let Some(name) = show {
        let manual = manuals
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("no manual named '{name}' in catalog"))?;
        if !manual.available {
            anyhow::bail!("manual '{}' ({}) could not be read", manual.name, manual.file);
        }
        println!("{}", manual.content);
        return Ok(());
    }

    if manuals.is_empty() {
        println!("(no manuals in catalog)");
        return Ok(());
    }

    for manual in &manuals {
        let size = if manual.available {
            format!("{} bytes", manual.content.len())
        } else {
            "missing".to_string()
        };
        println!(
            "{:<24} {:<28} {:<10} [{}]",
            manual.name,
            manual.file,
            size,
            manual.keywords.join(", ")
        );
    }
    Ok(())
}

async fn cmd_memory_show(cli: &Cli) -> Result<()> {
    let engine = open_engine(cli)?;
    let state = engine.load_memory_state().await;
    println!("{}", render_memory_section(&state));
    Ok(())
}

async fn cmd_memory_save(cli: &Cli, field: &str, file: Option<&Path>) -> Result<()> {
    let engine = open_engine(cli)?;
    // reject bad names before waiting on stdin
    field
        .parse::<mi_core::MemoryField>()
        .context("failed to save memory field")?;
    let content = read_input(file)?;
    engine
        .save_memory_field(field, &content)
        .await
        .context("failed to save memory field")?;

    println!("saved {field} ({} bytes)", content.len());
    Ok(())
}

async fn cmd_append_notes(cli: &Cli, entry: &str) -> Result<()> {
    let engine = open_engine(cli)?;
    engine
        .append_notes(entry)
        .await
        .context("failed to append notes")?;

    println!("appended to notes");
    Ok(())
}

fn cmd_modified_files(file: Option<&Path>) -> Result<()> {
    let response = read_input(file)?;
    let files = extract_modified_files(&response);

    if files.is_empty() {
        println!("(no modified files found)");
    } else {
        for file in files {
            println!("{file}");
        }
    }
    Ok(())
}
