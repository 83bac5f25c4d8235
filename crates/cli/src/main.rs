use anyhow::{Context, Result};
use carve_context::ContextBuilder;
use carve_gateway::{
    apply_write_file, write_file_tool, ConcurrencyGate, InvocationCache, InvokeArgs, Invoker,
    ProviderKind, ToolSpec, WRITE_FILE_TOOL_NAME,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

mod config;
mod prompts;

use config::ConfigStore;
use prompts::DirPromptSource;

#[derive(Parser)]
#[command(name = "carve")]
#[command(about = "Assemble model context from a source tree and invoke LLM backends", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a context file around a target path
    Context(ContextArgs),

    /// Invoke a model with an input file
    Invoke(InvokeCmdArgs),

    /// Read or write persisted configuration
    Config(ConfigCmd),
}

#[derive(Args)]
struct ContextArgs {
    /// Target file or directory to build context around
    target: PathBuf,

    /// Output file (a generated temp file is used when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Prompt name to include (repeatable)
    #[arg(long = "prompt")]
    prompts: Vec<String>,

    /// Free-text request appended to the context
    #[arg(long)]
    guidance: Option<String>,

    /// How many nearby files to include as scaffolds
    #[arg(long, default_value_t = 10)]
    scaffold_count: usize,

    /// How many nearby files to include in full
    #[arg(long, default_value_t = 5)]
    full_count: usize,
}

#[derive(Args)]
struct InvokeCmdArgs {
    /// Input file holding the compiled context
    #[arg(long)]
    input: PathBuf,

    /// Output file for the model response (defaults next to the input)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Backend to invoke (defaults to the configured default-provider)
    #[arg(long)]
    provider: Option<String>,

    /// Model id (defaults to the provider's configured model)
    #[arg(long)]
    model: Option<String>,

    /// Built-in tool to expose to the model (repeatable); currently: write-file
    #[arg(long = "tool")]
    tools: Vec<String>,
}

#[derive(Args)]
struct ConfigCmd {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration key
    Set { key: String, value: String },

    /// Print a configuration key
    Get { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = ConfigStore::open()?;

    match cli.command {
        Commands::Context(args) => run_context(args, &config).await?,
        Commands::Invoke(args) => run_invoke(args, &config).await?,
        Commands::Config(cmd) => run_config(cmd, &config)?,
    }

    Ok(())
}

async fn run_context(args: ContextArgs, config: &ConfigStore) -> Result<()> {
    let target = args
        .target
        .canonicalize()
        .with_context(|| format!("Invalid target path: {}", args.target.display()))?;
    let dir = if target.is_dir() {
        target.clone()
    } else {
        target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    log::info!("Building context for {}", target.display());

    let mut builder = ContextBuilder::new()
        .add_section(
            "Workspace Structure",
            "Here is the structure of the workspace.",
        )
        .add_file_tree(&dir)
        .add_section(
            "Relevant File Scaffolds",
            "Here are some file details that are useful to the current task.",
        )
        .add_nearby_file_scaffolds("Relevant File Scaffolds", &target, args.scaffold_count)
        .add_nearby_full_files("Relevant File Contents", &target, args.full_count)
        .add_included_prompts(args.prompts.iter().cloned());
    if let Some(guidance) = &args.guidance {
        builder = builder.add_user_request(guidance.clone());
    }

    let prompt_source = DirPromptSource::new(config.prompts_dir());
    let compiled = builder.compile(&prompt_source).await?;

    let output = args.output.unwrap_or_else(|| config.tmp_file(".md"));
    tokio::fs::write(&output, &compiled)
        .await
        .with_context(|| format!("Cannot write context to {}", output.display()))?;
    log::info!("Context written to {}", output.display());
    println!("{}", output.display());
    Ok(())
}

async fn run_invoke(args: InvokeCmdArgs, config: &ConfigStore) -> Result<()> {
    let provider = match &args.provider {
        Some(name) => name.parse::<ProviderKind>()?,
        None => config
            .load_key_or("default-provider", "openai".to_string())
            .parse::<ProviderKind>()?,
    };
    let model_id = args
        .model
        .or_else(|| config.load_key::<String>(&format!("{provider}-model")))
        .unwrap_or_else(|| provider.default_model().to_string());
    let api_key = config.load_key::<String>(&format!("{provider}-api-key"));
    let concurrency = config.load_key_or("api-concurrency", 5);

    let tools: Vec<ToolSpec> = args
        .tools
        .iter()
        .filter_map(|name| {
            if name == WRITE_FILE_TOOL_NAME {
                Some(write_file_tool())
            } else {
                log::warn!("Unknown tool \"{name}\", skipping");
                None
            }
        })
        .collect();

    let output_file = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("out.txt"));

    let invoker = Invoker::new(
        InvocationCache::new(config.cache_dir()),
        ConcurrencyGate::new(concurrency)?,
    );
    let invoke_args = InvokeArgs {
        provider,
        model_id,
        input_file: args.input.clone(),
        output_file: output_file.clone(),
        api_key,
        tools,
    };

    let Some(outcome) = invoker.invoke(&invoke_args).await? else {
        // Invocation failures are reported but are not fatal: a batch of
        // independent calls should keep going.
        log::error!("Failed to invoke {provider} model");
        return Ok(());
    };

    for call in &outcome.tool_calls {
        if call.name == WRITE_FILE_TOOL_NAME {
            let workspace = std::env::current_dir().context("Cannot determine working directory")?;
            if let Err(err) = apply_write_file(&workspace, &call.args).await {
                log::warn!("Failed to apply write-file call: {err}");
            }
        }
    }

    if !outcome.output.is_empty() {
        println!("{}", output_file.display());
    }
    Ok(())
}

fn run_config(cmd: ConfigCmd, config: &ConfigStore) -> Result<()> {
    match cmd.action {
        ConfigAction::Set { key, value } => {
            config.set_key(&key, &value)?;
            log::info!("Set {key}");
        }
        ConfigAction::Get { key } => match config.load_key::<serde_json::Value>(&key) {
            Some(serde_json::Value::String(value)) => println!("{value}"),
            Some(other) => println!("{other}"),
            None => {
                log::error!("Key {key} is not set");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
