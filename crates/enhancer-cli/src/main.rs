use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use enhancer_contracts::settings::{sanitize_incoming_providers, PromptPreset, StoredSettings};
use enhancer_engine::{EnhancerConfig, ImageEnhancer, ProcessOptions, DEFAULT_SQUARE_SIZE};
use serde_json::{json, Map, Value};

#[derive(Debug, Parser)]
#[command(name = "enhancer-rs", version, about = "AI image enhancer CLI")]
struct Cli {
    /// Settings document (defaults to ENHANCER_SETTINGS or enhancer_settings.json).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Provider catalog JSON replacing the built-in one.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Activity log (events.jsonl).
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enhance one image through the configured provider.
    Process(ProcessArgs),
    /// List catalog providers and their models.
    Providers,
    /// Store credentials and model for one provider.
    Configure(ConfigureArgs),
    /// Manage the default prompt presets.
    Prompts {
        #[command(subcommand)]
        command: PromptsCommand,
    },
    /// Report provider connectivity.
    Verify(VerifyArgs),
}

#[derive(Debug, Parser)]
struct ProcessArgs {
    #[arg(long)]
    input: String,
    #[arg(long = "prompt")]
    prompts: Vec<String>,
    #[arg(long, default_value = "gemini")]
    provider: String,
    #[arg(long)]
    resize: bool,
    #[arg(long, default_value_t = DEFAULT_SQUARE_SIZE)]
    size: u32,
}

#[derive(Debug, Parser)]
struct ConfigureArgs {
    #[arg(long, default_value = "gemini")]
    provider: String,
    #[arg(long)]
    api_key: String,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Subcommand)]
enum PromptsCommand {
    List,
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        text: String,
        #[arg(long)]
        selected: bool,
    },
    Remove {
        /// 1-based position as shown by `prompts list`.
        #[arg(long)]
        index: usize,
    },
}

#[derive(Debug, Parser)]
struct VerifyArgs {
    #[arg(long, default_value = "gemini")]
    provider: String,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("enhancer-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut config = EnhancerConfig::from_env();
    if let Some(path) = cli.settings {
        config.settings_path = path;
    }
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(path) = cli.events {
        config.events_path = Some(path);
    }

    let enhancer = ImageEnhancer::from_config(&config)?;
    match cli.command {
        Command::Process(args) => run_process(&enhancer, args),
        Command::Providers => run_providers(&enhancer),
        Command::Configure(args) => run_configure(&enhancer, args),
        Command::Prompts { command } => run_prompts(&enhancer, command),
        Command::Verify(args) => {
            print_json(&serde_json::to_value(enhancer.verify_provider(&args.provider))?)?;
            Ok(0)
        }
    }
}

fn run_process(enhancer: &ImageEnhancer, args: ProcessArgs) -> Result<i32> {
    let prompts = if args.prompts.is_empty() {
        enhancer.store().load().selected_prompt_texts()
    } else {
        args.prompts
    };
    let options = ProcessOptions {
        resize: args.resize,
        size: args.size,
    };
    let outcome = enhancer.process_image(&args.input, &prompts, &args.provider, options);
    print_json(&serde_json::to_value(&outcome)?)?;
    Ok(if outcome.ok { 0 } else { 1 })
}

fn run_providers(enhancer: &ImageEnhancer) -> Result<i32> {
    let catalog = enhancer.catalog();
    let rows: Vec<Value> = catalog
        .list()
        .map(|provider| {
            json!({
                "code": provider.code,
                "name": provider.display_name,
                "client": provider.client.as_str(),
                "default_model": catalog.default_model(&provider.code),
                "models": catalog.model_select_options(&provider.code, None),
            })
        })
        .collect();
    print_json(&Value::Array(rows))?;
    Ok(0)
}

fn run_configure(enhancer: &ImageEnhancer, args: ConfigureArgs) -> Result<i32> {
    let catalog = enhancer.catalog();
    if catalog.get(&args.provider).is_none() {
        bail!("unknown provider: {}", args.provider);
    }

    let saved = enhancer.store().update(|settings| {
        let mut incoming = submitted_providers(settings);
        let mut row = Map::new();
        row.insert("api_key".to_string(), Value::String(args.api_key.clone()));
        if let Some(model) = args.model.as_ref() {
            row.insert("model".to_string(), Value::String(model.clone()));
        } else if let Some(current) = incoming.get(&args.provider).and_then(|row| row.get("model")) {
            row.insert("model".to_string(), current.clone());
        }
        incoming.insert(args.provider.clone(), Value::Object(row));
        settings.update_providers(sanitize_incoming_providers(catalog, &incoming));
    })?;

    let stored = saved.provider_settings(&args.provider);
    if let Some(requested) = args.model.as_deref().filter(|model| !model.trim().is_empty()) {
        if stored.model.is_empty() {
            tracing::warn!(
                provider = %args.provider,
                model = requested,
                "model is not declared for provider; stored empty model"
            );
        }
    }
    enhancer.record_settings_saved("api_connection");

    print_json(&json!({
        "provider": args.provider,
        "api_key_set": stored.has_api_key(),
        "model": stored.model,
        "settings": enhancer.store().path(),
    }))?;
    Ok(0)
}

fn run_prompts(enhancer: &ImageEnhancer, command: PromptsCommand) -> Result<i32> {
    let store = enhancer.store();
    match command {
        PromptsCommand::List => {
            print_json(&serde_json::to_value(store.load().default_prompts())?)?;
        }
        PromptsCommand::Add {
            title,
            text,
            selected,
        } => {
            let Some(preset) = PromptPreset::sanitized(&title, &text, selected) else {
                bail!("prompt needs a title or text");
            };
            let saved = store.update(|settings| settings.push_prompt(preset))?;
            enhancer.record_settings_saved("enhancer");
            print_json(&serde_json::to_value(saved.default_prompts())?)?;
        }
        PromptsCommand::Remove { index } => {
            let position = index
                .checked_sub(1)
                .context("prompt index starts at 1")?;
            let mut settings = store.load();
            if settings.remove_prompt(position).is_none() {
                bail!("no prompt at index {index}");
            }
            store.save(&settings)?;
            enhancer.record_settings_saved("enhancer");
            print_json(&serde_json::to_value(settings.default_prompts())?)?;
        }
    }
    Ok(0)
}

/// Current provider rows in submission shape, so a save for one provider
/// keeps the others.
fn submitted_providers(settings: &StoredSettings) -> Map<String, Value> {
    settings
        .providers
        .iter()
        .map(|(code, row)| {
            (
                code.clone(),
                json!({ "api_key": row.api_key, "model": row.model }),
            )
        })
        .collect()
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use clap::CommandFactory;
    use enhancer_contracts::settings::ProviderSettings;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_args_parse_repeated_prompts() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "enhancer-rs",
            "--settings",
            "/tmp/s.json",
            "process",
            "--input",
            "a.jpg",
            "--prompt",
            "sharpen",
            "--prompt",
            "brighten",
            "--resize",
        ])?;
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
        let Command::Process(args) = cli.command else {
            anyhow::bail!("expected process command");
        };
        assert_eq!(args.prompts, vec!["sharpen", "brighten"]);
        assert_eq!(args.provider, "gemini");
        assert!(args.resize);
        assert_eq!(args.size, 600);
        Ok(())
    }

    #[test]
    fn submitted_providers_round_trips_through_sanitizer() {
        let mut providers = BTreeMap::new();
        providers.insert(
            "gemini".to_string(),
            ProviderSettings {
                api_key: "k".to_string(),
                model: "gemini-2.5-pro".to_string(),
            },
        );
        let settings = StoredSettings {
            providers,
            ..StoredSettings::default()
        };
        let incoming = submitted_providers(&settings);
        assert_eq!(incoming["gemini"]["api_key"], "k");

        let catalog = enhancer_contracts::providers::ProviderCatalog::default();
        let sanitized = sanitize_incoming_providers(&catalog, &incoming);
        assert_eq!(sanitized, settings.providers);
    }
}
