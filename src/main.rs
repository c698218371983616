//! AEOScope - AI assistant visibility and SEO health for a product
//!
//! A CLI tool that uses an Ollama model to estimate how often AI
//! assistants would mention a product, and probes the product website
//! for SEO health problems.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, profile, invalid URL, etc.)
//!   2 - Health score below --fail-under

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod oracle;
mod probes;
mod profile;
mod report;

use analysis::{HealthAggregator, QuestionGenerator, VisibilityScorer};
use anyhow::{bail, Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{
    HealthCheckReport, Profile, ProductProfile, QuestionCategory, QuestionOrigin, TestQuestion,
};
use oracle::{LlmOracle, OllamaClient, OllamaConfig};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("AEOScope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .aeoscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, platforms, scoring policy and health checks.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the subcommand. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command.clone() {
        Command::InitConfig => {
            handle_init_config()?;
            Ok(0)
        }
        Command::Init {
            profile,
            name,
            website,
            description,
            industry,
            competitors,
        } => {
            let mut product = ProductProfile::new(&name, &website)?;
            product.description = description.filter(|d| !d.trim().is_empty());
            product.industry = industry.filter(|i| !i.trim().is_empty());
            handle_init(&profile, product, &competitors)
        }
        Command::Questions {
            profile,
            count,
            add,
            category,
            region,
        } => match add {
            Some(text) => handle_add_question(&profile, &text, &category, &region),
            None => handle_generate_questions(&config, &profile, count).await,
        },
        Command::Visibility {
            profile,
            format,
            output,
        } => handle_visibility(&config, &profile, format, output.as_deref()).await,
        Command::Health {
            url,
            profile,
            format,
            output,
            fail_under,
        } => {
            handle_health(
                &config,
                url,
                profile.as_deref(),
                format,
                output.as_deref(),
                fail_under,
            )
            .await
        }
    }
}

/// Create a new profile file.
fn handle_init(path: &Path, product: ProductProfile, competitors: &[String]) -> Result<i32> {
    if path.exists() {
        bail!(
            "{} already exists. Remove it first or edit it manually.",
            path.display()
        );
    }

    let mut profile = Profile::new(product);
    profile.add_competitors(competitors);
    profile::save(&profile, path)?;

    println!("✅ Created profile for {}: {}", profile.product.name, path.display());
    println!(
        "   Next: aeoscope questions --profile {}",
        path.display()
    );
    Ok(0)
}

/// Add one manual question to a profile.
fn handle_add_question(path: &Path, text: &str, category: &str, region: &str) -> Result<i32> {
    let mut profile = profile::load(path)?;

    let mut question =
        TestQuestion::new(text, QuestionCategory::from(category), QuestionOrigin::Manual);
    question.region = region.trim().to_string();

    if profile.add_question(question) {
        profile::save(&profile, path)?;
        println!("✅ Added question ({} total).", profile.questions.len());
    } else {
        println!("⚠️  That question is already in the profile.");
    }
    Ok(0)
}

/// Generate questions and competitor names with the LLM.
async fn handle_generate_questions(config: &Config, path: &Path, count: usize) -> Result<i32> {
    let mut profile = profile::load(path)?;

    println!("🤖 Generating {} questions with {}...", count, config.model.name);
    let client = OllamaClient::new(OllamaConfig::from(&config.model))?;
    let generated = QuestionGenerator::new(client)
        .generate(&profile.product, count)
        .await
        .context("Question generation failed")?;

    let before = profile.questions.len();
    for question in generated.questions {
        profile.add_question(question);
    }
    let competitors_before = profile.product.competitors.len();
    profile.add_competitors(&generated.competitors);
    profile::save(&profile, path)?;

    println!(
        "✅ Added {} questions and {} competitors ({} questions total).",
        profile.questions.len() - before,
        profile.product.competitors.len() - competitors_before,
        profile.questions.len()
    );
    Ok(0)
}

/// Run the visibility analysis and store the result in the profile.
async fn handle_visibility(
    config: &Config,
    path: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<i32> {
    let start_time = Instant::now();
    let mut profile = profile::load(path)?;

    if profile.questions.is_empty() {
        bail!(
            "{} has no questions. Run `aeoscope questions --profile {}` first.",
            path.display(),
            path.display()
        );
    }

    let platforms = &config.visibility.platforms;
    let evaluated = profile.questions.len().min(config.visibility.max_questions);
    println!("🔬 Running visibility analysis...");
    println!("   Model: {}", config.model.name);
    println!(
        "   Questions: {} | Platforms: {}",
        evaluated,
        platforms
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let client = OllamaClient::new(OllamaConfig::from(&config.model))?;
    let mut scorer = VisibilityScorer::new(LlmOracle::new(client), config.visibility.clone());
    if config.general.progress {
        scorer = scorer.with_progress(progress_bar()?);
    }

    let mut analysis = scorer
        .score(&profile.product, &mut profile.questions)
        .await;
    if let Some(health) = &profile.health {
        analysis.attach_health(health);
    }

    let rendered = match format {
        OutputFormat::Json => report::generate_json_report(&analysis)?,
        OutputFormat::Markdown => report::generate_visibility_markdown(&profile, &analysis),
    };

    println!("\n📊 Visibility Summary:");
    println!("   Overall score: {}/100", analysis.overall_score);
    for platform in &analysis.platform_performance {
        println!(
            "   - {}: {} ({} mentions, {} citations)",
            platform.platform, platform.score, platform.mentions, platform.citations
        );
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    profile.analysis = Some(analysis);
    profile::save(&profile, path)?;

    emit_report(&rendered, output)?;
    Ok(0)
}

/// Run the SEO health check. Returns 2 when below `fail_under`.
async fn handle_health(
    config: &Config,
    url: Option<String>,
    profile_path: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
    fail_under: Option<u8>,
) -> Result<i32> {
    let mut stored = match profile_path {
        Some(path) => Some((profile::load(path)?, path.to_path_buf())),
        None => None,
    };

    let target = match (&url, &stored) {
        (Some(url), _) => url.clone(),
        (None, Some((profile, _))) => profile.product.website.clone(),
        (None, None) => bail!("Either --url or --profile is required"),
    };

    println!("🩺 Checking SEO health: {}", target);
    let aggregator = HealthAggregator::new(&config.health)?;
    let health = aggregator.check(&target).await?;

    let rendered = match format {
        OutputFormat::Json => report::generate_json_report(&health)?,
        OutputFormat::Markdown => report::generate_health_markdown(&health),
    };

    print_health_summary(&health);

    if let Some((profile, path)) = stored.as_mut() {
        store_health(profile, path, health.clone())?;
    }

    emit_report(&rendered, output)?;

    if let Some(threshold) = fail_under {
        if health.overall_score < threshold {
            eprintln!(
                "\n⛔ Health score {} is below --fail-under {}. Failing (exit code 2).",
                health.overall_score, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Keep the latest health report and refresh the analysis SEO figures.
fn store_health(profile: &mut Profile, path: &Path, health: HealthCheckReport) -> Result<()> {
    if let Some(analysis) = profile.analysis.as_mut() {
        analysis.attach_health(&health);
    }
    profile.health = Some(health);
    profile::save(profile, path)?;
    Ok(())
}

fn print_health_summary(health: &HealthCheckReport) {
    println!("\n📊 Health Summary:");
    println!(
        "   Overall: {}/100 {} {}",
        health.overall_score,
        health.status.emoji(),
        health.status
    );
    for category in &health.categories {
        println!(
            "   - {} {}: {}",
            category.status.emoji(),
            category.name,
            category.score
        );
    }
    if !health.action_items.is_empty() {
        println!("\n   Top actions:");
        for item in &health.action_items {
            println!("   {} {}", item.priority.emoji(), item.title);
        }
    }
}

/// Write the report to a file, or print it when no output path was given.
fn emit_report(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            report::write_report(rendered, path)?;
            println!("\n✅ Report saved to: {}", path.display());
        }
        None => println!("\n{}", rendered),
    }
    Ok(())
}

fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
