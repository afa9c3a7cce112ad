//! RoadmapGen - two-pass LLM roadmap generator
//!
//! CLI entry point: generate, save, or question an application idea.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roadmapgen::cli::{Cli, Command, OutputFormat, RoadmapArgs, get_log_path};
use roadmapgen::config::Config;
use roadmapgen::llm::{LlmError, create_client};
use roadmapgen::prompts::PromptLoader;
use roadmapgen::roadmap::{
    ChannelObserver, ClarificationAnswers, ClarificationQuestions, Clarifications, GenerationSettings, Phase,
    RoadmapError, RoadmapGenerator,
};

/// Exit status after Ctrl-C
const EXIT_CANCELLED: i32 = 130;

/// Raised when the user interrupts the interactive questions
#[derive(Debug, thiserror::Error)]
#[error("Cancelled by user")]
struct Cancelled;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging is not up yet, so problems here go to stderr
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(model = %config.llm.model, max_tokens = config.llm.max_tokens, "RoadmapGen loaded config");

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;

    let mut prompts = PromptLoader::new(std::env::current_dir().context("Failed to read working directory")?);
    if let Some(ref dir) = config.prompts_dir {
        prompts = prompts.with_override_dir(dir);
    }

    let (observer, progress_rx) = ChannelObserver::channel();
    let printer = tokio::spawn(print_progress(progress_rx));

    let generator = RoadmapGenerator::new(llm, GenerationSettings::from(&config.llm))
        .with_prompts(prompts)
        .with_observer(Arc::new(observer));

    let result = tokio::select! {
        result = dispatch(&generator, cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling in-flight request");
            eprintln!("\n{}", "Cancelled.".yellow());
            std::process::exit(EXIT_CANCELLED);
        }
    };

    // Closing the channel lets the printer drain and stop
    drop(generator);
    if let Err(e) = printer.await {
        debug!(error = %e, "main: progress printer task failed");
    }

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) if e.downcast_ref::<Cancelled>().is_some() => {
            eprintln!("\n{}", "Cancelled.".yellow());
            std::process::exit(EXIT_CANCELLED);
        }
        Err(e) => {
            print_hint(&e);
            Err(e)
        }
    }
}

/// Run the selected command; returns what goes to stdout
async fn dispatch(generator: &RoadmapGenerator, command: Command) -> Result<String> {
    debug!(?command, "dispatch: called");
    match command {
        Command::Generate { args } => {
            debug!("dispatch: matched Generate command");
            cmd_generate(generator, &args).await
        }
        Command::Save { args, output_file } => {
            debug!(?output_file, "dispatch: matched Save command");
            cmd_save(generator, &args, &output_file).await
        }
        Command::Questions { idea, draft, format } => {
            debug!(?draft, ?format, "dispatch: matched Questions command");
            cmd_questions(generator, &idea, draft.as_deref(), format).await
        }
    }
}

/// Generate a roadmap and return it for printing
async fn cmd_generate(generator: &RoadmapGenerator, args: &RoadmapArgs) -> Result<String> {
    build_roadmap(generator, args).await
}

/// Generate a roadmap and write it to `output_file`
async fn cmd_save(generator: &RoadmapGenerator, args: &RoadmapArgs, output_file: &Path) -> Result<String> {
    let roadmap = build_roadmap(generator, args).await?;

    if let Some(parent) = output_file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(output_file, &roadmap).context(format!("Failed to write roadmap to {}", output_file.display()))?;
    info!(path = %output_file.display(), bytes = roadmap.len(), "Roadmap saved");

    Ok(format!("{} Roadmap saved to {}", "✓".green(), output_file.display()))
}

/// Propose clarification questions, drafting first unless a draft is given
async fn cmd_questions(
    generator: &RoadmapGenerator,
    idea: &str,
    draft_path: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let draft = match draft_path {
        Some(path) => {
            debug!(?path, "cmd_questions: reading draft from file");
            fs::read_to_string(path).context(format!("Failed to read draft {}", path.display()))?
        }
        None => generator.draft(idea).await?,
    };

    let questions = generator.propose_questions(idea, &draft).await?;
    render_questions(&questions, format)
}

/// Draft and reflect, with answers from `--answers` and/or `--clarify`
async fn build_roadmap(generator: &RoadmapGenerator, args: &RoadmapArgs) -> Result<String> {
    let mut answers = match args.answers {
        Some(ref path) => Clarifications::from_file(path)?,
        None => ClarificationAnswers::new(),
    };

    if !args.clarify {
        let roadmap = if answers.is_empty() {
            generator.generate_roadmap(&args.idea).await?
        } else {
            generator.generate_roadmap_with_answers(&args.idea, &answers).await?
        };
        return Ok(roadmap);
    }

    let draft = generator.draft(&args.idea).await?;
    let questions = generator.propose_questions(&args.idea, &draft).await?;

    let unanswered: ClarificationQuestions = questions.into_iter().filter(|(key, _)| !answers.contains_key(key)).collect();
    debug!(pending = unanswered.len(), seeded = answers.len(), "build_roadmap: asking questions");

    let asked = tokio::task::spawn_blocking(move || ask_questions(&unanswered))
        .await
        .context("Question prompt task failed")??;
    for (key, value) in asked {
        answers.insert(key, value);
    }
    info!(answer_count = answers.len(), "Collected clarification answers");

    let roadmap = generator.refine(&args.idea, &draft, Some(&answers)).await?;
    Ok(roadmap)
}

/// Ask each question on the terminal; empty input skips it
fn ask_questions(questions: &ClarificationQuestions) -> Result<ClarificationAnswers> {
    let mut answers = ClarificationAnswers::new();
    if questions.is_empty() {
        return Ok(answers);
    }

    let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
    eprintln!(
        "\n{}",
        "Answer a few questions to sharpen the roadmap (Enter skips):".bright_cyan().bold()
    );

    for (key, question) in questions.iter() {
        eprintln!("\n{} {}", format!("[{}]", key).yellow(), question);
        match rl.readline(&format!("{} ", ">".bright_green())) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    debug!(%key, "ask_questions: skipped");
                } else {
                    answers.insert(key, line);
                }
            }
            Err(ReadlineError::Interrupted) => return Err(Cancelled.into()),
            Err(ReadlineError::Eof) => {
                debug!("ask_questions: EOF, keeping answers so far");
                break;
            }
            Err(e) => return Err(eyre::eyre!("Failed to read answer: {}", e)),
        }
    }

    Ok(answers)
}

fn render_questions(questions: &ClarificationQuestions, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(questions
            .iter()
            .map(|(key, question)| format!("{}: {}", key, question))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Yaml => serde_yaml::to_string(questions).context("Failed to serialize questions as YAML"),
        OutputFormat::Json => serde_json::to_string_pretty(questions).context("Failed to serialize questions as JSON"),
    }
}

/// Print phase labels on stderr until the generator goes away
async fn print_progress(mut rx: mpsc::UnboundedReceiver<Phase>) {
    while let Some(phase) = rx.recv().await {
        match phase {
            Phase::Complete => eprintln!("{}", phase.label().green().bold()),
            Phase::Reflecting => eprintln!("{}", phase.label().magenta()),
            _ => eprintln!("{}", phase.label().cyan()),
        }
    }
}

/// Extra guidance for errors the user can fix
fn print_hint(err: &eyre::Report) {
    let llm = err.chain().find_map(|e| {
        e.downcast_ref::<LlmError>()
            .or_else(|| e.downcast_ref::<RoadmapError>().and_then(RoadmapError::as_llm))
    });

    match llm {
        Some(e) if e.is_auth() => {
            eprintln!("{}", "Hint: the provider rejected the API key; check your key and try again.".yellow());
        }
        Some(e) if e.is_rate_limit() => {
            let wait = e
                .retry_after()
                .map(|d| format!(" in {}s", d.as_secs()))
                .unwrap_or_default();
            eprintln!("{}", format!("Hint: rate limited by the provider; try again{}.", wait).yellow());
        }
        _ => {}
    }
}
