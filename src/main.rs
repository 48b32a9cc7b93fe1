use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod cli;

use cli::{Cli, Commands};
use mendr::analysis;
use mendr::config::{self, CallOverrides, CallOverridesBuilder, Settings, SettingsResolver};
use mendr::exec::{CodeExecutor, ExecutionOutcome, ExecutorConfig, PythonExecutor};
use mendr::generator::ScriptGenerator;
use mendr::history::HistoryStore;
use mendr::llm::create_client;
use mendr::prompt::PromptSet;
use mendr::repair::{RepairReport, RepairRunner};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mendr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("mendr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Pipe(target));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn handle_run(
    settings: &Settings,
    task: &str,
    overrides: &CallOverrides,
    no_save: bool,
    show_attempts: bool,
) -> Result<()> {
    let resolver = SettingsResolver::new(settings.clone());
    let resolved = resolver.resolve(overrides)?;

    info!(
        "Running task with {}/{}: {}",
        resolved.provider, resolved.model, task
    );
    println!(
        "{} {} {}",
        "Task:".green(),
        task,
        format!("[{}/{}]", resolved.provider, resolved.model).cyan()
    );

    let client = create_client(&resolved).context("Failed to create LLM client")?;

    let mut prompts = PromptSet::from_settings(&settings.prompts);
    if let Some(suffix) = &resolved.prompt_suffix {
        prompts = prompts.append_suffix(suffix);
    }

    let generator = Arc::new(
        ScriptGenerator::new(client)
            .with_prompts(prompts)
            .with_max_tokens(resolved.max_tokens)
            .with_temperature(resolved.temperature),
    );
    let executor = Arc::new(PythonExecutor::new(ExecutorConfig {
        python: settings.executor.python.clone(),
        timeout: Duration::from_millis(settings.executor.timeout_ms),
    }));

    let max_iterations = overrides
        .max_iterations
        .unwrap_or(settings.repair.max_iterations);

    let runner = RepairRunner::new(generator.clone(), executor);
    let report = runner.run(task, max_iterations).await?;

    print_report(&report, show_attempts);

    let usage = generator.total_usage();
    info!(
        "Run {} used {} input / {} output tokens",
        report.run_id, usage.input_tokens, usage.output_tokens
    );
    println!(
        "{} {} input, {} output",
        "Tokens:".cyan(),
        usage.input_tokens,
        usage.output_tokens
    );

    if !no_save && settings.history.enabled {
        match HistoryStore::new(&settings.history.dir) {
            Ok(store) => match store.save(&report) {
                Ok(saved) => {
                    println!("{} {}", "Saved:".cyan(), saved.script_path.display());
                }
                Err(e) => log::warn!("Failed to save run: {}", e),
            },
            Err(e) => log::warn!(
                "Failed to open history dir {}: {}",
                settings.history.dir.display(),
                e
            ),
        }
    }

    Ok(())
}

fn print_report(report: &RepairReport, show_attempts: bool) {
    for attempt in &report.attempts {
        let label = format!("attempt {}", attempt.index + 1);
        if attempt.succeeded() {
            println!("  {} {}", label.green(), "ok");
        } else {
            let first_line = attempt
                .outcome
                .error_message
                .lines()
                .next()
                .unwrap_or("failed");
            println!("  {} {}", label.red(), first_line);
        }
        if show_attempts {
            for line in attempt.script.lines() {
                println!("    {}", line);
            }
        }
    }

    match report.final_attempt() {
        Some(attempt) if attempt.succeeded() => {
            println!(
                "{} after {} fix iterations",
                "Succeeded".green(),
                report.fix_iterations
            );
            if !attempt.outcome.captured_output.is_empty() {
                println!("{}", "Output:".cyan());
                println!("{}", attempt.outcome.captured_output);
            }
            if let Some(value) = &attempt.outcome.returned_value {
                println!("{} {}", "Result:".cyan(), value);
            }
            if !show_attempts {
                println!("{}", "Script:".cyan());
                println!("{}", attempt.script);
            }
            let functions = analysis::outline(&attempt.script);
            if !functions.is_empty() {
                println!("{}", "Functions:".cyan());
                for function in &functions {
                    println!("  def {}({})", function.name, function.params.join(", "));
                }
            }
        }
        Some(attempt) => {
            println!(
                "{} after {} fix iterations",
                "Exhausted".red(),
                report.fix_iterations
            );
            println!("{} {}", "Last error:".red(), attempt.outcome.error_message);
        }
        None => {}
    }
}

async fn handle_exec(
    settings: &Settings,
    file: Option<PathBuf>,
    code: Option<String>,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let source = match (file, code) {
        (Some(path), None) => fs::read_to_string(&path)
            .context(format!("Failed to read {}", path.display()))?,
        (None, Some(code)) => code,
        _ => eyre::bail!("Provide a script file or inline code with -e"),
    };

    let executor = PythonExecutor::new(ExecutorConfig {
        python: settings.executor.python.clone(),
        timeout: Duration::from_millis(timeout_ms.unwrap_or(settings.executor.timeout_ms)),
    });

    let outcome = executor.execute(&source).await;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &ExecutionOutcome) {
    if outcome.is_success() {
        if !outcome.captured_output.is_empty() {
            println!("{}", outcome.captured_output);
        }
        if let Some(value) = &outcome.returned_value {
            println!("{} {}", "Result:".cyan(), value);
        }
    } else {
        println!("{} {}", "Error:".red(), outcome.error_message);
    }
}

fn handle_outline(file: &Path, json: bool) -> Result<()> {
    let source =
        fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let functions = analysis::outline(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&functions)?);
        return Ok(());
    }

    if functions.is_empty() {
        println!("No functions found");
        return Ok(());
    }
    for function in &functions {
        println!(
            "{} {}({})",
            "def".cyan(),
            function.name,
            function.params.join(", ")
        );
        for line in &function.returns {
            println!("    {}", line);
        }
    }
    Ok(())
}

fn handle_history(settings: &Settings, limit: usize) -> Result<()> {
    let store = HistoryStore::new(&settings.history.dir)?;
    let entries = store.list(limit)?;

    if entries.is_empty() {
        println!("No saved runs in {}", store.dir().display());
        return Ok(());
    }
    for entry in entries {
        let status = match entry.succeeded {
            Some(true) => "ok".green(),
            Some(false) => "failed".red(),
            None => "?".yellow(),
        };
        let task = entry.task_description;
        let first_line = task.lines().next().unwrap_or("");
        println!("{:>4}  {}  {}", entry.index, status, first_line);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first so -v can raise the log level
    let cli = Cli::parse();

    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // Load settings
    let settings = config::load_settings(cli.config.as_ref()).context("Failed to load settings")?;
    settings.validate().context("Invalid settings")?;

    info!("Starting with config from: {:?}", cli.config);

    match cli.command {
        Commands::Run {
            task,
            max_iterations,
            model,
            max_tokens,
            temperature,
            no_save,
            show_attempts,
        } => {
            let mut builder = CallOverridesBuilder::new();
            if let Some(model) = model {
                builder = builder.model(model);
            }
            if let Some(max_tokens) = max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                builder = builder.temperature(temperature);
            }
            if let Some(max_iterations) = max_iterations {
                builder = builder.max_iterations(max_iterations);
            }
            let overrides = builder.build();
            handle_run(&settings, &task, &overrides, no_save, show_attempts).await
        }
        Commands::Exec {
            file,
            code,
            timeout_ms,
        } => handle_exec(&settings, file, code, timeout_ms).await,
        Commands::Outline { file, json } => handle_outline(&file, json),
        Commands::History { limit } => handle_history(&settings, limit),
    }
}
