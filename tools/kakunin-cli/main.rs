use clap::{Parser, ValueEnum};
use kakunin::prelude::*;
use serde_json::Value;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Evaluate a conditional form against a data snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the form definition JSON file
    form_path: String,
    /// Optional path to a JSON object of field values
    data_path: Option<String>,

    /// Change a field before evaluating, as `field=value`. The value is parsed
    /// as JSON and falls back to a plain string. Repeatable; applied in order
    /// with cascading.
    #[arg(short, long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,

    /// Print the dependency graph in Graphviz DOT format and exit
    #[arg(long)]
    dot: bool,

    /// Explain each conditional field's visibility
    #[arg(short, long)]
    explain: bool,

    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli);
}

fn run(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. Loading ---
    let form = FormDefinition::from_file(&cli.form_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load form: {}", e)));
    let engine = FormEngine::new(form)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid form definition: {}", e)));

    if cli.dot {
        print!("{}", engine.graph().to_dot());
        return;
    }

    let mut data: DataSnapshot = match &cli.data_path {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read data file '{}': {}", path, e))
            });
            serde_json::from_str(&json)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse data JSON: {}", e)))
        }
        None => DataSnapshot::new(),
    };

    // --- 2. Diagnostics ---
    let diagnostics = engine.diagnostics();
    if matches!(cli.format, OutputFormat::Text) {
        println!("Loaded {} field(s) from '{}'", engine.fields().len(), cli.form_path);
        if diagnostics.is_empty() {
            println!("No configuration problems found.");
        } else {
            println!("\n--- Configuration Problems ---");
            for diagnostic in &diagnostics {
                println!("  {}", diagnostic);
            }
        }
    }

    // --- 3. Value Changes ---
    let mut session = engine.session(&data);
    for assignment in &cli.set {
        let (field, value) = parse_assignment(assignment);
        if engine.field(&field).is_none() {
            exit_with_error(&format!("Unknown field '{}' in --set", field));
        }
        let change = session.on_value_change(&field, value, &data, Instant::now());
        for (name, value) in change.snapshot_patch {
            data.insert(name, value);
        }
        if matches!(cli.format, OutputFormat::Text) && !change.cleared_field_ids.is_empty() {
            println!("Setting '{}' cleared: {}", field, change.cleared_field_ids.join(", "));
        }
    }

    // --- 4. Validation ---
    let validation = session.validate_for_submit(&data);

    match cli.format {
        OutputFormat::Json => print_json(&session, &validation),
        OutputFormat::Text => print_text(&engine, &session, &validation, &data, cli.explain),
    }

    if matches!(cli.format, OutputFormat::Text) {
        println!("\nFinished in {:?}", total_start.elapsed());
    }
    if !validation.is_valid {
        std::process::exit(2);
    }
}

fn print_text(
    engine: &FormEngine,
    session: &FormSession<'_>,
    validation: &FormValidation,
    data: &DataSnapshot,
    explain: bool,
) {
    println!("\n--- Field State ---");
    for field in engine.fields() {
        let Some(state) = session.field_state(&field.name) else {
            continue;
        };
        let visibility = if state.visible { "visible" } else { "hidden" };
        let requirement = if state.required { ", required" } else { "" };
        println!("  {:<24} {}{}", field.name, visibility, requirement);
        if explain {
            if let Some(reason) = session.explain(&field.name, data) {
                println!("      because {}", reason);
            }
        }
    }

    println!("\n--- Validation ---");
    if validation.is_valid {
        println!("  Form is valid.");
        return;
    }
    for field in engine.fields() {
        if let Some(messages) = validation.errors.get(&field.name) {
            for message in messages {
                println!("  {:<24} {}", field.name, message);
            }
        }
    }
}

fn print_json(session: &FormSession<'_>, validation: &FormValidation) {
    let report = serde_json::json!({
        "activeState": session.active_state(),
        "validation": validation,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize report: {}", e)),
    }
}

fn parse_assignment(assignment: &str) -> (String, Value) {
    let Some((field, raw)) = assignment.split_once('=') else {
        exit_with_error(&format!("Expected FIELD=VALUE, got '{}'", assignment));
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    (field.trim().to_string(), value)
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
