use clap::Parser;
use kakunin::condition::{Condition, DataSnapshot, Operator};
use kakunin::form::{FieldDefinition, FieldOption, FieldType, FormDefinition, ValidationRule};
use rand::Rng;
use rand::rngs::ThreadRng;
use serde_json::{Value, json};
use std::fs;

/// A CLI tool to generate synthetic forms and matching data for the kakunin engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated form definition to
    #[arg(short, long, default_value = "generated_form.json")]
    output: String,

    /// The path to write a matching data snapshot to
    #[arg(short, long, default_value = "generated_data.json")]
    data: String,

    /// Number of fields to generate
    #[arg(long, default_value_t = 20)]
    fields: usize,

    /// Probability (0-1) that a field gets a visibility condition
    #[arg(long, default_value_t = 0.4)]
    conditional: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if !(0.0..=1.0).contains(&cli.conditional) {
        eprintln!("Error: --conditional ({}) must be between 0 and 1", cli.conditional);
        std::process::exit(1);
    }

    println!("Generating a form with {} field(s)...", cli.fields);

    let fields = generate_fields(&mut rng, cli.fields, cli.conditional);
    let data = generate_data(&mut rng, &fields);

    let form = FormDefinition {
        title: Some("Generated form".to_string()),
        fields,
        ..Default::default()
    };
    fs::write(&cli.output, form.to_json()?)?;
    fs::write(&cli.data, serde_json::to_string_pretty(&data)?)?;

    println!(
        "Successfully wrote form to '{}' and data to '{}'",
        cli.output, cli.data
    );
    Ok(())
}

/// Builds fields whose conditions only reference earlier fields, so the
/// generated form never contains a cycle.
fn generate_fields(rng: &mut ThreadRng, count: usize, conditional: f64) -> Vec<FieldDefinition> {
    let mut fields: Vec<FieldDefinition> = Vec::with_capacity(count);
    for i in 0..count {
        let mut field = match rng.random_range(0..4) {
            0 => generate_text_field(rng, i),
            1 => generate_number_field(rng, i),
            2 => generate_checkbox_field(i),
            _ => generate_select_field(i),
        };
        if rng.random_bool(0.3) {
            field = field.required();
        }
        if !fields.is_empty() && rng.random_bool(conditional) {
            let source = &fields[rng.random_range(0..fields.len())];
            field = field.visible_when(condition_on(rng, source));
        }
        fields.push(field);
    }
    println!("-> Generated {} field definition(s).", fields.len());
    fields
}

// --- Field Generators ---

fn generate_text_field(rng: &mut ThreadRng, i: usize) -> FieldDefinition {
    let field = FieldDefinition::new(&format!("text{}", i), FieldType::Text)
        .with_label(&format!("Text {}", i));
    if rng.random_bool(0.5) {
        field.with_rule(ValidationRule::min_length(rng.random_range(2..6)))
    } else {
        field.with_rule(ValidationRule::max_length(rng.random_range(10..40)))
    }
}

fn generate_number_field(rng: &mut ThreadRng, i: usize) -> FieldDefinition {
    FieldDefinition::new(&format!("number{}", i), FieldType::Number)
        .with_label(&format!("Number {}", i))
        .with_rule(ValidationRule::min(0.0))
        .with_rule(ValidationRule::max(rng.random_range(50..500) as f64))
}

fn generate_checkbox_field(i: usize) -> FieldDefinition {
    FieldDefinition::new(&format!("flag{}", i), FieldType::Checkbox)
        .with_label(&format!("Flag {}", i))
}

fn generate_select_field(i: usize) -> FieldDefinition {
    let options = ["alpha", "beta", "gamma"]
        .iter()
        .map(|v| FieldOption {
            label: v.to_uppercase(),
            value: json!(v),
        })
        .collect();
    FieldDefinition::new(&format!("choice{}", i), FieldType::Select)
        .with_label(&format!("Choice {}", i))
        .with_options(options)
}

/// A condition that makes sense for the type of `source`.
fn condition_on(rng: &mut ThreadRng, source: &FieldDefinition) -> Condition {
    match source.field_type {
        FieldType::Number => Condition::leaf(
            &source.name,
            Operator::GreaterThan,
            json!(rng.random_range(0..100)),
        ),
        FieldType::Checkbox => Condition::leaf(&source.name, Operator::Equals, json!(true)),
        FieldType::Select => Condition::leaf(&source.name, Operator::InList, json!(["alpha", "beta"])),
        _ => Condition::leaf(&source.name, Operator::IsNotEmpty, Value::Null),
    }
}

fn generate_data(rng: &mut ThreadRng, fields: &[FieldDefinition]) -> DataSnapshot {
    let mut data = DataSnapshot::new();
    for field in fields {
        // Leave some fields blank to exercise required checks.
        if rng.random_bool(0.2) {
            continue;
        }
        let value = match field.field_type {
            FieldType::Number => json!(rng.random_range(-10..600)),
            FieldType::Checkbox => json!(rng.random_bool(0.5)),
            FieldType::Select => json!(["alpha", "beta", "gamma"][rng.random_range(0..3)]),
            _ => {
                let len = rng.random_range(1..30);
                json!((0..len).map(|_| rng.random_range(b'a'..=b'z') as char).collect::<String>())
            }
        };
        data.insert(field.name.clone(), value);
    }
    println!("-> Generated values for {} field(s).", data.len());
    data
}
