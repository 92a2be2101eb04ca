mod client;
mod db;
mod extract;
mod outline;
mod pipeline;
mod prompt;
mod result;
mod settings;
mod source;

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::client::GenerationClient;
use crate::settings::Settings;
use crate::source::Source;

#[derive(Parser)]
#[command(name = "jira_outline", about = "Jira XML export → outline → generated test cases")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the issue description as a plain-text outline
    Outline {
        /// Export file, http(s) URL, or '-' for stdin
        source: String,
        /// Print the restyled HTML instead of the outline
        #[arg(long)]
        html: bool,
    },
    /// Render, send to the generation endpoint and store the test cases
    Generate {
        /// Export file, http(s) URL, or '-' for stdin
        source: String,
    },
    /// Show the stored outline and generated test cases
    Show {
        /// Show the stored HTML rendering instead of the outline
        #[arg(long)]
        html: bool,
    },
    /// Replace the stored test cases with edited text
    Edit {
        /// File with the edited result, or '-' for stdin
        file: String,
    },
    /// Write the stored test cases to <issue-key>.txt
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Manage the prompt template
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },
    /// List previous generation runs
    History {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Check that the generation endpoint answers
    Ping,
}

#[derive(Subcommand)]
enum PromptAction {
    /// Print the active template
    Show,
    /// Use the template in FILE ('{CONTENT}' marks where the outline goes)
    Set { file: String },
    /// Go back to the built-in template
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Outline { source, html } => {
            let xml = Source::parse(&source).load(settings.timeout()).await?;
            let issue = pipeline::process_export(&xml)?;
            if html {
                println!("{}", issue.outline.html);
            } else {
                println!("{}\n", issue.identifier);
                println!("{}", issue.outline.text);
            }
            Ok(())
        }
        Commands::Generate { source } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let client = GenerationClient::new(&settings)?;
            let xml = Source::parse(&source).load(settings.timeout()).await?;

            let (issue, generated) = pipeline::generate(&conn, &client, &xml).await?;
            println!("Test outline for {} ({})\n", issue.identifier, issue.link);
            print_cases(&generated);
            Ok(())
        }
        Commands::Show { html } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let key = if html { db::JIRA_CONTENT_HTML } else { db::JIRA_CONTENT };
            let content = db::read(&conn, key)?.or(if html {
                db::read(&conn, db::JIRA_CONTENT)?
            } else {
                None
            });
            let generated = db::read(&conn, db::AI_RESULT)?;

            println!("--- Jira content ---");
            println!("{}", content.as_deref().unwrap_or(result::CONTENT_NOT_FOUND));
            println!("\n--- Test cases ---");
            match generated {
                Some(g) => print_cases(&g.replace("\\n", "\n")),
                None => println!("{}", result::RESULT_NOT_FOUND),
            }
            Ok(())
        }
        Commands::Edit { file } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let edited = read_input(&file)?;
            db::save(&conn, db::AI_RESULT, &edited)?;
            println!("Saved {} test cases.", result::test_cases(&edited).len());
            Ok(())
        }
        Commands::Export { out } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let Some(generated) = db::read(&conn, db::AI_RESULT)? else {
                println!("{}. Run 'generate' first.", result::RESULT_NOT_FOUND);
                return Ok(());
            };
            let name = db::latest_identifier(&conn)?.unwrap_or_else(|| "test-outline".into());
            let path = out.join(format!("{}.txt", result::sanitize_file_name(&name)));
            std::fs::write(&path, generated)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Prompt { action } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            match action {
                PromptAction::Show => println!("{}", pipeline::prompt_template(&conn)),
                PromptAction::Set { file } => {
                    let template = read_input(&file)?;
                    if !template.contains("{CONTENT}") {
                        tracing::warn!("Template has no {{CONTENT}} placeholder; the outline will not be included");
                    }
                    db::save(&conn, db::CUSTOM_PROMPT_TEMPLATE, &template)?;
                    println!("Custom prompt template saved.");
                }
                PromptAction::Reset => {
                    db::remove(&conn, db::CUSTOM_PROMPT_TEMPLATE)?;
                    println!("Using the built-in prompt template.");
                }
            }
            Ok(())
        }
        Commands::History { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let runs = db::fetch_runs(&conn, limit)?;
            if runs.is_empty() {
                println!("No runs yet.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<14} | {:>5} | {:<19} | {}",
                "#", "Issue", "Cases", "Created", "Link"
            );
            println!("{}", "-".repeat(90));
            for r in &runs {
                println!(
                    "{:>4} | {:<14} | {:>5} | {:<19} | {}",
                    r.id,
                    truncate(&r.identifier, 14),
                    r.case_count,
                    r.created_at,
                    r.link
                );
            }
            Ok(())
        }
        Commands::Ping => {
            let client = GenerationClient::new(&settings)?;
            let status = client.ping().await?;
            println!("API test successful: {} ({})", settings.api_url, status);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn print_cases(generated: &str) {
    let cases = result::test_cases(generated);
    if cases.is_empty() {
        println!("{}", result::RESULT_NOT_FOUND);
        return;
    }
    for (i, case) in cases.iter().enumerate() {
        println!("{:>3}. {}", i + 1, case);
    }
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
