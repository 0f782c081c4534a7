use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use mod_triage::classifier::{build_auto_report, ScriptedClassifier};
use mod_triage::config::ModTriageConfig;
use mod_triage::dispatch::Dispatcher;
use mod_triage::gateway::console::ConsoleGateway;
use mod_triage::gateway::{ChannelRef, ResolvedMessage};
use mod_triage::report::{ActorId, Category};
use mod_triage::summary::render_report_summary;
use mod_triage::telemetry::init_telemetry;
use mod_triage::workflow::graph::{Next, INTAKE_GRAPH, REVIEW_GRAPH};

#[derive(Parser)]
#[command(name = "mod-triage")]
#[command(about = "Guided abuse-report intake and moderator review")]
#[command(long_about = "mod-triage walks reporters through a branching report flow and routes \
                        completed reports into a one-at-a-time moderator review queue. \
                        `run` starts a console session for exercising both flows end to end.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the intake and review flows from the console
    Run,
    /// Print the declarative workflow graphs
    Flows,
    /// File an automatic report using scripted classifier answers
    Auto {
        /// Message content to classify
        #[arg(long, default_value = "you will regret this")]
        content: String,
        /// Author of the reported message
        #[arg(long, default_value = "demo-author")]
        author: String,
        /// Classifier answers, first the category then one per level
        answers: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => {
            tokio::runtime::Runtime::new()?.block_on(run_command())
        }
        Some(Commands::Flows) => {
            print_flows();
            Ok(())
        }
        Some(Commands::Auto {
            content,
            author,
            answers,
        }) => tokio::runtime::Runtime::new()?.block_on(auto_command(content, author, answers)),
    }
}

async fn run_command() -> Result<()> {
    let config = ModTriageConfig::load()?;
    init_telemetry(&config.observability.log_level)?;

    let gateway = Arc::new(ConsoleGateway::new());
    let timeout = config
        .intake
        .follow_up_timeout_seconds
        .map(|secs| chrono::Duration::seconds(secs as i64));
    let dispatcher = Arc::new(tokio::sync::Mutex::new(Dispatcher::new(
        gateway.clone(),
        ChannelRef(config.mod_channel),
        timeout,
    )));

    // Expiry timer owned by the dispatch side, not the workflow instances.
    {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(5));
            loop {
                tick.tick().await;
                dispatcher
                    .lock()
                    .await
                    .expire_prompts(chrono::Utc::now())
                    .await;
            }
        });
    }

    println!(
        "mod-triage console. Say `report` to begin, `!<n>` to answer the most recent menu, \
         `help` for usage, Ctrl-D to quit."
    );
    let identity = ActorId::new("console-user");
    let channel = ChannelRef(0);

    use tokio::io::AsyncBufReadExt;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(key) = line.strip_prefix('!') {
            match gateway.last_menu() {
                Some((prompt_id, _)) => {
                    dispatcher
                        .lock()
                        .await
                        .route_choice(&identity, prompt_id, key.trim())
                        .await;
                }
                None => println!("(no outstanding menu)"),
            }
        } else {
            dispatcher
                .lock()
                .await
                .route_message(&identity, channel, line)
                .await;
        }
    }
    Ok(())
}

async fn auto_command(content: String, author: String, answers: Vec<String>) -> Result<()> {
    let config = ModTriageConfig::load()?;
    if !config.classifier.enabled {
        anyhow::bail!(
            "automatic reports are disabled; set classifier.enabled = true \
             (or MOD_TRIAGE_CLASSIFIER__ENABLED=true) to use them"
        );
    }
    let classifier = ScriptedClassifier::new(answers);
    let resolved = ResolvedMessage {
        author_name: author,
        content,
    };
    match build_auto_report(&classifier, ActorId::new("auto-mod"), &resolved).await {
        Some(record) => println!("{}", render_report_summary(&record)),
        None => println!("Classifier could not produce a report for this message."),
    }
    Ok(())
}

fn print_flows() {
    println!("Intake flow:");
    for category in Category::ALL {
        println!("  {category}:");
        let mut node = INTAKE_GRAPH.entry(category);
        while let Some(current) = node {
            let options: Vec<&str> = current.options.iter().map(|o| o.label).collect();
            println!("    [{}] {}", current.attribute, options.join(" | "));
            node = match current.next {
                Next::Node(id) => INTAKE_GRAPH.node(id),
                Next::Branch { arms, .. } => {
                    for &(value, id) in arms {
                        if let Some(target) = INTAKE_GRAPH.node(id) {
                            let options: Vec<&str> =
                                target.options.iter().map(|o| o.label).collect();
                            println!(
                                "      if {value}: [{}] {}",
                                target.attribute,
                                options.join(" | ")
                            );
                        }
                    }
                    None
                }
                Next::Context => {
                    println!("      (free-text context invite)");
                    None
                }
                Next::Block | Next::Complete => None,
            };
        }
        println!("      (block decision, then complete)");
    }

    println!("Review flow:");
    println!("  legitimacy -> category confirm -> sub-type -> severity");
    for category in Category::ALL {
        if let Some(entry) = REVIEW_GRAPH.entry(category) {
            let options: Vec<&str> = entry.options.iter().map(|o| o.label).collect();
            println!("  {category}: {}", options.join(" | "));
        }
    }
}
