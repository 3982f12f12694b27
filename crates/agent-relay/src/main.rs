//! A simple program demonstrates how to use `agent-relay` as a library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use agent_relay::SessionBuilder;
use agent_relay::core::ResponseStream;
use agent_relay::model::ModelResponseEvent;
use agent_relay::openai::{OpenAIConfigBuilder, OpenAIProvider};
use anyhow::Context as _;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";

/// Chats with a router agent that looks up the weather and hands
/// translations off to a translator agent.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// The model identifier.
    #[arg(long, env = "OPENAI_MODEL")]
    model: String,

    /// Base URL of the OpenAI-compatible endpoint.
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Variable holding the API key, e.g. XAI_API_KEY for Grok.
    #[arg(long)]
    api_key_env: Option<String>,

    /// Sampling temperature.
    #[arg(long)]
    temperature: Option<f32>,

    /// Print replies as they arrive. Tool calls are not dispatched.
    #[arg(long)]
    stream: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    debug!("starting with {args:?}");

    let mut config = OpenAIConfigBuilder::with_model(args.model);
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(api_key_env) = args.api_key_env {
        config = config.with_api_key_env(api_key_env);
    }
    if let Some(temperature) = args.temperature {
        config = config.with_temperature(temperature);
    }
    let config = config.build().context("invalid model configuration")?;
    let model_provider = OpenAIProvider::new(config);

    let mut session = SessionBuilder::with_model_provider(model_provider)
        .with_instruction(
            include_str!("./router_prompt.md")
                .replace("{{HOST_OS}}", host_os()),
        )
        .build()?;

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let thinking = || {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar
    };

    let mut lines = io::BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let progress_bar = thinking();
        if args.stream {
            let stream = session.send_message_stream(line).await;
            progress_bar.finish_and_clear();
            match stream {
                Ok(stream) => print_stream(stream).await?,
                Err(err) => print_error(&err),
            }
        } else {
            let reply = session.send_message(line).await;
            progress_bar.finish_and_clear();
            match reply {
                Ok(reply) => println!(
                    "{}🤖 {}",
                    BAR_CHAR.bright_cyan(),
                    reply.content.unwrap_or_default().bright_white()
                ),
                Err(err) => print_error(&err),
            }
        }
    }
    Ok(())
}

async fn print_stream(mut stream: ResponseStream) -> anyhow::Result<()> {
    print!("{}🤖 ", BAR_CHAR.bright_cyan());
    loop {
        let event = match stream.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                println!();
                print_error(&err);
                return Ok(());
            }
        };
        match event {
            ModelResponseEvent::MessageDelta(text) => {
                print!("{}", text.bright_white());
            }
            ModelResponseEvent::ToolCall(call) => {
                print!("{}", format!("[{}]", call.name).dimmed());
            }
            ModelResponseEvent::Completed(_) => break,
        }
        std::io::stdout().flush()?;
    }
    println!();
    Ok(())
}

fn print_error(err: &agent_relay::core::Error) {
    error!("turn failed: {err:?}");
    println!("{}❌ {}", BAR_CHAR.bright_red(), err.bright_red());
}

#[inline]
fn host_os() -> &'static str {
    let os = std::env::consts::OS;
    match os {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "some other OS",
    }
}
