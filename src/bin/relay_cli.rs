//! relay-cli - terminal front end for a prompt-relay server.
//!
//! Lines typed on stdin are submitted as prompts. A few lines are local:
//! `:plan` lists the current plan, `:check N` toggles step N, `:execute`
//! sends every checked step, and `:quit` leaves.

use anyhow::Context;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use prompt_relay::api::types::{ClientEvent, MessageKind};
use prompt_relay::client::{Rendered, RelayClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "relay-cli", about = "Chat with a prompt-relay server from the terminal")]
struct Args {
    /// WebSocket endpoint of the server
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

/// Local line commands.
enum Line<'a> {
    Quit,
    ShowPlan,
    Check(&'a str),
    Execute,
    Prompt(&'a str),
}

impl<'a> Line<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            ":quit" => Self::Quit,
            ":plan" => Self::ShowPlan,
            ":execute" => Self::Execute,
            _ => match trimmed.strip_prefix(":check") {
                Some(rest) => Self::Check(rest.trim()),
                None => Self::Prompt(line),
            },
        }
    }
}

/// `ws://host:port/ws` -> `http://host:port`, for printing download links.
fn http_base(ws_url: &str) -> Option<String> {
    let mut url = Url::parse(ws_url).ok()?;
    let scheme = match url.scheme() {
        "wss" => "https",
        _ => "http",
    };
    url.set_scheme(scheme).ok()?;
    url.set_path("");
    url.set_query(None);
    Some(url.as_str().trim_end_matches('/').to_string())
}

fn print_new(client: &mut RelayClient, base: &str) {
    for entry in client.take_new() {
        match entry {
            Rendered::Message(msg) => {
                let tag = match msg.kind {
                    MessageKind::User => "you",
                    MessageKind::System => "system",
                    MessageKind::Error => "error",
                    MessageKind::Assistant => "assistant",
                };
                println!("[{}] {}", tag, msg.text);
            }
            Rendered::Download { label, href, .. } => {
                println!("[file] {} -> {}{}", label, base, href);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let base = http_base(&args.url).unwrap_or_default();

    let (socket, _) = connect_async(args.url.as_str())
        .await
        .with_context(|| format!("Failed to connect to {}", args.url))?;
    tracing::debug!("Connected to {}", args.url);

    let mut client = RelayClient::new();
    client.on_connect();
    print_new(&mut client, &base);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => client.on_frame(&text),
                    Some(Ok(Message::Close(_))) | None => {
                        client.on_disconnect();
                        print_new(&mut client, &base);
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Socket error: {}", e);
                        client.on_disconnect();
                        print_new(&mut client, &base);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let events: Vec<ClientEvent> = match Line::parse(&line) {
                    Line::Quit => break,
                    Line::ShowPlan => {
                        if client.plan().is_empty() {
                            println!("(no plan)");
                        }
                        for (i, step) in client.plan().iter().enumerate() {
                            let mark = if step.checked { "x" } else { " " };
                            println!("[{}] {}. {}", mark, i + 1, step.text);
                        }
                        Vec::new()
                    }
                    Line::Check(n) => {
                        match n.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                            Some(index) if client.toggle_step(index).is_some() => {}
                            _ => println!("No plan step '{}'", n),
                        }
                        Vec::new()
                    }
                    Line::Execute => client.execute_plan(),
                    Line::Prompt(text) => client.submit(text).into_iter().collect(),
                };
                for event in events {
                    let json = serde_json::to_string(&event)?;
                    ws_sender.send(Message::Text(json)).await?;
                }
            }
        }
        print_new(&mut client, &base);
    }

    let _ = ws_sender.send(Message::Close(None)).await;
    Ok(())
}
