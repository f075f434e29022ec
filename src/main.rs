//! Runs one scripted session against the in-process stub transport: connect,
//! a client request, a bot-issued function call, then disconnect.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rtvi_client::{
    ConnectParams, ConnectionEndpoint, RtviClient, RtviClientCallbacks, RtviClientOptions,
    StubTransport,
};
use rtvi_core::{Event, EventKind, Message, MessageType, RtviError};
use rtvi_settings::ClientSettings;
use rtvi_telemetry::{TelemetryConfig, init_telemetry};
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "rtvi", version, about = "Run a scripted RTVI session")]
struct Cli {
    /// Settings file (default: ~/.rtvi/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level, overriding settings.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json: bool,

    /// Fetch connection params from this URL before connecting.
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.settings {
        Some(path) => rtvi_settings::load_settings_from_path(path),
        None => rtvi_settings::load_settings(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("rtvi: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if cli.json {
        settings.logging.json = true;
    }

    let _telemetry = init_telemetry(&TelemetryConfig::from_settings(&settings.logging));

    match run(&settings, cli.endpoint).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, kind = e.kind(), "session failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &ClientSettings, endpoint: Option<String>) -> Result<(), RtviError> {
    let stub = Arc::new(StubTransport::new().with_responder(echo));

    let callbacks = RtviClientCallbacks::new()
        .on(EventKind::TransportStateChanged, |event| {
            if let Event::TransportStateChanged { state } = event {
                info!(%state, "transport state");
            }
        })
        .on(EventKind::BotReady, |event| {
            if let Event::BotReady { data } = event {
                info!(version = %data.version, "bot ready");
            }
        });
    let client = RtviClient::new(
        RtviClientOptions::from_settings(stub.clone(), settings).callbacks(callbacks),
    );

    client.register_function_call_handler("get_weather", |params| async move {
        let location = params.arguments["location"].as_str().unwrap_or("nowhere").to_string();
        Some(json!({"location": location, "conditions": "sunny"}))
    });
    let _ = client.on(EventKind::LlmFunctionCall, |event| {
        if let Event::LlmFunctionCall { data } = event {
            info!(function_name = %data.function_name, "bot called a function");
        }
    });

    let params = endpoint.map(|url| ConnectParams::Endpoint(ConnectionEndpoint::new(url)));
    let _ = client.connect(params).await?;

    let reply = client
        .send_client_request("echo", Some(json!({"hello": "bot"})), None)?
        .await?;
    info!(%reply, "echo reply");

    stub.receive(Message::new(
        MessageType::LlmFunctionCall,
        json!({
            "function_name": "get_weather",
            "tool_call_id": "call-1",
            "args": {"location": "Lisbon"}
        }),
    ));
    let answered = tokio::time::timeout(Duration::from_secs(1), async {
        while stub.sent_of_type(&MessageType::LlmFunctionCallResult).is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    if answered.is_err() {
        warn!("function call result was not sent");
    }

    client.disconnect().await
}

/// Answer each client-message with a server-response echoing its payload.
fn echo(message: &Message) -> Option<Message> {
    (message.msg_type() == &MessageType::ClientMessage).then(|| {
        Message::with_id(
            message.id().clone(),
            MessageType::ServerResponse,
            message.data().clone(),
        )
    })
}
