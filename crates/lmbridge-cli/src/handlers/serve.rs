//! Serve command handler.
//!
//! Runs the supervisor in the foreground, tailing the operational log to
//! the terminal until Ctrl-C.

use std::sync::Arc;

use anyhow::Result;

use lmbridge_core::ports::EchoRuntime;
use lmbridge_core::settings::ServerSettings;
use lmbridge_host::ServerSupervisor;

/// Execute the serve command.
pub async fn execute(model: String, port: u16, host: String, echo: bool) -> Result<()> {
    let supervisor = ServerSupervisor::new();

    if echo {
        println!("Attaching built-in echo engine (smoke-test mode)");
        supervisor.attach_runtime(Arc::new(EchoRuntime));
    }

    let settings = ServerSettings {
        host,
        port,
        model_name: model,
    };
    let addr = supervisor.start(settings).await?;

    println!("Server listening on http://{addr}");
    println!("OpenAI-compatible base URL: http://{addr}/v1");
    if !echo {
        println!("No inference runtime attached; requests answer 503 until one is.");
    }
    println!("Press Ctrl-C to stop");

    // Tail the operational log for the terminal observer.
    let mut entries = supervisor.subscribe_logs();
    let tail = tokio::spawn(async move {
        while let Ok(entry) = entries.recv().await {
            match &entry.detail {
                Some(detail) => println!("[{}] {} ({detail})", entry.level, entry.message),
                None => println!("[{}] {}", entry.level, entry.message),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");
    supervisor.stop().await?;
    tail.abort();

    Ok(())
}
