//! Foldcard - four-faced card designer, headless driver
//!
//! Replays a script of editor commands against the face/texture core and
//! writes every exported file to the output directory.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use foldcard_ipc::{EditorEvent, NotificationLevel, parse_commands};
use foldcard_scene::Editor;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;

use config::Cli;
use render::HeadlessScene;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foldcard=info,foldcard_scene=info,drawing=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let editor_config = cli.editor_config()?;

    if cli.print_config {
        print!("{}", editor_config.to_toml_string()?);
        return Ok(());
    }

    info!("Starting Foldcard");
    let mut editor = Editor::new(editor_config);
    editor.subscribe(log_notification);

    let Some(script) = &cli.script else {
        info!("No script given, nothing to replay");
        return Ok(());
    };
    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("Failed to create {}", cli.out.display()))?;

    let exported = replay(&mut editor, script, &cli.out).await?;

    let mut scene = HeadlessScene::default();
    editor.sync_scene(&mut scene);
    scene.report();
    let previews = scene.write_previews(&cli.out)?;

    info!(
        "Replay finished: {} exports, {} previews, {} material updates",
        exported,
        previews,
        scene.updates()
    );
    editor.end_session();
    Ok(())
}

/// Run every command in the script, writing exports to `out`
async fn replay(editor: &mut Editor, script: &Path, out: &Path) -> Result<usize> {
    let source = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let commands = parse_commands(&source)
        .with_context(|| format!("Failed to parse {}", script.display()))?;
    info!("Replaying {} commands from {}", commands.len(), script.display());

    let mut exported = 0;
    for (step, command) in commands.into_iter().enumerate() {
        match editor.dispatch(command) {
            Ok(Some(file)) => {
                file.write_to(out)?;
                exported += 1;
            }
            Ok(None) => {}
            Err(e) => warn!("Step {} failed: {}", step + 1, e),
        }
        editor.wait_for_imports().await;
        editor.drain_events();
    }
    Ok(exported)
}

fn log_notification(event: &EditorEvent) {
    if !event.is_toast() {
        return;
    }
    let note = event.notification();
    match note.level {
        NotificationLevel::Info => info!("{}", note.message),
        NotificationLevel::Error => error!("{}", note.message),
    }
}
