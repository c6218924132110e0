use stagehand_workspace::Project;
use std::path::PathBuf;
use std::time::Duration;

/// Watch a project directory and report scene documents as they change.
/// Mostly a development harness; the real surface is the library API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut root = std::env::current_dir()?;
    let mut interval_ms: u64 = 250;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--interval" => {
                if i + 1 < args.len() {
                    interval_ms = args[i + 1].parse()?;
                    i += 2;
                } else {
                    eprintln!("--interval requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Usage: watch [OPTIONS] [ROOT_DIR]");
                println!();
                println!("Options:");
                println!("  --interval <MS>   Poll interval in milliseconds (default: 250)");
                println!("  -h, --help        Show this help message");
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                root = PathBuf::from(arg);
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    if !root.exists() {
        return Err(anyhow::anyhow!("Root directory does not exist: {}", root.display()));
    }

    let mut project = Project::new(&root);
    for entry in std::fs::read_dir(&root)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tsx") {
            project.get_source_file(&path).await?;
        }
    }

    let _sub = project.on_document_changed(|path| {
        tracing::info!("changed {}", path.display());
    });

    project.watch()?;
    tracing::info!("watching {} (ctrl-c to stop)", root.display());

    loop {
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        for path in project.poll_fs_events().await? {
            match project.locate(&path, "default") {
                Ok(nodes) => {
                    tracing::info!("{}: {} root element(s)", path.display(), nodes.len());
                }
                Err(e) => {
                    tracing::warn!("{}: {}", path.display(), e);
                }
            }
        }
    }
}
