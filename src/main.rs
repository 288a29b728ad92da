use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use virtplus::cli::{Args, Commands, ConfigDiscovery, CreateArgs};
use virtplus::container::{ResourceMonitor, VirtplusClient};
use virtplus::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "virtplus=debug"
    } else {
        env::DEFAULT_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::ShowConfig = args.command {
        ConfigDiscovery::show_discovery_info();
        return Ok(());
    }

    let mut config = ConfigDiscovery::load(args.config.as_deref())?;
    if let Some(host) = args.host.clone() {
        config.host = host;
    }
    info!("Using daemon at {}", config.host);

    let client = VirtplusClient::with_config(&config)
        .with_context(|| format!("failed to configure client for {}", config.host))?;

    match args.command {
        Commands::Ps => run_ps(&client).await,
        Commands::Inspect { id } => {
            let info = client.inspect_container(&id).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Commands::Create(create) => run_create(&client, &create).await,
        Commands::Rm { id } => {
            client.remove_container(&id).await?;
            println!("{}", id);
            Ok(())
        }
        Commands::Stats { id } => {
            let stats = ResourceMonitor::new(client).stats(&id).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::ShowConfig => Ok(()),
    }
}

async fn run_ps(client: &VirtplusClient) -> anyhow::Result<()> {
    let containers = client.list_containers().await?;

    println!("{:<24} {:<24} {:<48} STATUS", "ID", "NAME", "IMAGE");
    for container in containers {
        println!(
            "{:<24} {:<24} {:<48} {}",
            container.id,
            container.names.join(","),
            container.image,
            container.status
        );
    }
    Ok(())
}

async fn run_create(client: &VirtplusClient, create: &CreateArgs) -> anyhow::Result<()> {
    let config = create.to_container_config()?;
    let id = client
        .create_container(&config, &create.name)
        .await
        .with_context(|| format!("failed to create container from {}", create.image))?;
    println!("{}", id);
    Ok(())
}
