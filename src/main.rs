use anyhow::{Context, Result};
use clap::Parser;
use maturity_interviews::config::{CollaboratorMode, InvitationMode, StoreBackend};
use maturity_interviews::invitations::InvitationTransport;
use maturity_interviews::{
    create_router, AppState, Collaborators, Config, InterviewService, InterviewStore,
    Invitations, MemoryStore, NatsClient, NatsKvStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "maturity-interviews", about = "Voice-driven digital maturity interviews")]
struct Args {
    /// Config file, without extension
    #[arg(long, default_value = "config/maturity-interviews")]
    config: String,

    /// Use scripted collaborators and never send invitations
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    if args.dry_run {
        cfg.collaborators.mode = CollaboratorMode::DryRun;
        cfg.invitations.mode = InvitationMode::DryRun;
    }

    cfg.validate()?;

    info!("Maturity Interviews v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store: Arc<dyn InterviewStore> = match cfg.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store, interviews are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::NatsKv => {
            let url = cfg.nats_url().context("nats.url is required for the nats_kv store")?;
            Arc::new(NatsKvStore::connect(url, &cfg.store.bucket).await?)
        }
    };

    let collaborators = Collaborators::from_config(&cfg).await?;

    let transport = match (cfg.invitations.mode, cfg.nats_url()) {
        (InvitationMode::Deliver, Some(url)) => {
            let nats: Arc<dyn InvitationTransport> = Arc::new(
                NatsClient::connect(url, Duration::from_secs(cfg.nats.request_timeout_secs))
                    .await?,
            );
            Some(nats)
        }
        _ => None,
    };
    let invitations = Invitations::new(&cfg.invitations, &cfg.service.http.public_url, transport);

    let service = Arc::new(InterviewService::new(
        store,
        collaborators,
        invitations,
        cfg.interview.clone(),
    ));
    let state = AppState::new(service, cfg.service.http.denied_redirect.clone());
    let _reaper = state.spawn_reaper();
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
