//! Ringside Engine - runs the weekly backstage update for one company.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ringside_engine::infrastructure::config::EngineConfig;
use ringside_engine::use_cases::LockerRoomConditions;
use ringside_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ringside_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(db = %config.db_path, weeks = config.weeks, "Starting Ringside Engine");

    let Some(company_id) = config.company_id else {
        anyhow::bail!("RINGSIDE_COMPANY_ID must be set to a company UUID");
    };

    let app = App::from_config(&config).await?;
    let conditions = LockerRoomConditions {
        morale: config.morale,
        rumors: config.rumors,
    };

    for week in 1..=config.weeks {
        let report = app.use_cases.weekly.run(company_id, conditions).await?;
        tracing::info!(week, %report, "Week processed");
    }

    let critical = app.use_cases.crisis.critical_crises(company_id).await?;
    for crisis in &critical {
        let kind = app.use_cases.communication.recommend_kind(crisis);
        let tone = app.use_cases.communication.recommend_tone(crisis, kind);
        tracing::warn!(
            crisis_id = %crisis.id(),
            crisis = %crisis.kind(),
            stage = crisis.stage().as_str(),
            severity = crisis.severity_label(),
            recommended = %kind,
            %tone,
            "Critical crisis needs attention"
        );
    }

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
