use vote_check::utils::{logger, validation::Validate};
use vote_check::{GoogleSheets, UciDirectory, VoteCheckConfig, VoteCheckEngine, VoteCheckError};

async fn run(config: &VoteCheckConfig) -> Result<(), VoteCheckError> {
    config.validate()?;

    let google = GoogleSheets::connect(config).await?;
    let spreadsheet = google.open(&config.election_form).await?;
    let sheet = spreadsheet.worksheet(&config.election_sheet).await?;
    let directory = UciDirectory::new(config.directory_base_url.clone(), config.request_timeout())?;

    VoteCheckEngine::new(sheet, directory, config).run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // .env 不存在也沒關係
    let dotenv = dotenvy::dotenv();

    let config = match VoteCheckConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(false);
            tracing::error!("❌ {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(config.verbose);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = run(&config).await {
        tracing::error!("❌ Vote check failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}
