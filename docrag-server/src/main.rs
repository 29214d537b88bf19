use docrag_server::{Settings, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local development reads .env; deployed environments set real vars.
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env()?;
    logging::init(&settings);
    docrag_server::run(settings).await
}
