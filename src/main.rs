use std::sync::Arc;

use log::*;
use service::{
    config::{Command, Config},
    logging::Logger,
};
use solar_auth::{
    api::HttpAuthApi,
    navigation::MemoryNavigator,
    storage::{DurableStorage, FileStorage},
    token::TokenStore,
    AuthProvider, AuthStateMachine, Error,
};
use url::Url;
use uuid::Uuid;

/// Durable storage key of the generated client id, used when none is configured.
const CLIENT_ID_KEY: &str = "solar_oauth_client_id";

#[tokio::main]
async fn main() {
    let config = Config::new();

    Logger::init_logger(&config);

    info!("Starting Solar auth client");

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Error> {
    let storage = Arc::new(FileStorage::new(config.storage_path()));
    let client_id = resolve_client_id(&config, storage.as_ref())?;
    debug!("Using client id {}", client_id);

    let command = config.command();
    let location = match &command {
        Command::Callback { url } => Url::parse(url)?,
        _ => Url::parse(&config.redirect_uri)?,
    };
    let navigator = MemoryNavigator::new(location);

    let settings = config.auth_settings(&client_id);
    let api = HttpAuthApi::new(settings.endpoints.clone(), config.http_client_config())?;
    let machine = Arc::new(AuthStateMachine::new(
        Arc::new(TokenStore::new(storage)),
        Arc::new(api),
        Arc::new(navigator.clone()),
        settings,
    ));

    match command {
        Command::Login => {
            // Only the redirect is needed, so no session is initialized here.
            machine.login()?;
            if let Some(target) = navigator.last_redirect() {
                println!("Open this URL to sign in:\n{}", target);
            }
        }
        Command::Status | Command::Callback { .. } => {
            let provider = AuthProvider::mount(machine, config.http_client_config()).await?;
            print_status(&provider);
        }
        Command::Logout => {
            let provider = AuthProvider::mount(machine, config.http_client_config()).await?;
            provider.logout().await;
            println!("Signed out");
        }
    }

    Ok(())
}

fn resolve_client_id(config: &Config, storage: &dyn DurableStorage) -> Result<String, Error> {
    if let Some(client_id) = config.client_id() {
        return Ok(client_id.to_string());
    }
    if let Some(client_id) = storage.get(CLIENT_ID_KEY)? {
        return Ok(client_id);
    }

    let client_id = Uuid::new_v4().to_string();
    info!("Generated client id {}", client_id);
    storage.set(CLIENT_ID_KEY, &client_id)?;
    Ok(client_id)
}

fn print_status(provider: &AuthProvider) {
    provider.signed_in(|user| {
        println!("Signed in as {} (sub {})", user.email, user.sub);
    });
    provider.signed_out(|| {
        println!("Not signed in. Run `login` to start a session.");
    });

    let context = provider.context();
    debug!(
        "Auth context: logged_in={}, loading={}, client_ready={}",
        context.is_logged_in, context.auth_loading, context.client_ready
    );
}
