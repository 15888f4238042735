use std::env;

use ping_warden::{Data, commands, handlers, logging};
use poise::serenity_prelude::{self as serenity};
use serenity::GatewayIntents;
use tracing::info;

/// Main function to run the bot
async fn async_main() -> Result<(), ping_warden::Error> {
    // Initialize logging
    logging::init()?;

    // Load environment variables
    let token = env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN must be set");

    // Load persisted configuration (prefixes, command role overrides)
    let data = Data::load().await;
    let framework_data = data.clone();

    // Configure the Poise framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                dynamic_prefix: Some(|ctx| {
                    Box::pin(async move {
                        let prefix = ctx
                            .guild_id
                            .map(|guild_id| ctx.data.prefix(guild_id.get()))
                            .unwrap_or_else(|| ctx.data.config.default_prefix.clone());
                        Ok(Some(prefix))
                    })
                }),
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_start(ctx);
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_end(ctx);
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    logging::log_command_error(&error);
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                logging::log_console("Registering commands".to_string());
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(framework_data)
            })
        })
        .build();

    // Configure the Serenity client
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;
    let mut client = serenity::ClientBuilder::new(token, intents)
        .event_handler(handlers::Handler)
        .framework(framework)
        .await
        .expect("Failed to create client");

    // Make the data reachable from raw gateway handlers too
    {
        let mut type_map = client.data.write().await;
        type_map.insert::<Data>(data);
    }

    info!("Starting bot...");
    if let Err(err) = client.start().await {
        eprintln!("Error starting the bot: {}", err);
    }

    Ok(())
}

fn main() {
    // Run the async main function
    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async_main());

    // Handle any errors that occurred during execution
    if let Err(err) = result {
        eprintln!("Error: {}", err);
    }
}
