//! Bot construction and process wiring.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use sitepulse_clients::{
    ChatCompletionClient, OpenProjectClient, OpenWeatherClient, ProjectApi, SiteAnalyst,
    WeatherApi,
};
use sitepulse_dispatch::{
    formatter_for, Dispatcher as NotificationDispatcher, DispatcherConfig, MessageFormatter,
};
use sitepulse_persistence::{LogStore, ReportCounterStore, SettingsStore};
use sitepulse_report::{HtmlRenderer, ReportCompiler};
use sitepulse_runtime::{DailyScheduler, Runtime, RuntimeConfig, WeatherPoller};

use crate::config::AppConfig;
use crate::error::{BotError, Result};
use crate::handlers::{handle_command, handle_photo, handle_text, Command};
use crate::state::AppState;
use crate::transport::TelegramTransport;

/// The assembled Sitepulse process: Telegram surface plus the runtime's
/// periodic tasks, sharing one shutdown broadcast.
pub struct SitepulseBot {
    bot: Bot,
    state: Arc<AppState>,
    runtime: Runtime,
    poller: Option<WeatherPoller>,
    scheduler: Option<DailyScheduler>,
    dispatch_handle: JoinHandle<()>,
}

impl SitepulseBot {
    /// Wires every component from a validated configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        let bot = Bot::new(&config.bot_token);

        let store = Arc::new(LogStore::new(&config.data_dir));
        let settings = Arc::new(SettingsStore::new(&config.data_dir));
        let counter = Arc::new(ReportCounterStore::new(&config.data_dir));

        let runtime = Runtime::new();

        let formatter: Arc<dyn MessageFormatter> = Arc::from(formatter_for(&config.locale));
        let transport = Arc::new(TelegramTransport::new(bot.clone()));
        let (dispatcher, dispatch_handle) = NotificationDispatcher::spawn(
            transport,
            formatter,
            DispatcherConfig::default(),
            runtime.shutdown_signal(),
        );

        let weather: Arc<dyn WeatherApi> =
            Arc::new(OpenWeatherClient::new(&config.weather_api_key));
        let project: Arc<dyn ProjectApi> = Arc::new(OpenProjectClient::new(
            &config.project_url,
            &config.project_api_key,
        ));
        let analyst: Arc<dyn SiteAnalyst> = Arc::new(ChatCompletionClient::new(
            &config.ai_base_url,
            &config.ai_api_key,
            &config.ai_model,
        ));

        let site = config.site();
        let compiler = Arc::new(
            ReportCompiler::new(
                Arc::clone(&store),
                counter,
                project,
                Arc::clone(&weather),
                Arc::clone(&analyst),
                Arc::new(HtmlRenderer::new(config.data_dir.join("reports"))),
            )
            .with_site(site.clone(), config.latitude, config.longitude),
        );

        let runtime_config = RuntimeConfig::new()
            .with_utc_offset(config.utc_offset())
            .with_report_time(config.report_time)
            .with_site(site.clone(), config.latitude, config.longitude);

        let poller = WeatherPoller::new(
            weather,
            Arc::clone(&settings),
            dispatcher.clone(),
            runtime_config.clone(),
            runtime.shutdown_signal(),
        );
        let scheduler = DailyScheduler::new(
            Arc::clone(&store),
            Arc::clone(&settings),
            analyst,
            Arc::clone(&compiler),
            dispatcher.clone(),
            runtime_config,
            runtime.shutdown_signal(),
        );

        if config.admin_ids.is_empty() {
            warn!("SITEPULSE_ADMIN_IDS not set; admin commands are unrestricted");
        }

        let state = Arc::new(AppState {
            config,
            store,
            settings,
            compiler,
            dispatcher,
        });

        Ok(Self {
            bot,
            state,
            runtime,
            poller: Some(poller),
            scheduler: Some(scheduler),
            dispatch_handle,
        })
    }

    /// Returns the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::Api(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Starts the periodic tasks and runs the long-polling loop until
    /// ctrl-c, then shuts everything down.
    pub async fn run(mut self) -> Result<()> {
        let (poller, scheduler) = match (self.poller.take(), self.scheduler.take()) {
            (Some(poller), Some(scheduler)) => (poller, scheduler),
            _ => return Err(BotError::Runtime(sitepulse_runtime::RuntimeError::AlreadyStarted)),
        };
        self.runtime.start(poller, scheduler)?;

        let state_for_commands = Arc::clone(&self.state);
        let state_for_photos = Arc::clone(&self.state);
        let state_for_texts = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        info!(chat_id = %msg.chat.id, "command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        // Commands that didn't parse fall through to here.
                        msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            bot.send_message(
                                msg.chat.id,
                                format!(
                                    "Unknown command: {}\n\nUse /help to see available commands.",
                                    text.split_whitespace().next().unwrap_or(text)
                                ),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.photo().is_some())
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_photos);
                        async move { handle_photo(bot, msg, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text().map(|t| !t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_texts);
                        async move { handle_text(bot, msg, state).await }
                    }),
            );

        info!("bot is running; send /start to begin");

        teloxide::dispatching::Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|update| async move {
                warn!("unhandled update: {:?}", update);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        // Long polling ended (ctrl-c); wind down the periodic tasks.
        self.runtime.shutdown().await?;
        self.dispatch_handle.abort();

        Ok(())
    }
}
