//! Command and message handlers for the Telegram bot.

use std::sync::Arc;

use chrono::Utc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::User;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use sitepulse_dispatch::{OutboundMessage, Severity};
use sitepulse_models::LogEntry;
use sitepulse_report::{Period, ReportError};

use crate::state::AppState;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Compile and send today's report now: /report [site]")]
    Report(String),

    #[command(description = "Receive alerts and reports in this chat: /setalerts [site]")]
    SetAlerts(String),
}

/// Dispatches one parsed command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg).await,
        Command::Help => handle_help(bot, msg).await,
        Command::Report(site) => handle_report(bot, msg, state, site).await,
        Command::SetAlerts(site) => handle_setalerts(bot, msg, state, site).await,
    }
}

/// Resolves an optional site argument to the configured default.
fn site_of(state: &AppState, arg: &str) -> sitepulse_models::SiteId {
    let arg = arg.trim();
    if arg.is_empty() {
        state.config.site()
    } else {
        sitepulse_models::SiteId::new(arg)
    }
}

/// Handle the /start command.
async fn handle_start(bot: Bot, msg: Message) -> ResponseResult<()> {
    let name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| "there".to_string());

    let welcome = format!(
        "Ahlan {name}! I am the Sitepulse site coordinator. 👷‍♂️\n\n\
         Send me site photos or text updates during the day; they go into \
         the daily report. I also watch the weather and raise alerts.\n\n\
         Type /help for all commands."
    );
    bot.send_message(msg.chat.id, welcome).await?;

    info!(chat_id = %msg.chat.id, "user started bot");
    Ok(())
}

/// Handle the /help command.
async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// Handle the /report command: compile today's report and deliver it here.
async fn handle_report(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    site_arg: String,
) -> ResponseResult<()> {
    if !is_admin(&state, msg.from.as_ref()) {
        bot.send_message(msg.chat.id, "عذراً، هذا الأمر متاح للمشرفين فقط. ⛔")
            .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        "جاري تحليل بيانات الموقع وإعداد التقرير... 🤖🧠",
    )
    .await?;

    let site = site_of(&state, &site_arg);
    let offset = state.config.utc_offset();
    let today = Utc::now().with_timezone(&offset).date_naive();

    match state.compiler.compile(&site, Period::day(today, offset)).await {
        Ok(compiled) => {
            let message = OutboundMessage::ReportReady {
                report_id: compiled.record.report_id.to_string(),
                report_date: today,
                file: compiled.file,
            };
            if let Err(e) = state.dispatcher.dispatch(msg.chat.id.0, message, Severity::Info) {
                warn!(error = %e, "failed to enqueue manual report");
                bot.send_message(msg.chat.id, "Could not queue the report for delivery.")
                    .await?;
            }
        }
        Err(ReportError::CompileInFlight(_)) => {
            bot.send_message(
                msg.chat.id,
                "A report for this site is already being generated. ⏳",
            )
            .await?;
        }
        Err(e) => {
            error!(error = %e, "manual report compilation failed");
            bot.send_message(msg.chat.id, "Report generation failed. Please try again later.")
                .await?;
        }
    }

    Ok(())
}

/// Handle the /setalerts command: this chat becomes the site's destination.
async fn handle_setalerts(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    site_arg: String,
) -> ResponseResult<()> {
    if !is_admin(&state, msg.from.as_ref()) {
        bot.send_message(msg.chat.id, "عذراً، هذا الأمر متاح للمشرفين فقط. ⛔")
            .await?;
        return Ok(());
    }

    let site = site_of(&state, &site_arg);
    match state
        .settings
        .set_alert_destination(&site, msg.chat.id.0)
        .await
    {
        Ok(()) => {
            info!(chat_id = %msg.chat.id, site_id = %site, "alert destination set");
            bot.send_message(
                msg.chat.id,
                "✅ تم تعيين هذه المجموعة لاستلام التنبيهات والتقارير.\n\
                 This chat will now receive alerts and reports.",
            )
            .await?;
        }
        Err(e) => {
            error!(error = %e, "failed to save alert destination");
            bot.send_message(msg.chat.id, "حدث خطأ أثناء حفظ الإعدادات.")
                .await?;
        }
    }

    Ok(())
}

/// Handles a plain text update: silently appended to the log store.
pub async fn handle_text(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (author_id, author_name) = author_of(msg.from.as_ref());

    let entry = LogEntry::text(state.config.site(), author_id, author_name, text);
    match state.store.record(&entry).await {
        Ok(()) => debug!(chat_id = %msg.chat.id, "text update logged"),
        Err(e) => warn!(chat_id = %msg.chat.id, error = %e, "failed to record text update"),
    }

    Ok(())
}

/// Handles a photo update: download, store under the day's photo
/// directory, and append a photo entry (with caption, if any).
pub async fn handle_photo(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Largest size last.
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    let today = Utc::now()
        .with_timezone(&state.config.utc_offset())
        .date_naive();
    let dir = state.photo_dir(today);

    let saved = async {
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.jpg", photo.file.unique_id));
        let file = bot.get_file(photo.file.id.clone()).await.map_err(|e| {
            std::io::Error::other(e.to_string())
        })?;
        let mut dst = tokio::fs::File::create(&path).await?;
        bot.download_file(&file.path, &mut dst)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok::<_, std::io::Error>(path)
    }
    .await;

    let path = match saved {
        Ok(path) => path,
        Err(e) => {
            error!(chat_id = %msg.chat.id, error = %e, "failed to save photo");
            bot.send_message(msg.chat.id, "Failed to process photo.")
                .await?;
            return Ok(());
        }
    };
    info!(chat_id = %msg.chat.id, path = %path.display(), "photo saved");

    let (author_id, author_name) = author_of(msg.from.as_ref());
    let entry = LogEntry::photo(
        state.config.site(),
        author_id,
        author_name,
        path.to_string_lossy().to_string(),
        msg.caption().map(str::to_string),
    );
    if let Err(e) = state.store.record(&entry).await {
        warn!(chat_id = %msg.chat.id, error = %e, "failed to record photo entry");
    }

    bot.send_message(msg.chat.id, "📸").await?;
    Ok(())
}

fn is_admin(state: &AppState, user: Option<&User>) -> bool {
    user.map(|u| state.config.is_admin(u.id.0 as i64))
        .unwrap_or(false)
}

fn author_of(user: Option<&User>) -> (String, String) {
    match user {
        Some(user) => {
            let id = user.id.0.to_string();
            let name = user.username.clone().unwrap_or_else(|| id.clone());
            (id, name)
        }
        None => ("unknown".to_string(), "unknown".to_string()),
    }
}
