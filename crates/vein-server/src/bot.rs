//! Telegram command surface.
//!
//! Commands mirror what miners have always had: `/start` opens a session,
//! `/stop` closes it with a summary, `/status` shows the numbers and
//! `/boost` hands out a challenge whose solution permanently raises mining
//! power. All business decisions live in the application services; this
//! module only parses commands and formats replies.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;

use vein_application::{BoostService, MiningService, MiningStatus, StartOutcome, StopSummary};
use vein_core::boost::{Challenge, ChallengeKind, POWER_INCREMENT};
use vein_core::error::VeinError;
use vein_core::session::SubjectId;

pub struct BotState {
    mining: Arc<MiningService>,
    boost: Arc<BoostService>,
    challenge_ttl: Duration,
    pending_challenges: Mutex<HashMap<ChatId, Challenge>>,
}

impl BotState {
    pub fn new(mining: Arc<MiningService>, boost: Arc<BoostService>, challenge_ttl: Duration) -> Self {
        Self {
            mining,
            boost,
            challenge_ttl,
            pending_challenges: Mutex::new(HashMap::new()),
        }
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start mining")]
    Start,
    #[command(description = "end the mining session")]
    Stop,
    #[command(description = "view your stats")]
    Status,
    #[command(description = "solve a challenge to raise your mining power")]
    Boost,
    #[command(description = "show this help")]
    Help,
}

/// Runs the dispatcher until shutdown.
pub async fn run(token: String, state: Arc<BotState>) {
    let bot = Bot::new(token);

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_answer));

    tracing::info!("telegram bot is active");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn username_of(msg: &Message) -> Option<String> {
    msg.from.as_ref().and_then(|user| user.username.clone())
}

fn subject_of(msg: &Message) -> SubjectId {
    SubjectId::new(msg.chat.id.to_string())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let Some(username) = username_of(&msg) else {
        bot.send_message(msg.chat.id, "Please set a Telegram username to use this bot.")
            .await?;
        return Ok(());
    };
    let subject = subject_of(&msg);

    let reply = match cmd {
        Command::Start => match state.mining.start(subject, &username).await {
            Ok(outcome) => start_reply(&outcome),
            Err(err) => error_reply(&err),
        },
        Command::Stop => match state.mining.stop(&subject).await {
            Ok(Some(summary)) => stop_reply(&summary),
            Ok(None) => "No active mining session found. Use /start to begin mining!".to_string(),
            Err(err) => error_reply(&err),
        },
        Command::Status => match state.mining.status(&subject, &username).await {
            Ok(status) => status_reply(&status),
            Err(err) => error_reply(&err),
        },
        Command::Boost => {
            let challenge = state.boost.issue_challenge();
            let reply = challenge_reply(&challenge);
            state
                .pending_challenges
                .lock()
                .await
                .insert(msg.chat.id, challenge);
            reply
        }
        Command::Help => Command::descriptions().to_string(),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Plain-text messages are only meaningful as answers to a pending boost
/// challenge; anything else is ignored.
async fn handle_answer(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(answer) = msg.text() else {
        return Ok(());
    };
    let Some(username) = username_of(&msg) else {
        return Ok(());
    };
    let Some(challenge) = state.pending_challenges.lock().await.remove(&msg.chat.id) else {
        return Ok(());
    };

    if challenge.is_expired(Utc::now(), state.challenge_ttl) {
        bot.send_message(
            msg.chat.id,
            "⌛ That challenge has expired. Use /boost to get a new one.",
        )
        .await?;
        return Ok(());
    }

    let reply = match state.boost.redeem(&username, &challenge, answer).await {
        Ok(Some(account)) => format!(
            "✅ Correct! Your mining power is now {:.4}x.\n\nNext boost available in 2 hours.",
            account.mining_power
        ),
        Ok(None) => "❌ Wrong answer. Use /boost to try a new challenge.".to_string(),
        Err(err) => error_reply(&err),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

fn start_reply(outcome: &StartOutcome) -> String {
    if outcome.started {
        format!(
            "🚀 Mining started!\n\n\
             💰 Base Rate: {} VEIN per minute\n\
             ⚡ Your Mining Power: {:.4}x\n\n\
             Keep this chat open to continue mining. Use /stop to end mining session.",
            outcome.base_rate_per_minute, outcome.mining_power
        )
    } else {
        "You are already mining! Use /stop to end your current session.".to_string()
    }
}

fn stop_reply(summary: &StopSummary) -> String {
    format!(
        "⛏ Mining session ended!\n\n\
         ⏱ Duration: {:.2} minutes\n\
         💰 Earnings: {:.3} VEIN\n\n\
         Use /start to begin a new mining session!",
        summary.duration_minutes, summary.session_earned
    )
}

fn status_reply(status: &MiningStatus) -> String {
    let mining_state = if status.is_active {
        "🟢 Currently Mining"
    } else {
        "🔴 Not Mining"
    };
    format!(
        "📊 Mining Status\n\n\
         Status: {}\n\
         Mining Power: {:.4}x\n\
         Total Mined: {:.3} VEIN\n\
         Current Session: {:.3} VEIN\n\n\
         Commands:\n\
         /start - Start mining\n\
         /stop - Stop mining\n\
         /status - View stats\n\
         /boost - Raise mining power",
        mining_state, status.mining_power, status.total_mined, status.session_earned
    )
}

fn challenge_reply(challenge: &Challenge) -> String {
    let task = match challenge.kind {
        ChallengeKind::Math => format!("Solve: {} = ?", challenge.prompt),
        ChallengeKind::Code => format!("Type this code back: {}", challenge.prompt),
    };
    format!(
        "🧩 Boost challenge!\n\n{task}\n\nReply with the answer to gain +{POWER_INCREMENT}x mining power."
    )
}

fn error_reply(err: &VeinError) -> String {
    match err {
        VeinError::NotFound { .. } => {
            "User not found. Please use /start to begin mining!".to_string()
        }
        VeinError::InvalidInput(message) => format!("⚠️ {message}"),
        err if err.is_transient() => {
            "⚠️ Temporarily unavailable. Please try again later.".to_string()
        }
        _ => "Something went wrong. Please try again later.".to_string(),
    }
}
