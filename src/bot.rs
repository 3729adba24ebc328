use poise::serenity_prelude as serenity;
use std::{future::Future, sync::Arc};

use color_eyre::{
    eyre::{eyre, ErrReport},
    Result,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::{
    config::Config,
    events::InboundEvent,
    gateway::{
        discord::{DiscordGateway, DiscordSession},
        Gateway, Session,
    },
    liveness::{HttpProbe, Supervisor, SupervisorHandle},
    polls::PollEngine,
    wisps,
};

pub struct Bot {
    pub config: Arc<Config>,
    pub gateway: Arc<dyn Gateway>,
    pub polls: PollEngine,
    pub liveness: SupervisorHandle,
    scheduler: JobScheduler,
}

pub type CommandContext<'a> = poise::Context<'a, Bot, ErrReport>;

#[derive(Clone)]
pub struct JobContext {
    pub(crate) liveness: SupervisorHandle,
    pub(crate) polls: PollEngine,
}

fn make_job<F, Fut>(name: &str, schedule: &str, callback: F, ctx: JobContext) -> Result<Job>
where
    F: Send + Sync + Copy + FnOnce(JobContext) -> Fut + 'static,
    Fut: Send + Future<Output = Result<()>>,
{
    let job_name = name.to_owned();
    Job::new_async(schedule, move |_uuid, _lock| {
        let job_name = job_name.clone();
        let ctx = ctx.clone();
        Box::pin(async move {
            match callback(ctx).await {
                Ok(()) => {
                    info!("Job {job_name} completed successfully.");
                }
                Err(e) => {
                    error!("Job {job_name} failed: {e}");
                }
            }
        })
    })
    .map_err(|e| eyre!("failed to create job {name}: {e}"))
}

impl Bot {
    /// Wire the core services to a connected client. Called once, from setup.
    async fn start(
        config: Arc<Config>,
        ctx: &serenity::Context,
        session: Arc<dyn Session>,
    ) -> Result<Self> {
        let gateway: Arc<dyn Gateway> = Arc::new(DiscordGateway::new(ctx.http.clone()));

        let loopback = HttpProbe::new(config.loopback_url(), config.liveness.probe_timeout)?;
        let liveness = Supervisor::new(config.liveness.clone(), session, Arc::new(loopback)).spawn();

        let (polls, reports) = PollEngine::new(gateway.clone());
        tokio::spawn(wisps::polls::results::announce(reports, gateway.clone()));

        let bot = Bot {
            config,
            gateway,
            polls,
            liveness,
            scheduler: JobScheduler::new().await?,
        };

        if let Err(e) = bot.spawn_scheduler().await {
            error!("Failed to setup scheduler: {e}");
        }

        Ok(bot)
    }

    async fn spawn_scheduler(&self) -> Result<()> {
        info!("Spawning scheduler");

        let job_ctx = JobContext {
            liveness: self.liveness.clone(),
            polls: self.polls.clone(),
        };

        self.scheduler
            .add(make_job(
                "heartbeat::report_alive",
                &self.config.heartbeat_schedule,
                wisps::heartbeat::jobs::report_alive,
                job_ctx,
            )?)
            .await?;

        self.scheduler.start().await?;

        Ok(())
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &poise::Event<'_>,
    _framework: poise::FrameworkContext<'_, Bot, ErrReport>,
    bot: &Bot,
) -> Result<(), ErrReport> {
    let Some(event) = InboundEvent::from_poise(event) else {
        return Ok(());
    };

    match event {
        InboundEvent::Ready { name } => {
            info!("{name} connected successfully");
        }
        InboundEvent::MemberJoined(member) => {
            if let Err(e) = wisps::welcome::listeners::dispatch(ctx, member, bot).await {
                error!("Failed to welcome {}: {e}", member.user.name);
            }
        }
        InboundEvent::MessagePosted(message) => {
            if let Err(e) = wisps::reactions::listeners::dispatch(ctx, message).await {
                error!("Failure in message listeners: {e}");
            }
        }
        InboundEvent::ConnectionChanged { connected } => {
            bot.liveness.report_connection(connected);
        }
    }
    Ok(())
}

pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let setup_config = config.clone();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: wisps::commands(),
            event_handler: |ctx, event, framework, bot| {
                Box::pin(event_handler(ctx, event, framework, bot))
            },
            ..Default::default()
        })
        .token(config.discord_token.clone())
        .intents(intents)
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                if let Some(guild_id) = setup_config.guild {
                    info!("Setting up slash commands for guild {guild_id}");
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        guild_id,
                    )
                    .await?;
                } else {
                    info!("Setting up global slash commands");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                let session = Arc::new(DiscordSession::new(
                    framework.shard_manager().clone(),
                    setup_config.liveness.probe_timeout,
                ));
                Bot::start(setup_config, ctx, session).await
            })
        });

    framework.run().await?;

    Ok(())
}
