use agent_orchestra::config::{Settings, ENV_HINT};
use agent_orchestra::crew::Team;
use agent_orchestra::events::EventBus;
use agent_orchestra::group_chat::{blog_team, StdinInput, BLOG_TASK};
use agent_orchestra::hooks::HookManager;
use agent_orchestra::provider::{GenerateOptions, LlmProvider, OpenAiProvider, TimeoutConfig};
use agent_orchestra::society::{relay_demo, single_session_demo, SessionOutcome};
use agent_orchestra::workflows::email_template::{demo_webhook, EmailTemplateWorkflow};
use agent_orchestra::workflows::supervisor::{SupervisorTeam, DEMO_TASK};
use agent_orchestra::AgentError;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agent-orchestra", version, about = "Multi-agent LLM orchestration demos")]
struct Cli {
    /// Model name, overrides OPENAI_MODEL
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature, overrides OPENAI_TEMPERATURE
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Print transcripts one character at a time, waiting this many milliseconds per character
    #[arg(long, global = true, value_name = "MS")]
    animate: Option<u64>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an e-mail template structure from a webhook body
    EmailTemplate {
        /// Webhook JSON file; the built-in sample is used when omitted
        #[arg(long)]
        payload: Option<PathBuf>,
    },
    /// Product manager, architect, developer and tester under a supervisor
    Supervisor {
        #[arg(long, default_value = DEMO_TASK, hide_default_value = true)]
        task: String,
    },
    /// Role-playing session between two agents
    RolePlay {
        #[arg(long, value_enum, default_value_t = RolePlayMode::Single)]
        mode: RolePlayMode,
    },
    /// Sequential crew working through preset tasks
    Crew {
        /// research, development or content (or 1, 2, 3)
        #[arg(long, default_value = "development")]
        team: Team,
    },
    /// Round-robin blog-writing chat with a human in the loop
    GroupChat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RolePlayMode {
    Single,
    Relay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e @ AgentError::Configuration(_)) => {
            eprintln!("{}\n\n{}", e, ENV_HINT);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let model = cli.model.clone().unwrap_or_else(|| settings.openai.model.clone());
    let options =
        GenerateOptions::with_temperature(cli.temperature.unwrap_or(settings.openai.temperature));
    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiProvider::builder()
            .api_key(&settings.openai.api_key)
            .model(&model)
            .base_url(&settings.openai.base_url)
            .timeout_config(TimeoutConfig::default())
            .build()
            .context("failed to build the model client")?,
    );
    tracing::info!(model = %model, "provider ready");

    let events = Arc::new(EventBus::default());
    let mut hooks = HookManager::new(events.clone());
    hooks.add(HookManager::transcript_hook(cli.animate.map(Duration::from_millis)));
    hooks.add(HookManager::tracing_hook());
    let monitor = hooks.start_monitoring();
    drop(hooks);

    let result = run(cli.command, &settings, provider, options, events).await;

    // every bus handle is gone now, so the monitor drains and exits
    if monitor.join().is_err() {
        tracing::warn!("event monitor panicked");
    }
    result
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(
    command: Command,
    settings: &Settings,
    provider: Arc<dyn LlmProvider>,
    options: GenerateOptions,
    events: Arc<EventBus>,
) -> anyhow::Result<()> {
    match command {
        Command::EmailTemplate { payload } => {
            let body = match payload {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("{} is not valid JSON", path.display()))?
                }
                None => demo_webhook(),
            };

            banner("邮件模板生成工作流");
            let workflow = EmailTemplateWorkflow::from_settings(settings, provider, options)?
                .with_events(events);
            let state = workflow.run(body).await?;

            match &state.error {
                Some(error) => println!("\n工作流在 {} 之后停止: {}", state.current_step, error),
                None => {
                    let result = state.final_result.unwrap_or_default();
                    println!("\n最终结果:\n{}", serde_json::to_string_pretty(&result)?);
                }
            }
        }
        Command::Supervisor { task } => {
            banner("多智能体协作系统");
            let team = SupervisorTeam::new(provider, options, events)?;
            let state = team.run(&task).await?;
            println!("\n{}", state.final_result);
        }
        Command::RolePlay { mode } => match mode {
            RolePlayMode::Single => {
                banner("角色扮演：单次会话");
                let outcome = single_session_demo(provider, options, events).await?;
                print_outcome(&outcome);
            }
            RolePlayMode::Relay => {
                banner("角色扮演：多轮接力");
                for outcome in relay_demo(provider, options, events).await? {
                    print_outcome(&outcome);
                }
            }
        },
        Command::Crew { team } => {
            banner(&format!("Crew：{}", team.label()));
            let crew = team
                .crew()
                .provider(provider)
                .options(options)
                .events(events)
                .build()?;
            let output = crew.kickoff().await?;
            println!("\n最终输出:\n{}", output);
        }
        Command::GroupChat => {
            banner("轮询群聊：技术博客创作");
            let input = StdinInput::new().with_events(events.clone());
            let mut team = blog_team(provider, options, Box::new(input), events)?;
            let result = team.run(BLOG_TASK).await?;
            println!(
                "\n共 {} 条消息，停止原因: {}",
                result.messages.len(),
                result.stop_reason.as_deref().unwrap_or("无")
            );
        }
    }
    Ok(())
}

fn banner(title: &str) {
    println!("{}", "=".repeat(80));
    println!("{}", title);
    println!("{}", "=".repeat(80));
}

fn print_outcome(outcome: &SessionOutcome) {
    println!(
        "\n{} ↔ {}: {} 轮{}",
        outcome.user_role,
        outcome.assistant_role,
        outcome.exchanges.len(),
        if outcome.terminated { "，任务已完成" } else { "" }
    );
    if let Some(error) = &outcome.error {
        println!("会话中断: {}", error);
    }
}
