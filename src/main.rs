use anyhow::{Context, Result};
use armkit::arm::client::ArmClient;
use armkit::arm::http::format_arm_error;
use armkit::config::Config;
use armkit::resourceids::{
    describe_id, format_id, parse_id, parse_id_insensitively, ResourceGroupId, ResourceId,
    SubscriptionId,
};
use armkit::services::{appplatform, cdn};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Azure Resource Manager client kit
#[derive(Parser, Debug)]
#[command(name = "armkit", version, about, long_about = None)]
struct Args {
    /// Azure subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Work with resource IDs offline
    #[command(subcommand)]
    Id(IdCommand),
    /// CDN / Front Door profiles
    #[command(subcommand)]
    Cdn(CdnCommand),
    /// Spring Apps
    #[command(subcommand)]
    Spring(SpringCommand),
    /// Persistent settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum IdCommand {
    /// Parse and validate a resource ID
    Parse {
        kind: IdKind,
        id: String,
        /// Accept static segments in any case
        #[arg(long)]
        insensitive: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IdKind {
    Subscription,
    ResourceGroup,
    CdnProfile,
    CdnSecret,
    Spring,
    SpringApp,
    SpringDeployment,
    SpringStorage,
    SpringCertificate,
    SpringCustomizedAccelerator,
    SpringGateway,
}

#[derive(Subcommand, Debug)]
enum CdnCommand {
    #[command(subcommand)]
    Secrets(SecretsCommand),
}

#[derive(ClapArgs, Debug)]
struct ProfileArgs {
    /// Resource group (defaults to the last one used)
    #[arg(short = 'g', long)]
    resource_group: Option<String>,
    #[arg(short, long)]
    profile: String,
}

#[derive(Subcommand, Debug)]
enum SecretsCommand {
    List {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Only secrets with this name
        #[arg(long)]
        name: Option<String>,
    },
    Get {
        #[command(flatten)]
        profile: ProfileArgs,
        name: String,
    },
    Delete {
        #[command(flatten)]
        profile: ProfileArgs,
        name: String,
        /// Return once the service accepts the request
        #[arg(long)]
        no_wait: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SpringCommand {
    #[command(subcommand)]
    Apps(AppsCommand),
    #[command(subcommand)]
    Deployments(DeploymentsCommand),
}

#[derive(ClapArgs, Debug)]
struct ServiceArgs {
    /// Resource group (defaults to the last one used)
    #[arg(short = 'g', long)]
    resource_group: Option<String>,
    /// Spring Apps service name
    #[arg(long)]
    service: String,
}

#[derive(Subcommand, Debug)]
enum AppsCommand {
    List {
        #[command(flatten)]
        service: ServiceArgs,
    },
    Get {
        #[command(flatten)]
        service: ServiceArgs,
        name: String,
    },
    Delete {
        #[command(flatten)]
        service: ServiceArgs,
        name: String,
        #[arg(long)]
        no_wait: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DeploymentsCommand {
    List {
        #[command(flatten)]
        service: ServiceArgs,
        #[arg(long)]
        app: String,
    },
    Start {
        #[command(flatten)]
        service: ServiceArgs,
        #[arg(long)]
        app: String,
        name: String,
    },
    Stop {
        #[command(flatten)]
        service: ServiceArgs,
        #[arg(long)]
        app: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Remember a default subscription
    SetSubscription { subscription_id: String },
    /// Print the current configuration
    Show,
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armkit started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armkit").join("armkit.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armkit").join("armkit.log");
    }
    PathBuf::from("armkit.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_arm_error(&err));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();
    let output = args.output;

    match args.command {
        Command::Id(IdCommand::Parse {
            kind,
            id,
            insensitive,
        }) => emit(&parse_kind(kind, &id, insensitive)?, output),
        Command::Config(ConfigCommand::SetSubscription { subscription_id }) => {
            config.set_subscription(&subscription_id)?;
            emit(&config, output)
        },
        Command::Config(ConfigCommand::Show) => emit(&config, output),
        Command::Cdn(CdnCommand::Secrets(command)) => {
            let client = arm_client(&config, args.subscription.as_deref())?;
            run_secrets(cdn::SecretsClient::new(client.clone()), &client, &mut config, command, output).await
        },
        Command::Spring(command) => {
            let client = arm_client(&config, args.subscription.as_deref())?;
            run_spring(
                appplatform::AppPlatformClient::new(client.clone()),
                &client,
                &mut config,
                command,
                output,
            )
            .await
        },
    }
}

fn arm_client(config: &Config, subscription: Option<&str>) -> Result<ArmClient> {
    let subscription = config.effective_subscription(subscription).context(
        "No subscription configured. Pass --subscription, run 'armkit config set-subscription' or set AZURE_SUBSCRIPTION_ID",
    )?;
    let credentials = armkit::arm::auth::AzureCredentials::from_env()?;
    Ok(ArmClient::with_endpoint(config.effective_endpoint(), credentials, &subscription)?
        .with_poll_settings(config.poll_settings()))
}

/// Resource group from the flag, else the last one used
fn resource_group(config: &mut Config, flag: Option<String>) -> Result<String> {
    let group = flag
        .or_else(|| config.last_resource_group.clone())
        .context("No resource group given. Pass --resource-group")?;
    if let Err(e) = config.set_last_resource_group(&group) {
        tracing::warn!("Failed to save config: {}", e);
    }
    Ok(group)
}

async fn run_secrets(
    secrets: cdn::SecretsClient,
    client: &ArmClient,
    config: &mut Config,
    command: SecretsCommand,
    output: OutputFormat,
) -> Result<()> {
    let profile_id = |config: &mut Config, args: ProfileArgs| -> Result<cdn::ProfileId> {
        let group = resource_group(config, args.resource_group)?;
        Ok(cdn::ProfileId::new(&client.subscription_id, group, args.profile))
    };

    match command {
        SecretsCommand::List { profile, name } => {
            let id = profile_id(config, profile)?;
            let items = match name {
                Some(name) => {
                    secrets
                        .list_by_profile_complete_matching_predicate(
                            &id,
                            armkit::ResourcePredicate::with_name(name),
                        )
                        .await?
                },
                None => secrets.list_by_profile_complete(&id).await?,
            };
            emit(&items, output)
        },
        SecretsCommand::Get { profile, name } => {
            let profile = profile_id(config, profile)?;
            let id = secret_id(&profile, name);
            emit(&secrets.get(&id).await?, output)
        },
        SecretsCommand::Delete {
            profile,
            name,
            no_wait,
        } => {
            let profile = profile_id(config, profile)?;
            let id = secret_id(&profile, name);
            if no_wait {
                let poller = secrets.delete(&id).await?;
                emit(&json!({"id": id.to_string(), "status": poller.status().as_str()}), output)
            } else {
                secrets.delete_then_poll(&id).await?;
                emit(&json!({"id": id.to_string(), "status": "Succeeded"}), output)
            }
        },
    }
}

fn secret_id(profile: &cdn::ProfileId, name: String) -> cdn::SecretId {
    cdn::SecretId::new(
        &profile.subscription_id,
        &profile.resource_group_name,
        &profile.profile_name,
        name,
    )
}

async fn run_spring(
    spring: appplatform::AppPlatformClient,
    client: &ArmClient,
    config: &mut Config,
    command: SpringCommand,
    output: OutputFormat,
) -> Result<()> {
    let spring_id = |config: &mut Config, args: ServiceArgs| -> Result<appplatform::SpringId> {
        let group = resource_group(config, args.resource_group)?;
        Ok(appplatform::SpringId::new(&client.subscription_id, group, args.service))
    };

    match command {
        SpringCommand::Apps(AppsCommand::List { service }) => {
            let id = spring_id(config, service)?;
            emit(&spring.list_apps(&id)?.collect_all().await?, output)
        },
        SpringCommand::Apps(AppsCommand::Get { service, name }) => {
            let id = spring_id(config, service)?.app(name);
            emit(&spring.get_app(&id).await?, output)
        },
        SpringCommand::Apps(AppsCommand::Delete {
            service,
            name,
            no_wait,
        }) => {
            let id = spring_id(config, service)?.app(name);
            if no_wait {
                let poller = spring.delete_app(&id).await?;
                emit(&json!({"id": id.to_string(), "status": poller.status().as_str()}), output)
            } else {
                spring.delete_app_then_poll(&id).await?;
                emit(&json!({"id": id.to_string(), "status": "Succeeded"}), output)
            }
        },
        SpringCommand::Deployments(DeploymentsCommand::List { service, app }) => {
            let id = spring_id(config, service)?.app(app);
            emit(&spring.list_deployments(&id)?.collect_all().await?, output)
        },
        SpringCommand::Deployments(DeploymentsCommand::Start { service, app, name }) => {
            let id = spring_id(config, service)?.app(app).deployment(name);
            spring.start_deployment_then_poll(&id).await?;
            emit(&json!({"id": id.to_string(), "status": "Succeeded"}), output)
        },
        SpringCommand::Deployments(DeploymentsCommand::Stop { service, app, name }) => {
            let id = spring_id(config, service)?.app(app).deployment(name);
            spring.stop_deployment_then_poll(&id).await?;
            emit(&json!({"id": id.to_string(), "status": "Succeeded"}), output)
        },
    }
}

fn parse_kind(kind: IdKind, input: &str, insensitive: bool) -> Result<Value> {
    use appplatform as ap;

    match kind {
        IdKind::Subscription => parsed::<SubscriptionId>(input, insensitive),
        IdKind::ResourceGroup => parsed::<ResourceGroupId>(input, insensitive),
        IdKind::CdnProfile => parsed::<cdn::ProfileId>(input, insensitive),
        IdKind::CdnSecret => parsed::<cdn::SecretId>(input, insensitive),
        IdKind::Spring => parsed::<ap::SpringId>(input, insensitive),
        IdKind::SpringApp => parsed::<ap::AppId>(input, insensitive),
        IdKind::SpringDeployment => parsed::<ap::DeploymentId>(input, insensitive),
        IdKind::SpringStorage => parsed::<ap::StorageId>(input, insensitive),
        IdKind::SpringCertificate => parsed::<ap::CertificateId>(input, insensitive),
        IdKind::SpringCustomizedAccelerator => {
            parsed::<ap::CustomizedAcceleratorId>(input, insensitive)
        },
        IdKind::SpringGateway => parsed::<ap::GatewayId>(input, insensitive),
    }
}

/// Segment values of a parsed ID, keyed by segment name
fn parsed<T: ResourceId>(input: &str, insensitive: bool) -> Result<Value> {
    let id: T = if insensitive {
        parse_id_insensitively(input)?
    } else {
        parse_id(input)?
    };

    let mut segments = Map::new();
    for (segment, value) in T::SEGMENTS
        .iter()
        .filter(|s| s.fixed_value().is_none())
        .zip(id.values())
    {
        segments.insert(segment.name().to_string(), Value::String(value.to_string()));
    }

    Ok(json!({
        "kind": T::DESCRIPTION,
        "id": format_id(&id),
        "segments": segments,
        "description": describe_id(&id),
    }))
}

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
