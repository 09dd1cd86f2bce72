// ==========================================
// 减停排程系统 - 命令行入口
// ==========================================
// 子命令: plan / medications / validate-protocol
// 输出: 排程写 stdout,日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taper_planner::api::{render, DoseFields, ExportFormat, TaperApi, TaperForm};
use taper_planner::config::{default_protocol_path, EngineConfig};
use taper_planner::logging::{self, LogFormat};

/// 苯二氮䓬类药物减停排程
#[derive(Parser)]
#[command(name = "taper-planner")]
#[command(about = "Benzodiazepine taper schedule planner", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a taper schedule from the current doses
    Plan(PlanArgs),

    /// List medications with known tablet strengths
    Medications {
        /// Protocol file (defaults to $TAPER_PLANNER_PROTOCOL, the user config dir, then the built-in data)
        #[arg(long)]
        protocol: Option<PathBuf>,
    },

    /// Load and validate a protocol file
    ValidateProtocol {
        /// Protocol file (defaults to the resolved default location)
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct PlanArgs {
    /// Primary medication, e.g. alprazolam
    #[arg(long)]
    medication: String,

    #[arg(long, default_value = "")]
    morning: String,
    #[arg(long, default_value = "")]
    midday: String,
    #[arg(long, default_value = "")]
    afternoon: String,
    #[arg(long, default_value = "")]
    night: String,

    /// Patient also takes diazepam
    #[arg(long)]
    with_diazepam: bool,

    #[arg(long, default_value = "", requires = "with_diazepam")]
    diazepam_morning: String,
    #[arg(long, default_value = "", requires = "with_diazepam")]
    diazepam_midday: String,
    #[arg(long, default_value = "", requires = "with_diazepam")]
    diazepam_afternoon: String,
    #[arg(long, default_value = "", requires = "with_diazepam")]
    diazepam_night: String,

    /// Start date, M/D/YYYY
    #[arg(long)]
    start_date: String,

    /// Protocol file (defaults to $TAPER_PLANNER_PROTOCOL, the user config dir, then the built-in data)
    #[arg(long)]
    protocol: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ExportFormat::Text,
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Csv => ExportFormat::Csv,
        }
    }
}

impl PlanArgs {
    fn form(&self) -> TaperForm {
        TaperForm {
            medication: self.medication.clone(),
            doses: DoseFields::new(&self.morning, &self.midday, &self.afternoon, &self.night),
            diazepam: self.with_diazepam.then(|| {
                DoseFields::new(
                    &self.diazepam_morning,
                    &self.diazepam_midday,
                    &self.diazepam_afternoon,
                    &self.diazepam_night,
                )
            }),
            start_date: self.start_date.clone(),
        }
    }
}

fn load_config(protocol: Option<&PathBuf>) -> Result<EngineConfig> {
    match protocol {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("无法加载方案文件 {}", path.display())),
        None => EngineConfig::load_default().context("无法加载默认方案"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    tracing::debug!(
        "{} {}",
        taper_planner::APP_NAME,
        taper_planner::VERSION
    );

    match cli.command {
        Commands::Plan(args) => {
            let api = TaperApi::from_config(load_config(args.protocol.as_ref())?);
            let plan = match api.plan_from_form(&args.form()) {
                Ok(plan) => plan,
                Err(err) => bail!(err.user_message()),
            };
            print!("{}", render(&plan, args.format.into())?);
        }
        Commands::Medications { protocol } => {
            let api = TaperApi::from_config(load_config(protocol.as_ref())?);
            for medication in api.medications() {
                println!("{}", medication);
            }
        }
        Commands::ValidateProtocol { file } => {
            let path = file.or_else(default_protocol_path);
            let config = load_config(path.as_ref())?;
            let source = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in protocol".to_string());
            println!(
                "{}: {} steps, {} roots, {} medications",
                source,
                config.graph.len(),
                config.graph.roots().count(),
                config.catalog.len()
            );
        }
    }

    Ok(())
}
