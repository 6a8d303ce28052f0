use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use tracing::info;

use electrode_interpol::app_state::AppState;
use electrode_interpol::config::ElectrodeConfig;
use electrode_interpol::geometry::{ArrayShape, Point3D};
use electrode_interpol::interpol::{AnchorSet, interpolate};
use electrode_interpol::parser_registry::ParserRegistry;
use electrode_interpol::pipeline::{PipelineOptions, run_batch};
use electrode_interpol::routes;
use electrode_interpol::task::JobStore;
use electrode_interpol::voxel_grid::{DEFAULT_RADIUS, MarkerShape};

#[derive(Parser)]
#[command(name = "electrode-interpol")]
#[command(about = "颅内电极条带/网格触点插值")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct PipelineArgs {
    /// 覆盖配置文件中的 DATA_DIR
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 标记半径（体素）
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    radius: f64,

    /// 标记形状: sphere 或 cube
    #[arg(long, default_value = "sphere")]
    marker: MarkerShape,

    /// 使用的阵列标签
    #[arg(long, default_value = "1")]
    array: String,
}

impl PipelineArgs {
    fn into_options(self) -> PipelineOptions {
        PipelineOptions {
            data_dir: self.data_dir,
            radius: self.radius,
            marker: self.marker,
            array_label: self.array,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 启动 HTTP 服务
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// 电极配置 JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// 批量处理配置中的病人，生成插值掩膜
    Run {
        #[arg(short, long)]
        config: PathBuf,

        /// 指定病人（可多次），默认处理全部
        #[arg(long = "patient")]
        patients: Vec<String>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// 直接插值并以 JSON 输出触点坐标
    Interpolate {
        /// 阵列维度，例如 8x8
        #[arg(long)]
        grid: ArrayShape,

        /// 角点 A: x,y,z
        #[arg(long, allow_hyphen_values = true)]
        a: Point3D,

        /// 角点 B: x,y,z
        #[arg(long, allow_hyphen_values = true)]
        b: Point3D,

        /// 角点 C: x,y,z（仅网格）
        #[arg(long, allow_hyphen_values = true)]
        c: Option<Point3D>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            config,
            pipeline,
        } => {
            let config = match config {
                Some(path) => ElectrodeConfig::load(path)?,
                None => ElectrodeConfig::default(),
            };
            actix_web::rt::System::new().block_on(serve(
                host,
                port,
                config,
                pipeline.into_options(),
            ))?;
        }
        Commands::Run {
            config,
            patients,
            pipeline,
        } => {
            let config = ElectrodeConfig::load(config)?;
            let patients = if patients.is_empty() {
                config.patient_ids()
            } else {
                patients
            };
            let summary = run_batch(
                &config,
                &ParserRegistry::new(),
                &patients,
                &pipeline.into_options(),
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !summary.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Interpolate { grid, a, b, c } => {
            let contacts = interpolate(&AnchorSet { a, b, c }, grid)?;
            println!("{}", serde_json::to_string_pretty(&contacts)?);
        }
    }

    Ok(())
}

async fn serve(
    host: String,
    port: u16,
    config: ElectrodeConfig,
    options: PipelineOptions,
) -> std::io::Result<()> {
    let parser_registry = Arc::new(ParserRegistry::new());
    info!(extensions = ?parser_registry.supported_extensions(), "已注册的解析器");

    let job_store = Arc::new(JobStore::new());
    let app_state = web::Data::new(AppState {
        parser_registry,
        config: Arc::new(config),
        options,
        job_store: job_store.clone(),
    });

    // 启动后台清理任务：每 5 分钟清理一次过期任务
    let cleanup_store = job_store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(std::time::Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            let cleaned_count = cleanup_store.cleanup_expired();
            if cleaned_count > 0 {
                info!(
                    cleaned = cleaned_count,
                    remaining = cleanup_store.job_count(),
                    "清理过期任务"
                );
            }
        }
    });

    info!(
        address = %format!("http://{}:{}", host, port),
        ttl_minutes = job_store.default_ttl().as_secs() / 60,
        patients = app_state.config.patients.len(),
        "服务器启动"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
