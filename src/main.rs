use anyhow::Result;
use clap::Parser;
use depthcam::{
    health_check, query_devices, CameraInterface, CameraInterfaceBuilder, CaptureStatus,
    DepthcamConfig, HealthStatus,
};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "depthcam")]
#[command(about = "Capture RealSense depth and color frames into fixed slot rings")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "depthcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// List connected RealSense devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Generate frames instead of opening hardware
    #[arg(long)]
    synthetic: bool,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Seconds between status reports
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    status_interval: u64,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# Depthcam Configuration File");
        println!("{}", DepthcamConfig::default().to_toml()?);
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting depthcam v{}", env!("CARGO_PKG_VERSION"));

    if args.list_devices {
        let devices = query_devices()?;
        if devices.is_empty() {
            println!("No RealSense devices found");
        }
        for (index, device) in devices.iter().enumerate() {
            println!("[{}] {}", index, device);
        }
        return Ok(());
    }

    let config = match DepthcamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut builder = CameraInterfaceBuilder::new().config(config);
    if args.synthetic {
        builder = builder.synthetic(true);
    }
    let camera = builder.build()?;

    if !camera.ok() {
        error!("Camera unavailable: {}", camera.error_text());
        std::process::exit(1);
    }

    info!(
        "Capturing (auto exposure: {}, auto white balance: {})",
        camera.auto_exposure(),
        camera.auto_white_balance()
    );

    run(camera.as_ref(), &args).await;
    camera.stop();

    let status = CaptureStatus::of(camera.as_ref());
    info!(
        "Captured {} depth and {} color frames ({} dropped)",
        status.depth.frames_published,
        status.rgb.frames_published,
        status.dropped_depth + status.dropped_rgb
    );

    Ok(())
}

async fn run(camera: &dyn CameraInterface, args: &Args) {
    let mut ticker = tokio::time::interval(Duration::from_secs(args.status_interval.max(1)));
    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
            _ = &mut deadline => {
                info!("Capture duration elapsed");
                break;
            }
            _ = ticker.tick() => report(camera),
        }
    }
}

fn report(camera: &dyn CameraInterface) {
    let status = CaptureStatus::of(camera);
    info!(
        "depth index {:?}, color index {:?}, overwrites {}",
        status.latest_depth_index, status.latest_rgb_index, status.depth.overwrites
    );

    let health = health_check(
        camera,
        depthcam::frame::host_timestamp_us(),
        Duration::from_secs(2),
    );
    match health.status {
        HealthStatus::Healthy => {}
        HealthStatus::Warning => warn!("Camera warnings: {}", health.warnings.join("; ")),
        HealthStatus::Unhealthy => error!("Camera issues: {}", health.issues.join("; ")),
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("depthcam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_names(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}
