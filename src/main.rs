use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use plate_watch::core::db::{
    AddOutcome, NewVehicle, RegistryRepository, RemoveOutcome, VehicleDb, VehicleStatus,
    registry_key,
};
use plate_watch::core::events::{CsvEventLog, EventSink, JsonEventLog, TeeSink};
use plate_watch::{
    AppContext, Config, DirectoryFrameSource, FrameReport, FrameSource, OcrsAnnotator,
    spawn_acquisition,
};

/// Frames buffered between the acquisition thread and the processing loop
const ACQUISITION_BUFFER: usize = 4;

type Sink = TeeSink<TeeSink<CsvEventLog, JsonEventLog>, VehicleDb>;

#[derive(Parser)]
#[command(name = "plate-watch")]
#[command(about = "Read license plates from camera frames and check them against a vehicle registry")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Registry database, overrides the configuration
    #[arg(long, global = true, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save detection overlays and preprocessed frames to directory (must be empty)
    #[arg(long, global = true, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Binarize frames before OCR
    #[arg(long, global = true)]
    preprocess: bool,

    /// Camera index recorded with detections
    #[arg(long, global = true)]
    camera_index: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect and classify the plate in a single image
    Detect {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,
    },
    /// Process every image of a directory as a stream of frames
    Watch {
        #[arg(value_name = "DIR")]
        frames_dir: PathBuf,
    },
    /// Manage registered vehicles
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
    /// Show recent detections
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show detection statistics
    Stats,
    /// Remove all recorded detections
    ClearLogs,
}

#[derive(Subcommand)]
enum RegistryAction {
    Add {
        plate: String,
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "")]
        vehicle_type: String,
    },
    Remove {
        plate: String,
    },
    List,
    Status {
        plate: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for VehicleStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => VehicleStatus::Active,
            StatusArg::Inactive => VehicleStatus::Inactive,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plate_watch={}", default_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    if let Some(camera_index) = args.camera_index {
        config.camera_index = camera_index;
    }
    if args.preprocess {
        config.preprocess = true;
    }
    Ok(config)
}

fn open_sink(config: &Config, db: &VehicleDb) -> anyhow::Result<Sink> {
    let csv = CsvEventLog::open(&config.csv_log_path)?;
    let json = JsonEventLog::with_capacity(&config.json_log_path, config.json_log_capacity)?;
    Ok(TeeSink::new(TeeSink::new(csv, json), db.clone()))
}

fn build_context(
    args: &Cli,
    config: Config,
    db: &VehicleDb,
) -> anyhow::Result<AppContext<OcrsAnnotator, VehicleDb, Sink>> {
    let sink = open_sink(&config, db)?;
    let annotator = OcrsAnnotator::from_model_dir(&config.model_dir()?, config.assumed_confidence)?;
    let ctx = AppContext::new(config, annotator, db.clone(), sink);
    match &args.debug_out {
        Some(dir) => ctx.with_debug(dir.clone()),
        None => Ok(ctx),
    }
}

fn print_report(report: &FrameReport) {
    println!("\n=== Frame {} ===", report.frame_index);
    println!("OCR lines: {}", report.annotation_count);
    if report.candidates.is_empty() {
        println!("No plate candidates.");
    } else {
        println!("Candidates:");
        for candidate in &report.candidates {
            println!(
                "  {} at ({}, {}) - confidence: {:.2}",
                candidate.text, candidate.bbox.x, candidate.bbox.y, candidate.confidence
            );
        }
    }
    if let Some(result) = &report.result {
        println!(
            "Plate {}: {} (confidence {:.2})",
            result.plate_text,
            result.status(),
            result.confidence
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    debug!("Effective configuration:\n{}", config);
    info!(database = %config.database_path.display(), "Opening registry");
    let db = VehicleDb::new(&config.database_path).await?;

    let outcome = run_command(&args, config, &db).await;
    db.close().await?;
    outcome
}

async fn run_command(args: &Cli, config: Config, db: &VehicleDb) -> anyhow::Result<()> {
    match &args.command {
        Command::Detect { image_path } => {
            let camera_index = config.camera_index;
            let ctx = build_context(args, config, db)?;
            let mut source = DirectoryFrameSource::single(image_path, camera_index);
            let frame = source
                .next_frame()
                .ok_or_else(|| anyhow::anyhow!("Failed to decode image: {:?}", image_path))?;
            let report = ctx.process_frame(frame).await;
            print_report(&report);
        }
        Command::Watch { frames_dir } => {
            let source = DirectoryFrameSource::new(frames_dir, config.camera_index)?;
            let ctx = build_context(args, config, db)?;
            let (mut frames, acquisition) = spawn_acquisition(source, ACQUISITION_BUFFER);
            let summary = ctx.run(&mut frames).await;
            let sent = acquisition
                .join()
                .map_err(|_| anyhow::anyhow!("Acquisition thread panicked"))?;

            println!("\n=== Watch Summary ===");
            println!("Frames acquired:   {}", sent);
            println!("Frames processed:  {}", summary.frames);
            println!("Plates detected:   {}", summary.detections);
            println!("  Registered:      {}", summary.registered);
            println!("  Unregistered:    {}", summary.unregistered);
        }
        Command::Registry { action } => run_registry(action, db).await?,
        Command::History { limit } => {
            let sink = open_sink(&config, db)?;
            let results = sink.recent(*limit).await?;
            if results.is_empty() {
                println!("No detections recorded.");
            }
            for result in results {
                println!(
                    "{}  {:<12} {:<12} {:.2}  camera {}",
                    result.timestamp,
                    result.plate_text,
                    result.status(),
                    result.confidence,
                    result.camera_index
                );
            }
        }
        Command::Stats => {
            let sink = open_sink(&config, db)?;
            let stats = sink.statistics().await?;
            println!("=== Detection Statistics ===");
            println!("Total detections:    {}", stats.total);
            println!("Registered:          {}", stats.registered_count);
            println!("Unregistered:        {}", stats.unregistered_count);
            println!("Unique plates:       {}", stats.unique_plates);
            println!("Average confidence:  {:.2}", stats.average_confidence);
            println!("Detections per hour: {:.1}", stats.detections_per_hour);
        }
        Command::ClearLogs => {
            let sink = open_sink(&config, db)?;
            sink.clear().await?;
            println!("Detection logs cleared.");
        }
    }
    Ok(())
}

async fn run_registry(action: &RegistryAction, db: &VehicleDb) -> anyhow::Result<()> {
    match action {
        RegistryAction::Add {
            plate,
            owner,
            vehicle_type,
        } => {
            let vehicle = NewVehicle {
                plate_number: plate.clone(),
                owner: owner.clone(),
                vehicle_type: vehicle_type.clone(),
            };
            match db.add(&vehicle).await? {
                AddOutcome::Added => println!("Registered {}", registry_key(plate)),
                AddOutcome::Duplicate => println!("{} is already registered", registry_key(plate)),
            }
        }
        RegistryAction::Remove { plate } => match db.remove(plate).await? {
            RemoveOutcome::Removed => println!("Removed {}", registry_key(plate)),
            RemoveOutcome::NotFound => println!("{} is not registered", registry_key(plate)),
        },
        RegistryAction::List => {
            let entries = db.list_all().await?;
            println!("Registered vehicles: {}", entries.len());
            for entry in entries {
                println!(
                    "  {:<12} {:<8} {:<20} {:<12} {}",
                    entry.plate_number,
                    entry.status,
                    entry.owner,
                    entry.vehicle_type,
                    entry.registered_at
                );
            }
        }
        RegistryAction::Status { plate, status } => {
            let status = VehicleStatus::from(*status);
            if db.set_status(plate, status).await? {
                println!("{} is now {}", registry_key(plate), status);
            } else {
                println!("{} is not registered", registry_key(plate));
            }
        }
    }
    Ok(())
}
