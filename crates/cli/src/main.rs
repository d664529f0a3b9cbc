use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use bodymeasure_core::annotation::infrastructure::jpeg_encoder::write_encoded;
use bodymeasure_core::annotation::infrastructure::overlay_annotator::OverlayAnnotator;
use bodymeasure_core::annotation::infrastructure::skeleton_annotator::SkeletonAnnotator;
use bodymeasure_core::measurement::infrastructure::measurer_factory::{
    create_measurer, create_pose_extractor,
};
use bodymeasure_core::pipeline::measure_body_use_case::MeasureBodyUseCase;
use bodymeasure_core::pipeline::measurement_api::{
    encode_bytes, MeasurementRequest, MeasurementResponse, PoseAnalysisResponse,
};
use bodymeasure_core::shared::config::MeasureConfig;
use bodymeasure_core::shared::constants::IMAGE_EXTENSIONS;
use bodymeasure_core::shared::error::MeasureError;

/// Estimate shoulder, bust, waist and hip widths from a full-body photo.
#[derive(Parser, Debug)]
#[command(name = "bodymeasure")]
struct Cli {
    /// Frontal full-body photo.
    #[arg(required_unless_present = "request")]
    image: Option<PathBuf>,

    /// The person's real height in centimeters.
    #[arg(long, required_unless_present = "request")]
    height_cm: Option<f64>,

    /// Side photo (accepted, not used for measuring).
    #[arg(long)]
    side_image: Option<PathBuf>,

    /// Write the annotated JPEG here.
    #[arg(long)]
    annotated_out: Option<PathBuf>,

    /// Print the full JSON response instead of a summary.
    #[arg(long)]
    json: bool,

    /// Write the JSON response to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pose model (ONNX) to use instead of the cached one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Pose model file name to look up in the cache and bundled models.
    #[arg(long)]
    model_name: Option<String>,

    /// Download URL for the pose model when it is not cached.
    #[arg(long)]
    model_url: Option<String>,

    /// Person detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Pose detection timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Fall back to proportion estimates when no pose is found.
    #[arg(long)]
    lenient: bool,

    /// Skip pose detection and use proportion estimates only.
    #[arg(long)]
    proportions_only: bool,

    /// Draw the detected pose skeleton instead of measurement guides.
    /// Requires the pose model; never falls back to proportions.
    #[arg(long, conflicts_with = "proportions_only")]
    analyze_pose: bool,

    /// Read a JSON measurement request instead of an image path.
    #[arg(long, conflicts_with_all = ["image", "side_image"])]
    request: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(exit_code(e.as_ref()));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let request = build_request(&cli)?;

    log::info!("Resolving pose model: {}", config.model_name);
    if cli.analyze_pose {
        return run_analysis(&cli, &config, &request);
    }

    let measurer = create_measurer(&config, Some(Box::new(download_progress)));
    let use_case = MeasureBodyUseCase::new(
        measurer,
        Box::new(OverlayAnnotator::new(config.jpeg_quality)),
    );

    let response = use_case.handle(&request)?;

    if let Some(path) = &cli.annotated_out {
        write_encoded(path, &response.annotated_jpeg()?)?;
        log::info!("Annotated image written to {}", path.display());
    }
    if let Some(path) = &cli.output {
        write_encoded(path, serde_json::to_string_pretty(&response)?.as_bytes())?;
        log::info!("Response written to {}", path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response);
    }
    Ok(())
}

fn run_analysis(
    cli: &Cli,
    config: &MeasureConfig,
    request: &MeasurementRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let pose = create_pose_extractor(config, Some(Box::new(download_progress)))?;
    let use_case = MeasureBodyUseCase::new(
        pose.clone(),
        Box::new(OverlayAnnotator::new(config.jpeg_quality)),
    )
    .with_pose_analysis(pose, Box::new(SkeletonAnnotator::new(config.jpeg_quality)));

    let response = use_case.handle_analysis(request)?;

    if let Some(path) = &cli.annotated_out {
        write_encoded(path, &response.annotated_jpeg()?)?;
        log::info!("Skeleton image written to {}", path.display());
    }
    if let Some(path) = &cli.output {
        write_encoded(path, serde_json::to_string_pretty(&response)?.as_bytes())?;
        log::info!("Analysis written to {}", path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_landmarks(&response);
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<MeasureConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => MeasureConfig::load(path)?,
        None => MeasureConfig::default(),
    };
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut MeasureConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model_path = Some(model.clone());
    }
    if let Some(name) = &cli.model_name {
        config.model_name = name.clone();
    }
    if let Some(url) = &cli.model_url {
        config.model_url = Some(url.clone());
    }
    if let Some(confidence) = cli.confidence {
        config.min_detection_confidence = confidence;
    }
    if let Some(timeout) = cli.timeout_ms {
        config.detection_timeout_ms = timeout;
    }
    if cli.lenient {
        config.strict_landmarks = false;
    }
    if cli.proportions_only {
        config.force_proportions = true;
    }
}

fn build_request(cli: &Cli) -> Result<MeasurementRequest, Box<dyn std::error::Error>> {
    let mut request = match &cli.request {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => {
            let image = cli.image.as_deref().ok_or("An image path is required")?;
            MeasurementRequest {
                image_base64: encode_bytes(&std::fs::read(image)?),
                side_image_base64: match &cli.side_image {
                    Some(side) => Some(encode_bytes(&std::fs::read(side)?)),
                    None => None,
                },
                height_cm: cli.height_cm,
            }
        }
    };
    if cli.height_cm.is_some() {
        request.height_cm = cli.height_cm;
    }
    Ok(request)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for path in [&cli.image, &cli.side_image, &cli.request].into_iter().flatten() {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    for path in [&cli.image, &cli.side_image].into_iter().flatten() {
        if !is_image(path) {
            return Err(format!("Not a supported image file: {}", path.display()).into());
        }
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(
                format!("Confidence must be between 0.0 and 1.0, got {confidence}").into(),
            );
        }
    }
    if cli.timeout_ms == Some(0) {
        return Err("Timeout must be greater than 0".into());
    }
    Ok(())
}

fn print_summary(response: &MeasurementResponse) {
    println!("Mode:          {}", response.mode);
    println!("Height:        {} cm", response.height_cm);
    println!("Shoulders:     {:.1} cm", response.shoulders_cm);
    println!("Bust:          {:.1} cm", response.bust_cm);
    println!("Waist:         {:.1} cm", response.waist_cm);
    println!("Hips:          {:.1} cm", response.hips_cm);
    if let Some(torso) = response.torso_height_cm {
        println!("Torso height:  {torso:.1} cm");
    }
    println!("Waist-to-hip:  {:.3}", response.waist_to_hip_ratio);
}

fn print_landmarks(response: &PoseAnalysisResponse) {
    for lm in &response.landmarks {
        println!("{:<15} ({:.1}, {:.1}) px", lm.point, lm.x, lm.y);
    }
    let cm = &response.measurements_cm;
    println!(
        "Shoulders {:.1} cm, bust {:.1} cm, waist {:.1} cm, hips {:.1} cm",
        cm.shoulders_cm, cm.bust_cm, cm.waist_cm, cm.hips_cm
    );
}

/// 2 for errors the user can fix by changing the input, 1 otherwise.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<MeasureError>() {
        Some(e) if e.is_client_error() => 2,
        _ => 1,
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading pose model... {pct}%");
    } else {
        eprint!("\rDownloading pose model... {downloaded} bytes");
    }
}
