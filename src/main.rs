use leafscan::config::{AppConfig, DriveConfig};
use leafscan::error::AppError;
use leafscan::models::classify_types::FetchOutcome;
use leafscan::pipeline::AppContext;
use leafscan::services::classifier::inference::ImageInput;
use leafscan::services::drive::DriveClient;
use log::error;
use std::path::PathBuf;
use std::process;

fn usage() -> ! {
    eprintln!("usage: leafscan classify <image-path>");
    eprintln!("       leafscan fetch <folder-id> <service-account-json>");
    process::exit(2);
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.as_slice() {
        [cmd, path] if cmd == "classify" => run_classify(path),
        [cmd, folder_id, credential] if cmd == "fetch" => run_fetch(folder_id, credential).await,
        _ => usage(),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn run_classify(path: &str) -> Result<(), AppError> {
    let ctx = AppContext::init(AppConfig::from_exe_dir()?)?;
    let prediction = ctx.classify_upload(ImageInput::Path(PathBuf::from(path)))?;
    println!(
        "Prediction: {} ({:.1}%)",
        prediction.class_name,
        prediction.confidence * 100.0
    );
    Ok(())
}

async fn run_fetch(folder_id: &str, credential: &str) -> Result<(), AppError> {
    let ctx = AppContext::init(AppConfig::from_exe_dir()?)?;
    let drive = DriveClient::connect(&DriveConfig::new(PathBuf::from(credential))).await?;

    match ctx.fetch_folder(&drive, folder_id).await? {
        FetchOutcome::Empty => println!("No files found in the folder."),
        FetchOutcome::Classified(results) => {
            for result in &results {
                match (&result.prediction, &result.error) {
                    (Some(p), _) => println!(
                        "{}: {} ({:.1}%)",
                        result.file_name,
                        p.class_name,
                        p.confidence * 100.0
                    ),
                    (None, Some(e)) => println!("{}: failed ({})", result.file_name, e),
                    (None, None) => {}
                }
            }
        }
    }
    Ok(())
}
