use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::classify_types::{ClassifyResult, FetchOutcome, Prediction};
use crate::models::drive_types::RemoteFile;
use crate::services::classifier::inference::ImageInput;
use crate::services::classifier::model_manager::ClassifierEngine;
use crate::services::classifier::Classify;
use crate::services::storage::RemoteSource;
use log::warn;

/// Everything a pipeline call needs, constructed once at startup and passed
/// by reference. Model and label index load here; a failure aborts startup.
pub struct AppContext {
    pub engine: ClassifierEngine,
    pub config: AppConfig,
}

impl AppContext {
    pub fn init(config: AppConfig) -> Result<Self, AppError> {
        let engine = ClassifierEngine::load(&config.model_path, &config.labels_path)?;
        Ok(Self { engine, config })
    }

    /// The upload path: one local image in, one prediction out.
    pub fn classify_upload(&self, input: ImageInput) -> Result<Prediction, AppError> {
        self.engine.classify(input)
    }

    /// The folder path: list, then download and classify each file serially.
    pub async fn fetch_folder<S: RemoteSource>(
        &self,
        source: &S,
        folder_id: &str,
    ) -> Result<FetchOutcome, AppError> {
        fetch_and_classify(&self.engine, source, folder_id).await
    }
}

/// Listing failures abort the whole request; a single file's download, decode,
/// or classification failure only marks that file's slot and the loop moves on.
pub async fn fetch_and_classify<C, S>(
    classifier: &C,
    source: &S,
    folder_id: &str,
) -> Result<FetchOutcome, AppError>
where
    C: Classify,
    S: RemoteSource,
{
    let files = source.list_folder(folder_id).await?;
    if files.is_empty() {
        return Ok(FetchOutcome::Empty);
    }

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        results.push(classify_remote(classifier, source, &file).await);
    }
    Ok(FetchOutcome::Classified(results))
}

async fn classify_remote<C, S>(classifier: &C, source: &S, file: &RemoteFile) -> ClassifyResult
where
    C: Classify,
    S: RemoteSource,
{
    let outcome = match source.download(&file.id).await {
        Ok(bytes) => classifier.classify(ImageInput::Bytes(bytes)),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(prediction) => ClassifyResult {
            file_id: file.id.clone(),
            file_name: file.name.clone(),
            prediction: Some(prediction),
            error: None,
        },
        Err(e) => {
            warn!("Skipping {}: {}", file.name, e);
            ClassifyResult {
                file_id: file.id.clone(),
                file_name: file.name.clone(),
                prediction: None,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classifier::inference::normalize_image;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Runs the real normalizer so decode failures surface exactly as they
    /// would with the real engine, then returns a fixed label.
    struct FakeClassifier {
        calls: AtomicUsize,
    }

    impl FakeClassifier {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl Classify for FakeClassifier {
        fn classify(&self, input: ImageInput) -> Result<Prediction, AppError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            normalize_image(input)?;
            Ok(Prediction {
                class_name: "Healthy".to_string(),
                confidence: 0.99,
            })
        }
    }

    /// In-memory folder: (id, name, content) triples.
    struct FakeSource {
        files: Vec<(String, String, Vec<u8>)>,
    }

    impl RemoteSource for FakeSource {
        async fn list_folder(&self, _folder_id: &str) -> Result<Vec<RemoteFile>, AppError> {
            Ok(self
                .files
                .iter()
                .map(|(id, name, _)| RemoteFile {
                    id: id.clone(),
                    name: name.clone(),
                })
                .collect())
        }

        async fn download(&self, file_id: &str) -> Result<Vec<u8>, AppError> {
            self.files
                .iter()
                .find(|(id, _, _)| id == file_id)
                .map(|(_, _, bytes)| bytes.clone())
                .ok_or_else(|| AppError::Network(format!("No such file: {}", file_id)))
        }
    }

    fn png_bytes(pixel: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(32, 32, Rgb(pixel));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn entry(n: usize, bytes: Vec<u8>) -> (String, String, Vec<u8>) {
        (format!("id-{}", n), format!("leaf-{}.png", n), bytes)
    }

    #[tokio::test]
    async fn empty_folder_yields_empty_outcome_and_no_classify_calls() {
        let classifier = FakeClassifier::new();
        let source = FakeSource { files: vec![] };

        let outcome = fetch_and_classify(&classifier, &source, "folder").await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Empty));
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn three_valid_files_yield_three_results_in_listing_order() {
        let classifier = FakeClassifier::new();
        let source = FakeSource {
            files: vec![
                entry(0, png_bytes([10, 200, 10])),
                entry(1, png_bytes([200, 10, 10])),
                entry(2, png_bytes([10, 10, 200])),
            ],
        };

        let outcome = fetch_and_classify(&classifier, &source, "folder").await.unwrap();

        let FetchOutcome::Classified(results) = outcome else {
            panic!("expected classified outcome");
        };
        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.file_name.as_str()).collect::<Vec<_>>(),
            vec!["leaf-0.png", "leaf-1.png", "leaf-2.png"]
        );
        assert!(results.iter().all(|r| r.prediction.is_some() && r.error.is_none()));
        assert_eq!(classifier.call_count(), 3);
    }

    #[tokio::test]
    async fn a_corrupt_file_fails_alone_and_the_rest_still_classify() {
        let classifier = FakeClassifier::new();
        let source = FakeSource {
            files: vec![
                entry(0, png_bytes([10, 200, 10])),
                entry(1, vec![0xde, 0xad, 0xbe, 0xef]),
                entry(2, png_bytes([10, 10, 200])),
            ],
        };

        let outcome = fetch_and_classify(&classifier, &source, "folder").await.unwrap();

        let FetchOutcome::Classified(results) = outcome else {
            panic!("expected classified outcome");
        };
        assert_eq!(results.len(), 3);
        assert!(results[0].prediction.is_some());
        assert!(results[1].prediction.is_none());
        assert!(results[1].error.is_some());
        assert!(results[2].prediction.is_some());
    }

    #[tokio::test]
    async fn a_failed_download_fails_alone() {
        struct MissingDownload {
            inner: FakeSource,
        }

        impl RemoteSource for MissingDownload {
            async fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteFile>, AppError> {
                self.inner.list_folder(folder_id).await
            }

            async fn download(&self, file_id: &str) -> Result<Vec<u8>, AppError> {
                if file_id == "id-9" {
                    return Err(AppError::Network("HTTP 404".to_string()));
                }
                self.inner.download(file_id).await
            }
        }

        let classifier = FakeClassifier::new();
        let source = MissingDownload {
            inner: FakeSource {
                files: vec![
                    entry(0, png_bytes([10, 200, 10])),
                    entry(1, png_bytes([200, 10, 10])),
                    // Listed but not downloadable.
                    ("id-9".to_string(), "gone.png".to_string(), vec![]),
                ],
            },
        };
        let outcome = fetch_and_classify(&classifier, &source, "folder").await.unwrap();

        let FetchOutcome::Classified(results) = outcome else {
            panic!("expected classified outcome");
        };
        assert_eq!(results.len(), 3);
        assert!(results[2].error.as_deref().unwrap().contains("404"));
        assert!(results[0].prediction.is_some());
        assert!(results[1].prediction.is_some());
        // The failed download never reaches the classifier.
        assert_eq!(classifier.call_count(), 2);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_whole_request() {
        struct BrokenListing;

        impl RemoteSource for BrokenListing {
            async fn list_folder(&self, _folder_id: &str) -> Result<Vec<RemoteFile>, AppError> {
                Err(AppError::Network("HTTP 500".to_string()))
            }

            async fn download(&self, _file_id: &str) -> Result<Vec<u8>, AppError> {
                unreachable!("download must not be called when listing fails")
            }
        }

        let classifier = FakeClassifier::new();
        let err = fetch_and_classify(&classifier, &BrokenListing, "folder")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(classifier.call_count(), 0);
    }

    #[test]
    fn upload_path_classifies_without_a_remote_source() {
        let classifier = FakeClassifier::new();
        let prediction = classifier
            .classify(ImageInput::Bytes(png_bytes([50, 150, 50])))
            .unwrap();
        assert_eq!(prediction.class_name, "Healthy");
    }

    #[test]
    fn label_lookup_failure_is_scoped_to_the_call() {
        // A classifier whose label index is missing the predicted key fails
        // that call; nothing else in the process is affected.
        let labels = HashMap::from([("0".to_string(), "Healthy".to_string())]);
        let err = crate::services::classifier::inference::lookup_label(&labels, 3).unwrap_err();
        assert!(matches!(err, AppError::LabelLookup { index: 3 }));
    }
}
