//! Batch classification of source trees
//!
//! Discovers `.cs` and `.csx` files with `walkdir` and classifies them on
//! a bounded pool of worker threads. Results come back sorted by path
//! whatever order the workers finished in.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::runtime::BatchPreferences;
use crate::config::ClassifierOptions;
use crate::file_processor::is_source_file;
use crate::logging::codes;
use crate::pipeline::{self, PipelineError, PipelineResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Worker threads; 0 picks the available parallelism
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
    /// Options applied to every file; the extension still picks the mode
    pub options: ClassifierOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from_preferences(&BatchPreferences::default(), ClassifierOptions::default())
    }
}

impl BatchConfig {
    pub fn from_preferences(preferences: &BatchPreferences, options: ClassifierOptions) -> Self {
        Self {
            max_threads: preferences.max_threads,
            recursive: preferences.recursive,
            max_files: None,
            progress_reporting: preferences.progress_reporting,
            fail_fast: preferences.fail_fast,
            options,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Thread count actually used for `file_count` files
    pub fn effective_threads(&self, file_count: usize) -> usize {
        let requested = if self.max_threads == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
        } else {
            self.max_threads
        };
        requested.clamp(1, MAX_WORKER_THREADS).min(file_count.max(1))
    }
}

/// Batch processing results
#[derive(Debug, Default)]
pub struct BatchResults {
    pub successful_files: Vec<(PathBuf, PipelineResult)>,
    pub failed_files: Vec<(PathBuf, PipelineError)>,
    pub processing_duration: Duration,
    pub files_processed: usize,
    pub files_discovered: usize,
    /// Files never started because fail-fast stopped the batch
    pub files_skipped: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.successful_files.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_files.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.successful_files.len() as f64 / self.files_processed as f64
        }
    }

    pub fn total_spans(&self) -> usize {
        self.successful_files.iter().map(|(_, result)| result.spans.len()).sum()
    }

    pub fn add_success(&mut self, file_path: PathBuf, result: PipelineResult) {
        self.successful_files.push((file_path, result));
        self.files_processed += 1;
    }

    pub fn add_failure(&mut self, file_path: PathBuf, error: PipelineError) {
        self.failed_files.push((file_path, error));
        self.files_processed += 1;
    }

    fn sort_by_path(&mut self) {
        self.successful_files.sort_by(|a, b| a.0.cmp(&b.0));
        self.failed_files.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch classification completed: {} files processed, {} successful ({:.1}%), {} failed, {} spans, {:.2}s total",
            self.files_processed,
            self.success_count(),
            self.success_rate() * 100.0,
            self.failure_count(),
            self.total_spans(),
            self.processing_duration.as_secs_f64()
        )
    }
}

/// Batch processing errors
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No C# source files found in: {path}")]
    NoFilesFound { path: String },

    #[error("Too many files found: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("IO error during directory traversal: {error}")]
    IoError { error: String },

    #[error("Thread pool error: {message}")]
    ThreadError { message: String },
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

/// Discover `.cs` and `.csx` files below `dir_path`, sorted by path
pub fn discover_source_files(dir_path: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    crate::log_info!("Starting file discovery",
        "directory" => dir_path.display(),
        "recursive" => config.recursive
    );

    if !dir_path.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: dir_path.display().to_string(),
        });
    }

    let max_files = config.max_files.unwrap_or(MAX_FILES_PER_BATCH).min(MAX_FILES_PER_BATCH);
    let walker = WalkDir::new(dir_path)
        .max_depth(if config.recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| BatchError::IoError { error: e.to_string() })?;
        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }
        if files.len() == max_files {
            return Err(BatchError::TooManyFiles {
                count: files.len() + 1,
                max: max_files,
            });
        }
        files.push(entry.into_path());
    }

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir_path.display().to_string(),
        });
    }
    files.sort();

    crate::log_debug!("File discovery completed",
        "files_found" => files.len(),
        "directory" => dir_path.display()
    );
    Ok(files)
}

/// Expand a mix of files and directories into the files to classify.
/// Files named directly are kept as given.
pub fn collect_inputs(paths: &[PathBuf], config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(discover_source_files(path, config)?);
        } else {
            files.push(path.clone());
        }
    }
    files.dedup();
    Ok(files)
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

/// Classify `files` on the worker pool
pub fn process_files(files: Vec<PathBuf>, config: &BatchConfig) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let threads = config.effective_threads(files.len());

    crate::log_info!("Starting batch classification",
        "files" => files.len(),
        "threads" => threads,
        "fail_fast" => config.fail_fast
    );

    let queue = WorkQueue {
        files: &files,
        next: AtomicUsize::new(0),
        stop: AtomicBool::new(false),
        results: Mutex::new(BatchResults::new()),
    };

    thread::scope(|scope| {
        let workers: Vec<_> = (0..threads).map(|_| scope.spawn(|| queue.work(config))).collect();
        for worker in workers {
            worker.join().map_err(|_| BatchError::ThreadError {
                message: "Worker panicked during classification".to_string(),
            })?;
        }
        Ok(())
    })?;

    let mut results = queue.results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    results.files_discovered = files.len();
    results.files_skipped = files.len() - results.files_processed;
    results.processing_duration = start_time.elapsed();
    results.sort_by_path();

    crate::log_success!(
        codes::success::BATCH_COMPLETE,
        "Batch classification completed",
        "files_processed" => results.files_processed,
        "successful" => results.success_count(),
        "failed" => results.failure_count(),
        "skipped" => results.files_skipped,
        "threads_used" => threads,
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );

    Ok(results)
}

struct WorkQueue<'a> {
    files: &'a [PathBuf],
    next: AtomicUsize,
    stop: AtomicBool,
    results: Mutex<BatchResults>,
}

impl WorkQueue<'_> {
    fn work(&self, config: &BatchConfig) {
        while !self.stop.load(Ordering::Acquire) {
            let index = self.next.fetch_add(1, Ordering::AcqRel);
            let Some(file_path) = self.files.get(index) else {
                return;
            };

            if config.progress_reporting {
                println!("Classifying file {} of {}: {}", index + 1, self.files.len(), file_path.display());
            }

            let outcome = pipeline::process_file(&file_path.to_string_lossy(), &config.options);
            match outcome {
                Ok(result) => self.lock().add_success(file_path.clone(), result),
                Err(error) => {
                    crate::log_error!(error.error_code(), "File classification failed",
                        "file" => file_path.display(),
                        "error" => &error
                    );
                    self.lock().add_failure(file_path.clone(), error);
                    if config.fail_fast {
                        crate::log_warning!("Fail-fast mode enabled, stopping batch classification");
                        self.stop.store(true, Ordering::Release);
                    }
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BatchResults> {
        self.results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    fn config() -> BatchConfig {
        BatchConfig::from_preferences(&BatchPreferences::default(), ClassifierOptions::regular())
    }

    #[test]
    fn test_file_discovery() {
        let temp_dir = tempdir().unwrap();
        let temp_path = temp_dir.path();
        fs::create_dir(temp_path.join("nested")).unwrap();
        fs::write(temp_path.join("B.cs"), "class B { }").unwrap();
        fs::write(temp_path.join("a.csx"), "var a = 1;").unwrap();
        fs::write(temp_path.join("nested").join("C.cs"), "class C { }").unwrap();
        fs::write(temp_path.join("notes.txt"), "not C#").unwrap();

        let files = discover_source_files(temp_path, &config().with_recursive(true)).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|pair| pair[0] < pair[1]));

        let top_level = discover_source_files(temp_path, &config().with_recursive(false)).unwrap();
        assert_eq!(top_level.len(), 2);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = tempdir().unwrap();
        assert_matches!(
            discover_source_files(temp_dir.path(), &config()),
            Err(BatchError::NoFilesFound { .. })
        );
        assert_matches!(
            discover_source_files(&temp_dir.path().join("missing"), &config()),
            Err(BatchError::DirectoryNotFound { .. })
        );
    }

    #[test]
    fn test_file_limit() {
        let temp_dir = tempdir().unwrap();
        for name in ["A.cs", "B.cs", "C.cs"] {
            fs::write(temp_dir.path().join(name), "class X { }").unwrap();
        }
        let mut limited = config();
        limited.max_files = Some(2);
        assert_matches!(
            discover_source_files(temp_dir.path(), &limited),
            Err(BatchError::TooManyFiles { max: 2, .. })
        );
    }

    #[test]
    fn test_parallel_results_sorted() {
        let temp_dir = tempdir().unwrap();
        for index in 0..6 {
            fs::write(temp_dir.path().join(format!("F{}.cs", index)), format!("class F{} {{ }}", index)).unwrap();
        }
        fs::write(temp_dir.path().join("Bad.cs"), [0xff_u8, 0xfe, 0x00]).unwrap();

        let batch = config().with_threads(3);
        let files = discover_source_files(temp_dir.path(), &batch).unwrap();
        let results = process_files(files, &batch).unwrap();
        assert_eq!(results.files_processed, 7);
        assert_eq!(results.success_count(), 6);
        assert_eq!(results.failure_count(), 1);
        assert!(results.successful_files.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert!(results.summary().contains("6 successful"));
    }

    #[test]
    fn test_fail_fast_single_thread() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("A.cs"), [0xc3_u8, 0x28]).unwrap();
        fs::write(temp_dir.path().join("B.cs"), "class B { }").unwrap();

        let batch = config().with_threads(1).with_fail_fast(true);
        let files = discover_source_files(temp_dir.path(), &batch).unwrap();
        let results = process_files(files, &batch).unwrap();
        assert_eq!(results.failure_count(), 1);
        assert_eq!(results.success_count(), 0);
        assert_eq!(results.files_skipped, 1);
    }

    #[test]
    fn test_effective_threads() {
        let batch = config().with_threads(64);
        assert_eq!(batch.effective_threads(100), MAX_WORKER_THREADS);
        assert_eq!(batch.effective_threads(2), 2);
        assert!(config().with_threads(0).effective_threads(100) >= 1);
    }

    #[test]
    fn test_collect_inputs_keeps_named_files() {
        let temp_dir = tempdir().unwrap();
        let named = temp_dir.path().join("Program.cs");
        fs::write(&named, "class P { }").unwrap();
        let files = collect_inputs(&[named.clone()], &config()).unwrap();
        assert_eq!(files, vec![named]);
    }
}
