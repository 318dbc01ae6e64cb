//! File processor module with compile-time limits and global logging integration
//!
//! Reads `.cs` and `.csx` files as UTF-8, strips a byte order mark and
//! reports the parse mode the extension implies.

mod processor;

use crate::config::constants::compile_time::file_processing::MAX_FILE_SIZE;
pub use processor::{
    is_source_file, parse_mode_for_path, FileMetadata, FileProcessingResult, FileProcessor,
    FileProcessorError,
};

/// Process a file with default settings
pub fn process_file(file_path: &str) -> Result<FileProcessingResult, FileProcessorError> {
    FileProcessor::new().process_file(file_path)
}

/// Get the compile-time maximum file size limit
pub fn get_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

/// Check that every file processing code has registered metadata
pub fn init_file_processor_logging() -> Result<(), String> {
    let file_codes = [
        crate::logging::codes::file_processing::FILE_NOT_FOUND,
        crate::logging::codes::file_processing::INVALID_EXTENSION,
        crate::logging::codes::file_processing::FILE_TOO_LARGE,
        crate::logging::codes::file_processing::PERMISSION_DENIED,
        crate::logging::codes::file_processing::INVALID_ENCODING,
        crate::logging::codes::file_processing::IO_ERROR,
        crate::logging::codes::file_processing::INVALID_PATH,
    ];

    for code in &file_codes {
        if crate::logging::codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "File processor error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseMode;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Test.cs");
        fs::write(&file_path, "namespace N;\n").unwrap();

        let result = process_file(file_path.to_str().unwrap());
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_mode_for_path() {
        assert_eq!(parse_mode_for_path(Path::new("a/B.cs")), Some(ParseMode::Regular));
        assert_eq!(parse_mode_for_path(Path::new("run.csx")), Some(ParseMode::Script));
        assert_eq!(parse_mode_for_path(Path::new("README")), None);
        assert!(!is_source_file(Path::new("x.csproj")));
    }

    #[test]
    fn test_init_logging() {
        assert!(init_file_processor_logging().is_ok());
        assert_eq!(get_max_file_size(), 16 * 1024 * 1024);
    }
}
