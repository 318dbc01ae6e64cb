use crate::logging::codes;

/// Validate that the pipeline is properly configured
pub fn validate_pipeline() -> Result<(), String> {
    crate::log_debug!("Validating complete pipeline configuration");

    crate::file_processor::init_file_processor_logging()?;

    let mut checked = 0usize;
    for code in codes::all_codes() {
        if codes::get_description(code) == "Unknown error" {
            return Err(format!("Code {} has no registered metadata", code));
        }
        checked += 1;
    }

    crate::log_success!(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Complete pipeline validation succeeded",
        "codes_checked" => checked,
        "logging" => crate::logging::is_initialized()
    );

    Ok(())
}
