use linecook_core::artifact::LabelArtifact;
use linecook_core::config::PrintSettings;
use linecook_core::error::LineCookError;
use linecook_core::printing;
use std::path::Path;

use crate::output;

pub fn print(file: &Path, settings: &PrintSettings) -> Result<(), LineCookError> {
    let outcome = printing::print_file(file, settings)?;
    output::table::print_outcome(&outcome);
    Ok(())
}

pub fn status(settings: &PrintSettings, output_format: &str) -> Result<(), LineCookError> {
    let report = printing::check_print_setup(settings);
    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_setup(&report),
    }
    Ok(())
}

/// Print a 4x6 alignment label through the normal artifact path.
pub fn test_label(settings: &PrintSettings) -> Result<(), LineCookError> {
    if !settings.enabled {
        return Err(LineCookError::PrintingDisabled);
    }
    let artifact = LabelArtifact::create(&printing::create_test_label())?;
    let outcome = printing::print_file(artifact.path(), settings)?;
    output::table::print_outcome(&outcome);
    Ok(())
}
