use linecook_core::printing::{PrintOutcome, PrintSetupReport};
use linecook_core::report::LabelReport;

pub fn print_report(report: &LabelReport) {
    println!("=== {} ===\n", report.filename);

    if !report.success {
        println!("  No label: {}\n", report.message);
        return;
    }

    println!("  {}", report.message);
    if let Some(source) = &report.source {
        println!("  Source:      {source}");
    }
    if let Some(dims) = &report.label_dimensions {
        let rotated = if report.rotated { " (rotated)" } else { "" };
        println!("  Dimensions:  {}x{}{}", dims.width, dims.height, rotated);
    }
    if let Some(confidence) = report.confidence {
        println!("  Confidence:  {confidence:.3}");
    }

    if report.print_attempted {
        let status = match report.print_success {
            Some(true) => "submitted",
            _ => "FAILED",
        };
        println!("  Print:       {status}");
        if let Some(message) = &report.print_message {
            println!("    {message}");
        }
    }
    println!();
}

pub fn print_outcome(outcome: &PrintOutcome) {
    let status = if outcome.success { "OK" } else { "FAILED" };
    match &outcome.command_used {
        Some(command) => println!("{status} ({command}): {}", outcome.message),
        None => println!("{status}: {}", outcome.message),
    }
}

pub fn print_setup(report: &PrintSetupReport) {
    println!("=== Print setup ({}) ===\n", report.system);
    println!("  Enabled:  {}", report.print_enabled);
    println!("  Command:  {}", report.print_command);
    println!("  Debug:    {}", report.print_debug);
    println!("  Timeout:  {}s\n", report.timeout_secs);

    let width = report
        .available_commands
        .keys()
        .map(|name| name.len())
        .max()
        .unwrap_or(4);
    println!("  Commands:");
    for (name, status) in &report.available_commands {
        println!("    {:<width$}  {}", name, status, width = width);
    }

    println!();
    if let Some(err) = &report.printer_error {
        println!("  Printers: unavailable ({err})");
    } else if report.printers.is_empty() {
        println!("  Printers: none found");
    } else {
        println!("  Printers:");
        for printer in &report.printers {
            println!("    {printer}");
        }
    }
}
