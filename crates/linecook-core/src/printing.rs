use crate::config::{PrintSettings, TARGET_SIZE};
use crate::error::LineCookError;
use image::{Rgb, RgbImage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

const PROBED_COMMANDS: &[&str] = &["lpr", "lp", "lpstat", "lpq"];

/// Result of handing a file to the system print command.
///
/// A failing print job is reported here, not as an error: the label was still
/// produced and the caller decides how to surface the failure.
#[derive(Debug, Clone, Serialize)]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_used: Option<String>,
}

/// Snapshot of the local print setup, for troubleshooting.
#[derive(Debug, Clone, Serialize)]
pub struct PrintSetupReport {
    pub print_enabled: bool,
    pub print_command: String,
    pub print_debug: bool,
    pub system: String,
    pub timeout_secs: u64,
    pub available_commands: BTreeMap<String, String>,
    pub printers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer_error: Option<String>,
}

/// Determine the print command line for this platform and configuration.
pub fn resolve_print_command(settings: &PrintSettings) -> Result<Vec<String>, LineCookError> {
    resolve_for_os(&settings.command, std::env::consts::OS)
}

fn resolve_for_os(command: &str, os: &str) -> Result<Vec<String>, LineCookError> {
    if command.trim() == "auto" {
        return match os {
            "macos" => Ok(vec!["lpr".to_string()]),
            "linux" => Ok(vec!["lp".to_string()]),
            "windows" => Err(LineCookError::Printing(format!(
                "auto print not supported on {os}. Please configure PRINT_COMMAND explicitly"
            ))),
            other => Err(LineCookError::Printing(format!(
                "unsupported system for auto print: {other}"
            ))),
        };
    }

    let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        return Err(LineCookError::Printing("empty print command configured".into()));
    }
    Ok(parts)
}

enum RunResult {
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    TimedOut,
}

/// Run a command to completion, killing it once `timeout` has passed.
fn run_with_timeout(mut command: Command, timeout: Duration) -> std::io::Result<RunResult> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            let mut stdout = String::new();
            let mut stderr = String::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_string(&mut stdout)?;
            }
            if let Some(mut err) = child.stderr.take() {
                err.read_to_string(&mut stderr)?;
            }
            return Ok(RunResult::Exited {
                code: status.code(),
                stdout,
                stderr,
            });
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(RunResult::TimedOut);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// Send a file to the configured print command.
pub fn print_file(path: &Path, settings: &PrintSettings) -> Result<PrintOutcome, LineCookError> {
    if !settings.enabled {
        return Err(LineCookError::PrintingDisabled);
    }
    if !path.exists() {
        return Err(LineCookError::Printing(format!(
            "print file does not exist: {}",
            path.display()
        )));
    }

    let cmd = resolve_print_command(settings)?;
    let command_line = cmd.join(" ");
    if settings.debug {
        debug!("executing print command: {} {}", command_line, path.display());
    }

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).arg(path);

    let outcome = match run_with_timeout(command, Duration::from_secs(settings.timeout_secs)) {
        Ok(RunResult::Exited {
            code: Some(0),
            stdout,
            ..
        }) => {
            let mut message = "Print job submitted successfully".to_string();
            if settings.debug && !stdout.trim().is_empty() {
                message.push_str(&format!("\nOutput: {}", stdout.trim()));
            }
            info!(path = %path.display(), "print job submitted");
            PrintOutcome {
                success: true,
                message,
                command_used: Some(command_line),
            }
        }
        Ok(RunResult::Exited { code, stderr, .. }) => {
            let mut message = match code {
                Some(code) => format!("print command failed with exit code {code}"),
                None => "print command was terminated by a signal".to_string(),
            };
            if !stderr.trim().is_empty() {
                message.push_str(&format!(": {}", stderr.trim()));
            }
            error!("{message}");
            PrintOutcome {
                success: false,
                message,
                command_used: Some(command_line),
            }
        }
        Ok(RunResult::TimedOut) => {
            let message = format!(
                "print command timed out after {} seconds",
                settings.timeout_secs
            );
            error!("{message}");
            PrintOutcome {
                success: false,
                message,
                command_used: Some(command_line),
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let message = format!("print command not found: {}", cmd[0]);
            error!("{message}");
            PrintOutcome {
                success: false,
                message,
                command_used: None,
            }
        }
        Err(e) => {
            let message = format!("unexpected error during printing: {e}");
            error!("{message}");
            PrintOutcome {
                success: false,
                message,
                command_used: None,
            }
        }
    };

    Ok(outcome)
}

/// Probe the print tooling available on this machine.
pub fn check_print_setup(settings: &PrintSettings) -> PrintSetupReport {
    let mut available_commands = BTreeMap::new();
    for name in PROBED_COMMANDS {
        let mut command = Command::new(name);
        command.arg("--help");
        let status = match run_with_timeout(command, Duration::from_secs(5)) {
            Ok(RunResult::Exited { .. }) => "available".to_string(),
            Ok(RunResult::TimedOut) => "timeout".to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => "not found".to_string(),
            Err(e) => format!("error: {e}"),
        };
        debug!(command = name, status = %status, "probed print command");
        available_commands.insert(name.to_string(), status);
    }

    let mut printers = Vec::new();
    let mut printer_error = None;
    if matches!(std::env::consts::OS, "macos" | "linux") {
        let mut command = Command::new("lpstat");
        command.arg("-p");
        match run_with_timeout(command, Duration::from_secs(10)) {
            Ok(RunResult::Exited {
                code: Some(0),
                stdout,
                ..
            }) => printers = parse_printer_list(&stdout),
            Ok(RunResult::Exited { stderr, .. }) => printer_error = Some(stderr.trim().to_string()),
            Ok(RunResult::TimedOut) => printer_error = Some("lpstat timed out".to_string()),
            Err(e) => printer_error = Some(e.to_string()),
        }
    }

    PrintSetupReport {
        print_enabled: settings.enabled,
        print_command: settings.command.clone(),
        print_debug: settings.debug,
        system: std::env::consts::OS.to_string(),
        timeout_secs: settings.timeout_secs,
        available_commands,
        printers,
        printer_error,
    }
}

fn parse_printer_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A blank 4x6 label with a border and crosshair, for checking printer alignment.
pub fn create_test_label() -> RgbImage {
    let (width, height) = TARGET_SIZE;
    let black = Rgb([0, 0, 0]);
    let border = 12;
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let on_border =
            x < border || y < border || x >= width - border || y >= height - border;
        let on_cross = x.abs_diff(width / 2) < 2 || y.abs_diff(height / 2) < 2;
        // Solid header band so the top of the label is obvious.
        let in_header = (border * 3..border * 3 + 150).contains(&y)
            && (border * 3..width - border * 3).contains(&x);
        if on_border || on_cross || in_header {
            *pixel = black;
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_command_per_platform() {
        assert_eq!(resolve_for_os("auto", "macos").unwrap(), vec!["lpr"]);
        assert_eq!(resolve_for_os("auto", "linux").unwrap(), vec!["lp"]);
        assert!(resolve_for_os("auto", "windows").is_err());
        assert!(resolve_for_os("auto", "plan9").is_err());
    }

    #[test]
    fn test_custom_command_is_split() {
        assert_eq!(
            resolve_for_os("lpr -P  Zebra_LP2844 -o media=4x6", "linux").unwrap(),
            vec!["lpr", "-P", "Zebra_LP2844", "-o", "media=4x6"]
        );
    }

    #[test]
    fn test_blank_command_rejected() {
        assert!(resolve_for_os("   ", "linux").is_err());
    }

    #[test]
    fn test_disabled_printing_is_error() {
        let settings = PrintSettings {
            enabled: false,
            ..Default::default()
        };
        let err = print_file(Path::new("/nonexistent.png"), &settings).unwrap_err();
        assert!(matches!(err, LineCookError::PrintingDisabled));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = print_file(
            Path::new("/definitely/not/here.png"),
            &PrintSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LineCookError::Printing(_)));
    }

    #[test]
    fn test_missing_print_binary_is_reported_not_raised() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = PrintSettings {
            command: "linecook-no-such-printer-binary".into(),
            ..Default::default()
        };
        let outcome = print_file(file.path(), &settings).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_command() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = PrintSettings {
            command: "true".into(),
            ..Default::default()
        };
        let outcome = print_file(file.path(), &settings).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.command_used.as_deref(), Some("true"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reports_exit_code() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = PrintSettings {
            command: "false".into(),
            ..Default::default()
        };
        let outcome = print_file(file.path(), &settings).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("exit code 1"));
    }

    #[test]
    fn test_printer_list_parsing() {
        let out = "printer Zebra is idle.  enabled since Mon\n\n  printer Office disabled\n";
        assert_eq!(
            parse_printer_list(out),
            vec!["printer Zebra is idle.  enabled since Mon", "printer Office disabled"]
        );
    }

    #[test]
    fn test_test_label_geometry() {
        let img = create_test_label();
        assert_eq!(img.dimensions(), (1200, 1800));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(600, 900).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(200, 1200).0, [255, 255, 255]);
    }
}
