//! Output rendering and formatting

use arcdl_config::ColorChoice;
use arcdl_extract::ExtractReport;
use arcdl_net::FetchResult;
use arcdl_ops::{FindReport, HashReport, InstallReport, OperationResult, ShortcutOutcome};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_text(result)
        }
    }

    /// Whether styled output should be used
    pub fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    fn render_text(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Fetch(result) => self.render_fetch_result(result),
            OperationResult::Extract(report) => self.render_extract_report(report),
            OperationResult::Install(report) => self.render_install_report(report),
            OperationResult::Hash(report) => Self::render_hash_report(report),
            OperationResult::Find(report) => Self::render_find_report(report),
            OperationResult::Success(message) => {
                println!("{message}");
                Ok(())
            }
        }
    }

    fn render_fetch_result(&self, result: &FetchResult) -> io::Result<()> {
        println!("{}", self.heading("Download Summary"));
        println!();
        println!("{}", self.fetch_table(result));
        Ok(())
    }

    fn fetch_table(&self, result: &FetchResult) -> Table {
        let mut table = self.key_value_table();
        table.add_row(vec![Cell::new("Path"), Cell::new(result.path.display())]);
        table.add_row(vec![Cell::new("Size"), Cell::new(format_size(result.size))]);
        table.add_row(vec![
            Cell::new(result.hash.algorithm().as_str().to_uppercase()),
            Cell::new(result.hash.to_hex()),
        ]);
        table.add_row(vec![Cell::new("Verified"), self.yes_no(result.verified)]);
        if result.resumed_from > 0 {
            table.add_row(vec![
                Cell::new("Resumed from"),
                Cell::new(format_size(result.resumed_from)),
            ]);
        }
        if result.attempts > 1 {
            table.add_row(vec![Cell::new("Attempts"), Cell::new(result.attempts)]);
        }
        table.add_row(vec![
            Cell::new("Elapsed"),
            Cell::new(format!("{:.2}s", result.elapsed.as_secs_f64())),
        ]);
        table
    }

    fn render_extract_report(&self, report: &ExtractReport) -> io::Result<()> {
        println!(
            "{} {} files, {} directories ({}) to {}",
            self.heading("Extracted"),
            report.files,
            report.directories,
            format_size(report.bytes),
            report.destination.display()
        );
        Ok(())
    }

    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        println!("{}", self.heading("Installation Summary"));
        println!();
        println!("{}", self.fetch_table(&report.download));
        println!();
        println!(
            "Extracted:  {} files, {} directories into {}",
            report.extract.files,
            report.extract.directories,
            report.extract.destination.display()
        );
        match &report.executable {
            Some(path) => println!("Executable: {}", path.display()),
            None => println!("Executable: -"),
        }
        match &report.shortcut {
            ShortcutOutcome::Created { path } => println!("Shortcut:   {}", path.display()),
            ShortcutOutcome::Skipped { reason } => println!("Shortcut:   skipped ({reason})"),
            ShortcutOutcome::Failed { message } => {
                let text = format!("Shortcut:   failed ({message})");
                if self.supports_color() {
                    println!("{}", Style::new().yellow().apply_to(text));
                } else {
                    println!("{text}");
                }
            }
        }
        println!();
        println!("Completed in {}ms", report.duration_ms);
        Ok(())
    }

    /// Same layout as `sha256sum`
    fn render_hash_report(report: &HashReport) -> io::Result<()> {
        println!("{}  {}", report.hash, report.path.display());
        Ok(())
    }

    fn render_find_report(report: &FindReport) -> io::Result<()> {
        if report.matches.is_empty() {
            println!(
                "No files matching {:?} under {}",
                report.pattern,
                report.root.display()
            );
            return Ok(());
        }
        for path in &report.matches {
            println!("{}", path.display());
        }
        Ok(())
    }

    fn key_value_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.supports_color() {
            table.force_no_tty();
        }
        table
    }

    fn yes_no(&self, value: bool) -> Cell {
        let (text, color) = if value {
            ("Yes", Color::Green)
        } else {
            ("No", Color::Yellow)
        };
        let cell = Cell::new(text);
        if self.supports_color() {
            cell.fg(color).add_attribute(Attribute::Bold)
        } else {
            cell
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Human readable byte count
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_color_choice() {
        assert!(OutputRenderer::new(false, ColorChoice::Always).supports_color());
        assert!(!OutputRenderer::new(false, ColorChoice::Never).supports_color());
    }
}
