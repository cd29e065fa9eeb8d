//! Output formatting.
//!
//! Every command result implements [`Report`]: serde covers `json`,
//! `json-compact` and `yaml`, while the report itself decides what the
//! human table and the script-friendly plain view look like.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use devcap_core::MatchTier;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};

/// A printable command result.
pub trait Report: Serialize {
    /// View for `--output table`.
    fn table(&self, color: bool) -> String;

    /// View for `--output plain`: bare values, one per line.
    fn plain(&self) -> String;
}

// ── Color ───────────────────────────────────────────────────────────

pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Tier label, colored by how confident the match is.
pub fn tier_label(tier: MatchTier, color: bool) -> String {
    let label = tier.to_string();
    if !color {
        return label;
    }
    match tier {
        MatchTier::Exact => label.green().to_string(),
        MatchTier::Conclusive => label.cyan().to_string(),
        MatchTier::Recovery => label.yellow().to_string(),
        MatchTier::RecoveryCatchAll | MatchTier::None => label.red().to_string(),
    }
}

// ── Rendering ───────────────────────────────────────────────────────

pub fn render<R: Report + ?Sized>(format: &OutputFormat, report: &R, color: bool) -> String {
    match format {
        OutputFormat::Table => report.table(color),
        OutputFormat::Plain => report.plain(),
        OutputFormat::Json => serde_json::to_string_pretty(report).expect("serializable report"),
        OutputFormat::JsonCompact => serde_json::to_string(report).expect("serializable report"),
        OutputFormat::Yaml => serde_yaml::to_string(report).expect("serializable report"),
    }
}

/// Render `report` in the format and color mode the global flags select
/// and print it.
pub fn emit<R: Report + ?Sized>(report: &R, global: &GlobalOpts) {
    let color = should_color(&global.color);
    print_output(&render(&global.output, report, color), global.quiet);
}

pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Rounded `tabled` table over report rows.
pub fn rows_table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// `name=value` lines, the plain form of capability listings.
pub fn assignments<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> String
where
    N: std::fmt::Display,
    V: std::fmt::Display,
{
    pairs
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Widths(Vec<(&'static str, u32)>);

    #[derive(Tabled)]
    struct WidthRow {
        #[tabled(rename = "Device")]
        id: &'static str,
        #[tabled(rename = "Width")]
        width: u32,
    }

    impl Report for Widths {
        fn table(&self, _color: bool) -> String {
            rows_table(self.0.iter().map(|&(id, width)| WidthRow { id, width }))
        }

        fn plain(&self) -> String {
            assignments(self.0.iter().copied())
        }
    }

    fn widths() -> Widths {
        Widths(vec![("nokia_6300", 240), ("apple_iphone_ver1", 320)])
    }

    #[test]
    fn plain_is_one_assignment_per_line() {
        assert_eq!(
            render(&OutputFormat::Plain, &widths(), false),
            "nokia_6300=240\napple_iphone_ver1=320"
        );
    }

    #[test]
    fn compact_json_comes_from_serde() {
        assert_eq!(
            render(&OutputFormat::JsonCompact, &widths(), false),
            r#"[["nokia_6300",240],["apple_iphone_ver1",320]]"#
        );
    }

    #[test]
    fn table_has_headers_and_rows() {
        let out = render(&OutputFormat::Table, &widths(), false);
        assert!(out.contains("Device"));
        assert!(out.contains("apple_iphone_ver1"));
    }

    #[test]
    fn uncolored_tier_label_is_the_kebab_name() {
        assert_eq!(tier_label(MatchTier::RecoveryCatchAll, false), "recovery-catchall");
    }
}
