//! Classifier index command handlers.

use tabled::Tabled;

use devcap_core::{Engine, IndexStats};

use crate::cli::{GlobalOpts, IndexArgs, IndexCommand};
use crate::error::CliError;
use crate::output::{self, Report};

#[derive(Tabled)]
struct IndexRow {
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Entries")]
    entries: usize,
}

impl From<&IndexStats> for IndexRow {
    fn from(s: &IndexStats) -> Self {
        Self {
            family: s.family.to_string(),
            key: s.key.clone(),
            entries: s.entries,
        }
    }
}

impl Report for [IndexStats] {
    fn table(&self, _color: bool) -> String {
        output::rows_table(self.iter().map(IndexRow::from))
    }

    fn plain(&self) -> String {
        self.iter()
            .map(|s| format!("{}\t{}", s.family, s.entries))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn handle(engine: &Engine, args: IndexArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let build = matches!(args.command, IndexCommand::Build);
    if build {
        engine.rebuild_indices()?;
    }

    let stats = engine.index_stats();
    if build && !global.quiet {
        let total: usize = stats.iter().map(|s| s.entries).sum();
        eprintln!("Indexed {total} reference strings across {} families", stats.len());
    }

    output::emit(stats.as_slice(), global);
    Ok(())
}
