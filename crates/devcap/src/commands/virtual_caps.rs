//! Virtual capability command handler.

use serde::Serialize;
use tabled::Tabled;

use devcap_core::{Engine, VirtualValue};

use crate::cli::{GlobalOpts, VirtualArgs};
use crate::error::CliError;
use crate::output::{self, Report};

use super::util;

#[derive(Debug, Serialize)]
struct VirtualEntry {
    name: &'static str,
    value: VirtualValue,
}

#[derive(Tabled)]
struct VirtualRow {
    #[tabled(rename = "Capability")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl Report for [VirtualEntry] {
    fn table(&self, _color: bool) -> String {
        output::rows_table(self.iter().map(|e| VirtualRow {
            name: e.name,
            value: e.value.to_string(),
        }))
    }

    fn plain(&self) -> String {
        output::assignments(self.iter().map(|e| (e.name, &e.value)))
    }
}

impl Report for VirtualValue {
    fn table(&self, _color: bool) -> String {
        self.to_string()
    }

    fn plain(&self) -> String {
        self.to_string()
    }
}

pub fn handle(engine: &Engine, args: VirtualArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let request = util::build_request(&args.request)?;
    let mut provider = engine.virtual_capabilities(request);
    tracing::debug!(device_id = provider.device().id(), "resolving virtual capabilities");

    match args.name {
        Some(name) => output::emit(&provider.get(&name)?, global),
        None => {
            let entries: Vec<VirtualEntry> = provider
                .get_all()
                .into_iter()
                .map(|(name, value)| VirtualEntry { name, value })
                .collect();
            output::emit(entries.as_slice(), global);
        }
    }
    Ok(())
}
