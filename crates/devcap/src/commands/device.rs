//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use devcap_core::{Engine, ResolvedDevice};

use crate::cli::{DeviceArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Report};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CapabilityEntry {
    group: String,
    name: String,
    value: String,
}

#[derive(Tabled)]
struct CapabilityRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Capability")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&CapabilityEntry> for CapabilityRow {
    fn from(c: &CapabilityEntry) -> Self {
        Self {
            group: c.group.clone(),
            name: c.name.clone(),
            value: c.value.clone(),
        }
    }
}

impl Report for [CapabilityEntry] {
    fn table(&self, _color: bool) -> String {
        output::rows_table(self.iter().map(CapabilityRow::from))
    }

    fn plain(&self) -> String {
        output::assignments(self.iter().map(|c| (&c.name, &c.value)))
    }
}

#[derive(Debug, Serialize)]
struct PathEntry {
    depth: usize,
    id: String,
    actual_device_root: bool,
}

#[derive(Tabled)]
struct PathRow {
    #[tabled(rename = "#")]
    depth: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device Root")]
    root: String,
}

impl From<&PathEntry> for PathRow {
    fn from(p: &PathEntry) -> Self {
        Self {
            depth: p.depth,
            id: p.id.clone(),
            root: if p.actual_device_root { "yes".into() } else { String::new() },
        }
    }
}

impl Report for [PathEntry] {
    fn table(&self, _color: bool) -> String {
        output::rows_table(self.iter().map(PathRow::from))
    }

    fn plain(&self) -> String {
        self.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join("\n")
    }
}

// ── Collectors ──────────────────────────────────────────────────────

fn capabilities(device: &ResolvedDevice, group: Option<&str>) -> Vec<CapabilityEntry> {
    device
        .all_capabilities()
        .into_iter()
        .filter(|(g, _)| group.is_none_or(|wanted| g == wanted))
        .flat_map(|(g, caps)| {
            caps.into_iter().map(move |(name, value)| CapabilityEntry {
                group: g.clone(),
                name,
                value,
            })
        })
        .collect()
}

fn fall_back_path(device: &ResolvedDevice) -> Vec<PathEntry> {
    let tree = device.tree();
    device
        .fall_back_path()
        .into_iter()
        .enumerate()
        .map(|(depth, id)| PathEntry {
            depth,
            id: id.to_owned(),
            actual_device_root: tree.resolve(id).is_ok_and(|d| d.actual_device_root),
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(engine: &Engine, args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let device = engine.device(&args.id)?;

    if args.fallback {
        output::emit(fall_back_path(&device).as_slice(), global);
        return Ok(());
    }

    if let Some(ref group) = args.group {
        if !device.tree().is_group_defined(group) {
            return Err(CliError::NotFound {
                resource_type: "capability group".into(),
                identifier: group.clone(),
                hint: format!("Run: devcap device {} to see every group", args.id),
            });
        }
    }
    output::emit(capabilities(&device, args.group.as_deref()).as_slice(), global);
    Ok(())
}
