//! Saving and reopening workspaces as JSON archives.
//!
//! An archive lists every component (kind, name and the state it serialized),
//! every coupling as a pair of attribute references in creation order, and the
//! updater time. Components are rebuilt through the workspace's
//! [`ComponentFactory`](crate::core::components::ComponentFactory).

use super::workspace::Workspace;
use crate::core::attributes::{Consumer, Producer};
use crate::core::couplings::Coupling;
use crate::core::errors::{ArchiveError, CouplingError};
use crate::core::types::ContainerKey;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceArchive {
    pub time: u64,
    pub components: Vec<ComponentEntry>,
    pub couplings: Vec<CouplingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub kind: String,
    pub name: String,
    #[serde(default = "update_on_default")]
    pub update_on: bool,
    #[serde(default)]
    pub state: serde_json::Value,
}

fn update_on_default() -> bool {
    true
}

/// Names one attribute: the component, its container and the accessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRef {
    pub component: String,
    pub container: String,
    pub accessor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouplingEntry {
    pub producer: AttributeRef,
    pub consumer: AttributeRef,
}

impl AttributeRef {
    fn unresolved(&self) -> ArchiveError {
        ArchiveError::UnresolvedAttribute {
            component: self.component.clone(),
            container: self.container.clone(),
            accessor: self.accessor.clone(),
        }
    }
}

impl Workspace {
    /// Capture the workspace as an archive
    pub fn to_archive(&self) -> Result<WorkspaceArchive, ArchiveError> {
        let handles = self.components();
        let mut owners: HashMap<ContainerKey, String> = HashMap::new();
        let mut components = Vec::with_capacity(handles.len());

        for handle in &handles {
            for key in handle.container_keys() {
                owners.insert(key, handle.name().to_string());
            }
            let state = handle.save().map_err(|source| ArchiveError::Component {
                component: handle.name().to_string(),
                source,
            })?;
            components.push(ComponentEntry {
                kind: handle.kind().to_string(),
                name: handle.name().to_string(),
                update_on: handle.is_update_on(),
                state,
            });
        }

        let couplings = self
            .couplings()
            .iter()
            .filter_map(|coupling| {
                let entry = archive_coupling(coupling, &owners);
                if entry.is_none() {
                    warn!("Not archiving coupling {}: an endpoint has no owning component", coupling);
                }
                entry
            })
            .collect();

        Ok(WorkspaceArchive {
            time: self.time(),
            components,
            couplings,
        })
    }

    /// Replace the contents of the workspace with an archive.
    ///
    /// Like [`clear`](Workspace::clear), waits for a cycle in flight to finish.
    pub fn restore(&self, archive: WorkspaceArchive) -> Result<(), ArchiveError> {
        let _halted = self.updater().halt();
        self.clear_halted();

        for entry in archive.components {
            let component = self.factory.create(&entry.kind, &entry.name, entry.state)?;
            let handle = self.add_boxed_component(Some(&entry.name), component)?;
            handle.set_update_on(entry.update_on);
        }

        for entry in &archive.couplings {
            let producer = self
                .producer(&entry.producer.component, &entry.producer.container, &entry.producer.accessor)
                .map_err(|e| unresolved(e, &entry.producer))?;
            let consumer = self
                .consumer(&entry.consumer.component, &entry.consumer.container, &entry.consumer.accessor)
                .map_err(|e| unresolved(e, &entry.consumer))?;
            self.couple(producer, consumer)?;
        }

        self.updater().set_time(archive.time);
        info!(
            "Workspace restored: {} components, {} couplings, time {}",
            self.components().len(),
            archive.couplings.len(),
            archive.time
        );
        Ok(())
    }

    /// Write the workspace as JSON
    pub fn save<W: Write>(&self, writer: W) -> Result<(), ArchiveError> {
        serde_json::to_writer_pretty(writer, &self.to_archive()?)?;
        Ok(())
    }

    /// Read a JSON archive, replacing the contents of the workspace
    pub fn load<R: Read>(&self, reader: R) -> Result<(), ArchiveError> {
        let archive: WorkspaceArchive = serde_json::from_reader(reader)?;
        self.restore(archive)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        self.load(BufReader::new(File::open(path)?))
    }
}

fn archive_coupling(coupling: &Coupling, owners: &HashMap<ContainerKey, String>) -> Option<CouplingEntry> {
    let producer: &Producer = coupling.producer();
    let consumer: &Consumer = coupling.consumer();
    Some(CouplingEntry {
        producer: AttributeRef {
            component: owners.get(&producer.container_key())?.clone(),
            container: producer.container_id().to_string(),
            accessor: producer.accessor().to_string(),
        },
        consumer: AttributeRef {
            component: owners.get(&consumer.container_key())?.clone(),
            container: consumer.container_id().to_string(),
            accessor: consumer.accessor().to_string(),
        },
    })
}

/// Lookup failures while restoring become `UnresolvedAttribute`; type errors stay coupling errors
fn unresolved(error: CouplingError, reference: &AttributeRef) -> ArchiveError {
    match error {
        CouplingError::UnknownComponent(_)
        | CouplingError::UnknownContainer { .. }
        | CouplingError::UnknownAttribute { .. } => reference.unresolved(),
        other => other.into(),
    }
}
