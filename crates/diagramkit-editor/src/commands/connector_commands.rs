use async_trait::async_trait;
use diagramkit_core::{Connector, ConnectorUpdate, Error, NewConnector, Result};

use super::shape_commands::unique;
use super::{Command, CommandDeps};

/// Connects two existing shapes.
pub struct AddConnectorCommand {
    deps: CommandDeps,
    diagram_id: String,
    connector: NewConnector,
    created: Option<Connector>,
}

impl AddConnectorCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, connector: NewConnector) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            connector,
            created: None,
        }
    }

    pub fn created_connector(&self) -> Option<&Connector> {
        self.created.as_ref()
    }
}

#[async_trait]
impl Command for AddConnectorCommand {
    async fn execute(&mut self) -> Result<()> {
        let current = self.deps.diagram(&self.diagram_id)?;
        for endpoint in [&self.connector.source_shape_id, &self.connector.target_shape_id] {
            if current.shape(endpoint).is_none() {
                return Err(Error::shape_not_found(&self.diagram_id, endpoint));
            }
        }

        let primitives = &self.deps.primitives;
        let diagram = match &self.created {
            Some(connector) => {
                primitives
                    .restore_connectors(&self.diagram_id, vec![connector.clone()])
                    .await?
            }
            None => primitives.add_connector(&self.diagram_id, self.connector.clone()).await?,
        };

        let connector = match &self.created {
            Some(connector) => diagram.connector(&connector.id).cloned(),
            None => diagram.connectors.last().cloned(),
        }
        .ok_or_else(|| Error::other("add_connector returned an aggregate without the new connector"))?;

        self.deps.sync(&diagram, &[], &[connector.id.clone()]);
        self.created = Some(connector);
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(created) = &self.created else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        let connector_id = created.id.clone();
        if let Some(current) = self
            .deps
            .primitives
            .diagram(&self.diagram_id)
            .and_then(|d| d.connector(&connector_id).cloned())
        {
            self.created = Some(current);
        }

        let diagram = self
            .deps
            .primitives
            .delete_connectors(&self.diagram_id, vec![connector_id.clone()])
            .await?;
        self.deps.sync(&diagram, &[], &[connector_id]);
        Ok(())
    }

    fn description(&self) -> &str {
        "Add connector"
    }
}

/// Deletes connectors in one round trip.
pub struct DeleteConnectorsCommand {
    deps: CommandDeps,
    diagram_id: String,
    connector_ids: Vec<String>,
    removed: Option<Vec<Connector>>,
}

impl DeleteConnectorsCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, connector_ids: Vec<String>) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            connector_ids: unique(connector_ids),
            removed: None,
        }
    }
}

#[async_trait]
impl Command for DeleteConnectorsCommand {
    async fn execute(&mut self) -> Result<()> {
        let current = self.deps.diagram(&self.diagram_id)?;
        let mut removed = Vec::with_capacity(self.connector_ids.len());
        for id in &self.connector_ids {
            let connector = current
                .connector(id)
                .ok_or_else(|| Error::connector_not_found(&self.diagram_id, id))?;
            removed.push(connector.clone());
        }

        let diagram = self
            .deps
            .primitives
            .delete_connectors(&self.diagram_id, self.connector_ids.clone())
            .await?;
        self.deps.sync(&diagram, &[], &self.connector_ids);
        self.removed = Some(removed);
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(removed) = &self.removed else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        let diagram = self
            .deps
            .primitives
            .restore_connectors(&self.diagram_id, removed.clone())
            .await?;
        self.deps.sync(&diagram, &[], &self.connector_ids);
        Ok(())
    }

    fn description(&self) -> &str {
        if self.connector_ids.len() == 1 {
            "Delete connector"
        } else {
            "Delete connectors"
        }
    }
}

/// Sets or clears a connector's label.
pub struct UpdateConnectorLabelCommand {
    deps: CommandDeps,
    diagram_id: String,
    connector_id: String,
    label: Option<String>,
    previous: Option<Option<String>>,
}

impl UpdateConnectorLabelCommand {
    pub fn new(
        deps: CommandDeps,
        diagram_id: impl Into<String>,
        connector_id: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            connector_id: connector_id.into(),
            label,
            previous: None,
        }
    }

    async fn set_label(&self, label: Option<String>) -> Result<()> {
        let diagram = self
            .deps
            .primitives
            .update_connector(&self.diagram_id, &self.connector_id, ConnectorUpdate::label(label))
            .await?;
        self.deps.sync(&diagram, &[], &[self.connector_id.clone()]);
        Ok(())
    }
}

#[async_trait]
impl Command for UpdateConnectorLabelCommand {
    async fn execute(&mut self) -> Result<()> {
        if self.previous.is_none() {
            let current = self.deps.diagram(&self.diagram_id)?;
            let connector = current
                .connector(&self.connector_id)
                .ok_or_else(|| Error::connector_not_found(&self.diagram_id, &self.connector_id))?;
            self.previous = Some(connector.label.clone());
        }
        self.set_label(self.label.clone()).await
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(previous) = self.previous.clone() else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        self.set_label(previous).await
    }

    fn description(&self) -> &str {
        "Rename connector"
    }
}
