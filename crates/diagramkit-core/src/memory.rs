//! In-memory [`DiagramApi`] backend.
//!
//! Used by the replay binary and by tests. Deleted entities remember the index
//! they occupied so that restoring them reproduces the aggregate exactly.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::api::DiagramApi;
use crate::error::{Error, Result};
use crate::model::{
    Connector, ConnectorUpdate, Diagram, NewConnector, NewShape, Shape, ShapePatch, ShapeUpdate,
};

#[derive(Default)]
struct Inner {
    diagrams: HashMap<String, Diagram>,
    // (diagram id, entity id) -> index the entity occupied when deleted
    shape_slots: HashMap<(String, String), usize>,
    connector_slots: HashMap<(String, String), usize>,
    calls: HashMap<&'static str, usize>,
    fail_writes: bool,
}

impl Inner {
    fn record(&mut self, method: &'static str) {
        *self.calls.entry(method).or_insert(0) += 1;
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Persistence {
                reason: "backend rejected the write".to_string(),
            });
        }
        Ok(())
    }
}

/// Thread-safe in-memory diagram backend.
#[derive(Default)]
pub struct InMemoryDiagramApi {
    inner: Mutex<Inner>,
}

impl InMemoryDiagramApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend seeded with the given diagrams.
    pub fn with_diagrams(diagrams: impl IntoIterator<Item = Diagram>) -> Self {
        let api = Self::new();
        for diagram in diagrams {
            api.insert_diagram(diagram);
        }
        api
    }

    pub fn insert_diagram(&self, diagram: Diagram) {
        self.inner.lock().diagrams.insert(diagram.id.clone(), diagram);
    }

    /// Snapshot of a stored diagram, bypassing call accounting.
    pub fn diagram(&self, diagram_id: &str) -> Option<Diagram> {
        self.inner.lock().diagrams.get(diagram_id).cloned()
    }

    /// Number of calls made to `method` so far.
    pub fn calls(&self, method: &str) -> usize {
        self.inner.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Number of calls across every method.
    pub fn total_calls(&self) -> usize {
        self.inner.lock().calls.values().sum()
    }

    /// Number of mutating calls (everything but `get_diagram`).
    pub fn write_calls(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .calls
            .iter()
            .filter(|(method, _)| **method != "get_diagram")
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn reset_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// When set, every mutating call fails with [`Error::Persistence`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    fn write<F>(&self, method: &'static str, diagram_id: &str, f: F) -> Result<Option<Diagram>>
    where
        F: FnOnce(&mut Diagram, &mut SlotBook<'_>) -> Option<()>,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.record(method);
        inner.check_writable()?;

        let Some(current) = inner.diagrams.get(diagram_id) else {
            debug!("{}: diagram {} not found", method, diagram_id);
            return Ok(None);
        };

        // Work on a copy so a miss halfway through leaves the stored aggregate untouched.
        let mut working = current.clone();
        let mut book = SlotBook {
            diagram_id,
            shapes: &mut inner.shape_slots,
            connectors: &mut inner.connector_slots,
            pending_shapes: Vec::new(),
            pending_connectors: Vec::new(),
        };
        if f(&mut working, &mut book).is_none() {
            debug!("{}: entity not found in diagram {}", method, diagram_id);
            return Ok(None);
        }
        book.commit();
        inner.diagrams.insert(diagram_id.to_string(), working.clone());
        Ok(Some(working))
    }
}

/// Staged tombstone bookkeeping for one write.
struct SlotBook<'a> {
    diagram_id: &'a str,
    shapes: &'a mut HashMap<(String, String), usize>,
    connectors: &'a mut HashMap<(String, String), usize>,
    pending_shapes: Vec<(String, usize)>,
    pending_connectors: Vec<(String, usize)>,
}

impl SlotBook<'_> {
    fn shape_slot(&self, shape_id: &str) -> Option<usize> {
        self.shapes
            .get(&(self.diagram_id.to_string(), shape_id.to_string()))
            .copied()
    }

    fn connector_slot(&self, connector_id: &str) -> Option<usize> {
        self.connectors
            .get(&(self.diagram_id.to_string(), connector_id.to_string()))
            .copied()
    }

    fn commit(self) {
        for (id, index) in self.pending_shapes {
            self.shapes.insert((self.diagram_id.to_string(), id), index);
        }
        for (id, index) in self.pending_connectors {
            self.connectors.insert((self.diagram_id.to_string(), id), index);
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Removes the listed entities, returning their original indices. `None` if any id is missing.
fn remove_by_ids<T>(items: &mut Vec<T>, ids: &[String], id_of: impl Fn(&T) -> &str) -> Option<Vec<(String, usize)>> {
    let mut removed = Vec::with_capacity(ids.len());
    for id in ids {
        let index = items.iter().position(|item| id_of(item) == id.as_str())?;
        removed.push((id.clone(), index));
    }
    items.retain(|item| !ids.iter().any(|id| id == id_of(item)));
    Some(removed)
}

/// Inserts entities back at their remembered indices, lowest index first.
fn insert_at_slots<T>(items: &mut Vec<T>, mut restored: Vec<(T, usize)>) {
    restored.sort_by_key(|(_, index)| *index);
    for (item, index) in restored {
        let at = index.min(items.len());
        items.insert(at, item);
    }
}

#[async_trait]
impl DiagramApi for InMemoryDiagramApi {
    async fn get_diagram(&self, diagram_id: &str) -> Result<Option<Diagram>> {
        let mut inner = self.inner.lock();
        inner.record("get_diagram");
        Ok(inner.diagrams.get(diagram_id).cloned())
    }

    async fn add_shape(&self, diagram_id: &str, shape: NewShape) -> Result<Option<Diagram>> {
        self.write("add_shape", diagram_id, |diagram, _| {
            diagram.shapes.push(Shape::from_new(new_id(), shape));
            Some(())
        })
    }

    async fn add_shapes(&self, diagram_id: &str, shapes: Vec<NewShape>) -> Result<Option<Diagram>> {
        self.write("add_shapes", diagram_id, |diagram, _| {
            diagram
                .shapes
                .extend(shapes.into_iter().map(|s| Shape::from_new(new_id(), s)));
            Some(())
        })
    }

    async fn update_shape(
        &self,
        diagram_id: &str,
        shape_id: &str,
        update: ShapeUpdate,
    ) -> Result<Option<Diagram>> {
        self.write("update_shape", diagram_id, |diagram, _| {
            update.apply_to(diagram.shape_mut(shape_id)?);
            Some(())
        })
    }

    async fn update_shapes(&self, diagram_id: &str, patches: Vec<ShapePatch>) -> Result<Option<Diagram>> {
        self.write("update_shapes", diagram_id, |diagram, _| {
            for patch in &patches {
                patch.update.apply_to(diagram.shape_mut(&patch.id)?);
            }
            Some(())
        })
    }

    async fn delete_shape(&self, diagram_id: &str, shape_id: &str) -> Result<Option<Diagram>> {
        self.write("delete_shape", diagram_id, |diagram, book| {
            let removed = remove_by_ids(&mut diagram.shapes, &[shape_id.to_string()], |s| s.id.as_str())?;
            book.pending_shapes.extend(removed);
            Some(())
        })
    }

    async fn delete_shapes_by_ids(
        &self,
        diagram_id: &str,
        shape_ids: Vec<String>,
        connector_ids: Vec<String>,
    ) -> Result<Option<Diagram>> {
        self.write("delete_shapes_by_ids", diagram_id, |diagram, book| {
            let connectors = remove_by_ids(&mut diagram.connectors, &connector_ids, |c| c.id.as_str())?;
            let shapes = remove_by_ids(&mut diagram.shapes, &shape_ids, |s| s.id.as_str())?;
            book.pending_connectors.extend(connectors);
            book.pending_shapes.extend(shapes);
            Some(())
        })
    }

    async fn restore_shape(&self, diagram_id: &str, shape: Shape) -> Result<Option<Diagram>> {
        self.restore_shapes(diagram_id, vec![shape], Vec::new()).await
    }

    async fn restore_shapes(
        &self,
        diagram_id: &str,
        shapes: Vec<Shape>,
        connectors: Vec<Connector>,
    ) -> Result<Option<Diagram>> {
        self.write("restore_shapes", diagram_id, |diagram, book| {
            let shapes: Vec<_> = shapes
                .into_iter()
                .filter(|s| diagram.shape(&s.id).is_none())
                .map(|s| {
                    let slot = book.shape_slot(&s.id).unwrap_or(usize::MAX);
                    (s, slot)
                })
                .collect();
            insert_at_slots(&mut diagram.shapes, shapes);

            let connectors: Vec<_> = connectors
                .into_iter()
                .filter(|c| diagram.connector(&c.id).is_none())
                .map(|c| {
                    let slot = book.connector_slot(&c.id).unwrap_or(usize::MAX);
                    (c, slot)
                })
                .collect();
            insert_at_slots(&mut diagram.connectors, connectors);
            Some(())
        })
    }

    async fn add_connector(&self, diagram_id: &str, connector: NewConnector) -> Result<Option<Diagram>> {
        self.write("add_connector", diagram_id, |diagram, _| {
            diagram.shape(&connector.source_shape_id)?;
            diagram.shape(&connector.target_shape_id)?;
            diagram.connectors.push(Connector::from_new(new_id(), connector));
            Some(())
        })
    }

    async fn update_connector(
        &self,
        diagram_id: &str,
        connector_id: &str,
        update: ConnectorUpdate,
    ) -> Result<Option<Diagram>> {
        self.write("update_connector", diagram_id, |diagram, _| {
            update.apply_to(diagram.connector_mut(connector_id)?);
            Some(())
        })
    }

    async fn delete_connector(&self, diagram_id: &str, connector_id: &str) -> Result<Option<Diagram>> {
        self.delete_connectors_by_ids(diagram_id, vec![connector_id.to_string()])
            .await
    }

    async fn delete_connectors_by_ids(
        &self,
        diagram_id: &str,
        connector_ids: Vec<String>,
    ) -> Result<Option<Diagram>> {
        self.write("delete_connectors_by_ids", diagram_id, |diagram, book| {
            let removed = remove_by_ids(&mut diagram.connectors, &connector_ids, |c| c.id.as_str())?;
            book.pending_connectors.extend(removed);
            Some(())
        })
    }

    async fn restore_connector(&self, diagram_id: &str, connector: Connector) -> Result<Option<Diagram>> {
        self.restore_connectors(diagram_id, vec![connector]).await
    }

    async fn restore_connectors(
        &self,
        diagram_id: &str,
        connectors: Vec<Connector>,
    ) -> Result<Option<Diagram>> {
        self.restore_shapes(diagram_id, Vec::new(), connectors).await
    }
}
