//! Sequence-diagram derivations.
//!
//! Lifeline height and activation boxes are derived from the message
//! connectors between lifelines. The engine only calls into this through
//! [`SequenceLayout`]; [`BasicSequenceLayout`] is a vertical-order layout good
//! enough for editing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SequenceConfig;
use crate::model::{Connector, Shape, ShapeId};

/// A vertical activation bar on a lifeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationBox {
    pub start_y: f64,
    pub end_y: f64,
    /// Nesting level; 0 is the outermost bar.
    pub depth: u32,
}

pub trait SequenceLayout: Send + Sync {
    /// Height every lifeline needs so that all messages fit.
    fn calculate_required_lifeline_height(&self, shapes: &[Shape], connectors: &[Connector]) -> f64;

    /// Activation bars keyed by lifeline id. Lifelines without activity map to an empty list.
    fn calculate_all_lifeline_activations(
        &self,
        shapes: &[Shape],
        connectors: &[Connector],
    ) -> HashMap<ShapeId, Vec<ActivationBox>>;
}

#[derive(Debug, Clone, Default)]
pub struct BasicSequenceLayout {
    config: SequenceConfig,
}

struct Message<'a> {
    connector: &'a Connector,
    y: f64,
}

impl BasicSequenceLayout {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    fn top(shapes: &[Shape]) -> Option<f64> {
        shapes
            .iter()
            .filter(|s| s.is_lifeline())
            .map(|s| s.y)
            .reduce(f64::min)
    }

    /// Messages between lifelines sorted top to bottom.
    fn messages<'a>(&self, shapes: &[Shape], connectors: &'a [Connector]) -> Vec<Message<'a>> {
        let Some(top) = Self::top(shapes) else {
            return Vec::new();
        };
        let is_lifeline = |id: &str| shapes.iter().any(|s| s.id == id && s.is_lifeline());

        let mut messages: Vec<Message<'a>> = connectors
            .iter()
            .filter(|c| is_lifeline(c.source_shape_id.as_str()) && is_lifeline(c.target_shape_id.as_str()))
            .enumerate()
            .map(|(i, c)| {
                let y = c.data.get("y").and_then(|v| v.as_f64()).unwrap_or(
                    top + self.config.header_height + (i as f64 + 1.0) * self.config.message_spacing,
                );
                Message { connector: c, y }
            })
            .collect();
        messages.sort_by(|a, b| a.y.total_cmp(&b.y));
        messages
    }
}

impl SequenceLayout for BasicSequenceLayout {
    fn calculate_required_lifeline_height(&self, shapes: &[Shape], connectors: &[Connector]) -> f64 {
        let Some(top) = Self::top(shapes) else {
            return self.config.min_lifeline_height;
        };
        let lowest = self
            .messages(shapes, connectors)
            .last()
            .map(|m| m.y - top + self.config.bottom_padding)
            .unwrap_or(0.0);
        lowest.max(self.config.min_lifeline_height)
    }

    fn calculate_all_lifeline_activations(
        &self,
        shapes: &[Shape],
        connectors: &[Connector],
    ) -> HashMap<ShapeId, Vec<ActivationBox>> {
        let messages = self.messages(shapes, connectors);
        let pad = self.config.activation_padding;

        shapes
            .iter()
            .filter(|s| s.is_lifeline())
            .map(|lifeline| {
                let id = lifeline.id.as_str();
                let mut boxes = Vec::new();
                let mut open: Option<ActivationBox> = None;

                for message in &messages {
                    let c = message.connector;
                    if c.source_shape_id == id && c.target_shape_id == id {
                        boxes.push(ActivationBox {
                            start_y: message.y,
                            end_y: message.y + 2.0 * pad,
                            depth: 1,
                        });
                    } else if c.target_shape_id == id {
                        if let Some(done) = open.take() {
                            boxes.push(done);
                        }
                        open = Some(ActivationBox {
                            start_y: message.y - pad,
                            end_y: message.y + pad,
                            depth: 0,
                        });
                    } else if c.source_shape_id == id {
                        if let Some(bar) = open.as_mut() {
                            bar.end_y = message.y + pad;
                        }
                    }
                }
                if let Some(done) = open {
                    boxes.push(done);
                }
                boxes.sort_by(|a, b| a.start_y.total_cmp(&b.start_y));
                (lifeline.id.clone(), boxes)
            })
            .collect()
    }
}
