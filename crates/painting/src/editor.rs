//! Editing model for a brush's channel matrix.
//!
//! Holds the matrix a settings panel edits and tells registered listeners
//! whenever a user edit changes it. Loading a matrix with
//! [`ChannelMatrixEditor::set_matrix`] is silent so a panel can refresh
//! itself without echoing the change back.

use std::fmt;

use tracing::trace;

use crate::channel_matrix::ChannelMatrix;
use crate::types::ChannelIndex;

/// Events emitted by [`ChannelMatrixEditor`]
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixEditorEvent {
    /// The matrix changed through an edit; carries the new value
    MatrixChanged(ChannelMatrix),
}

type Listener = Box<dyn Fn(&MatrixEditorEvent)>;

#[derive(Default)]
pub struct ChannelMatrixEditor {
    matrix: ChannelMatrix,
    listeners: Vec<Listener>,
}

impl fmt::Debug for ChannelMatrixEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelMatrixEditor")
            .field("matrix", &self.matrix)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl ChannelMatrixEditor {
    pub fn new(matrix: ChannelMatrix) -> Self {
        Self {
            matrix,
            listeners: Vec::new(),
        }
    }

    /// Register a callback invoked after every edit
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&MatrixEditorEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn matrix(&self) -> ChannelMatrix {
        self.matrix
    }

    /// Replace the edited matrix without notifying listeners
    pub fn set_matrix(&mut self, matrix: ChannelMatrix) {
        self.matrix = matrix;
    }

    /// Whether the strength control for `channel` accepts input; it follows
    /// the channel's enable flag
    pub fn is_strength_editable(&self, channel: ChannelIndex) -> bool {
        self.matrix.affects(channel)
    }

    fn edit(&mut self, apply: impl FnOnce(&mut ChannelMatrix)) {
        apply(&mut self.matrix);
        trace!("Channel matrix edited: {:?}", self.matrix);
        let event = MatrixEditorEvent::MatrixChanged(self.matrix);
        for listener in &self.listeners {
            listener(&event);
        }
    }

    pub fn set_affects(&mut self, channel: ChannelIndex, value: bool) {
        self.edit(|matrix| matrix.set_affects(channel, value));
    }

    pub fn set_strength(&mut self, channel: ChannelIndex, value: f32) {
        self.edit(|matrix| matrix.set_strength(channel, value));
    }

    pub fn set_height_scale_mm(&mut self, value: f32) {
        self.edit(|matrix| matrix.set_height_scale_mm(value));
    }

    pub fn set_height_creaminess(&mut self, value: f32) {
        self.edit(|matrix| matrix.set_height_creaminess(value));
    }

    pub fn apply_color_only_preset(&mut self) {
        self.edit(ChannelMatrix::apply_color_only_preset);
    }

    pub fn apply_texture_only_preset(&mut self) {
        self.edit(ChannelMatrix::apply_texture_only_preset);
    }
}
