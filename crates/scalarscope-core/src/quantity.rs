//! Quantity trait and related types.
//!
//! A [`Quantity`] represents data associated with a structure. For this crate that
//! is mostly scalar data attached to one kind of mesh element, plus the UV
//! parameterizations texture-attached scalars are sampled through.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of quantity (for categorization and UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityKind {
    /// Scalar values (single float per element or texel).
    Scalar,
    /// Parameterization values (UV coordinates).
    Parameterization,
}

/// Which mesh element a scalar value is associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentKind {
    Vertex,
    Face,
    Edge,
    Halfedge,
    Corner,
    /// Texel of a 2D image sampled through a parameterization.
    Texture,
}

impl AttachmentKind {
    /// All attachment kinds, in mesh element order.
    pub const ALL: [AttachmentKind; 6] = [
        AttachmentKind::Vertex,
        AttachmentKind::Face,
        AttachmentKind::Edge,
        AttachmentKind::Halfedge,
        AttachmentKind::Corner,
        AttachmentKind::Texture,
    ];

    /// Lowercase label used in UI names and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentKind::Vertex => "vertex",
            AttachmentKind::Face => "face",
            AttachmentKind::Edge => "edge",
            AttachmentKind::Halfedge => "halfedge",
            AttachmentKind::Corner => "corner",
            AttachmentKind::Texture => "texture",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single picked mesh element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshElement {
    Vertex(usize),
    Face(usize),
    Edge(usize),
    Halfedge(usize),
    Corner(usize),
}

impl MeshElement {
    /// Returns the attachment kind of this element.
    pub fn kind(self) -> AttachmentKind {
        match self {
            MeshElement::Vertex(_) => AttachmentKind::Vertex,
            MeshElement::Face(_) => AttachmentKind::Face,
            MeshElement::Edge(_) => AttachmentKind::Edge,
            MeshElement::Halfedge(_) => AttachmentKind::Halfedge,
            MeshElement::Corner(_) => AttachmentKind::Corner,
        }
    }

    /// Returns the element index within its kind.
    pub fn index(self) -> usize {
        match self {
            MeshElement::Vertex(i)
            | MeshElement::Face(i)
            | MeshElement::Edge(i)
            | MeshElement::Halfedge(i)
            | MeshElement::Corner(i) => i,
        }
    }
}

/// Row order of image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageOrigin {
    /// Row 0 is the top of the image.
    #[default]
    UpperLeft,
    /// Row 0 is the bottom of the image.
    LowerLeft,
}

/// Lifecycle of a lazily built GPU resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuState {
    /// Never built.
    #[default]
    Absent,
    /// Built once, but stale; rebuilt on next draw.
    Invalidated,
    /// Built and current.
    Ready,
}

impl GpuState {
    /// Returns true if the resource must be (re)built before use.
    pub fn needs_build(self) -> bool {
        self != GpuState::Ready
    }

    /// Marks a resource stale. An absent resource stays absent.
    pub fn invalidate(&mut self) {
        if *self == GpuState::Ready {
            *self = GpuState::Invalidated;
        }
    }
}

/// Data associated with a structure that can be visualized.
pub trait Quantity: Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Returns the name of this quantity.
    fn name(&self) -> &str;

    /// Returns the name of the parent structure.
    fn structure_name(&self) -> &str;

    /// Returns the kind of this quantity.
    fn kind(&self) -> QuantityKind;

    /// Returns whether this quantity is currently enabled/visible.
    fn is_enabled(&self) -> bool;

    /// Sets the enabled state of this quantity.
    fn set_enabled(&mut self, enabled: bool);

    /// Drops cached GPU resources; they are rebuilt on the next draw.
    fn refresh(&mut self);

    /// Returns the number of data elements.
    fn data_size(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_state_transitions() {
        let mut state = GpuState::default();
        assert!(state.needs_build());

        // Invalidating something never built keeps it absent
        state.invalidate();
        assert_eq!(state, GpuState::Absent);

        state = GpuState::Ready;
        assert!(!state.needs_build());
        state.invalidate();
        assert_eq!(state, GpuState::Invalidated);
        assert!(state.needs_build());
    }

    #[test]
    fn test_mesh_element_kind_and_index() {
        assert_eq!(MeshElement::Halfedge(7).kind(), AttachmentKind::Halfedge);
        assert_eq!(MeshElement::Halfedge(7).index(), 7);
        assert_eq!(AttachmentKind::Corner.to_string(), "corner");
    }
}
