//! Error types for the physics oracle.

use sightline_core::EntityId;
use thiserror::Error;

/// Errors that can occur while building the collision world.
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// Failed to create a collision shape.
    #[error("Failed to create collision shape for {entity}: {reason}")]
    CollisionShape {
        /// Entity the shape was meant for.
        entity: EntityId,
        /// Reason for failure.
        reason: String,
    },

    /// The entity already has a collider.
    #[error("Entity already registered: {0}")]
    DuplicateEntity(EntityId),

    /// No collider belongs to this entity.
    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    /// The input mesh is malformed.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] sightline_core::VisibilityError),
}

/// Result type for physics operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;
