use super::domain::{Annotation, DisplaySettings, SketchLayout, ValuationSketch};
use crate::identity::UserId;
use crate::store::RepositoryError;
use crate::valuations::ValuationId;

/// Storage abstraction for sketches, keyed by their valuation.
///
/// Annotations are child rows: appends and bound refreshes happen under the store's own lock
/// so concurrent writers never overwrite each other's entries.
pub trait SketchRepository: Send + Sync {
    fn sketch(&self, valuation: ValuationId) -> Result<Option<ValuationSketch>, RepositoryError>;

    /// Creates the sketch on first save and only replaces the layout afterwards.
    fn save_sketch(
        &self,
        valuation: ValuationId,
        layout: SketchLayout,
        editor: UserId,
    ) -> Result<ValuationSketch, RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when the valuation has no sketch yet.
    fn append_annotation(
        &self,
        valuation: ValuationId,
        annotation: Annotation,
        editor: UserId,
    ) -> Result<ValuationSketch, RepositoryError>;

    /// Recomputes bounds over every annotation currently stored. Leaves them unchanged when
    /// the sketch holds no annotations.
    fn refresh_sketch_bounds(&self, valuation: ValuationId)
        -> Result<ValuationSketch, RepositoryError>;

    fn update_sketch_display(
        &self,
        valuation: ValuationId,
        display: DisplaySettings,
        editor: UserId,
    ) -> Result<ValuationSketch, RepositoryError>;

    fn delete_sketch(&self, valuation: ValuationId) -> Result<(), RepositoryError>;
}
