//! Bidirectional address translation over the resolved slide table

use super::ReconcileSession;
use crate::domain::ReconcileError;
use crate::image::ImageId;

impl ReconcileSession<'_> {
    /// Translate a trace-space address into the model's address space.
    ///
    /// When `image` is omitted the owner is inferred by sliding the address
    /// back through each table entry and asking that image whether the
    /// result lands inside it.
    ///
    /// # Errors
    /// `NoOwningModule` when inference finds no owner, `UnresolvedModule`
    /// when the owner has no established slide.
    pub fn to_model_address(
        &self,
        trace_addr: u64,
        image: Option<ImageId>,
    ) -> Result<u64, ReconcileError> {
        let id = match image {
            Some(id) => id,
            None => self.infer_trace_owner(trace_addr)?,
        };
        let slide = self
            .slides()
            .get(id)
            .ok_or_else(|| ReconcileError::UnresolvedModule { image: self.image_name(id) })?;
        Ok(slide.to_model(trace_addr))
    }

    /// Translate a model-space address into trace space.
    ///
    /// When `image` is omitted the owner is the image containing the
    /// address in model space.
    ///
    /// # Errors
    /// `NoOwningModule` when no image contains the address,
    /// `UnresolvedModule` when the owner has no established slide.
    pub fn to_trace_address(
        &self,
        model_addr: u64,
        image: Option<ImageId>,
    ) -> Result<u64, ReconcileError> {
        let id = match image {
            Some(id) => id,
            None => self
                .images()
                .find_containing(model_addr)
                .ok_or(ReconcileError::NoOwningModule { addr: model_addr })?,
        };
        let slide = self
            .slides()
            .get(id)
            .ok_or_else(|| ReconcileError::UnresolvedModule { image: self.image_name(id) })?;
        Ok(slide.to_trace(model_addr))
    }

    /// Find the resolved image whose model-space footprint covers the slid
    /// address. Only images already in the table can match; an address in
    /// an unresolved image is indistinguishable from a foreign one here.
    fn infer_trace_owner(&self, trace_addr: u64) -> Result<ImageId, ReconcileError> {
        self.slides()
            .iter()
            .find(|&(id, slide)| self.images().get(id).contains(slide.to_model(trace_addr)))
            .map(|(id, _)| id)
            .ok_or(ReconcileError::NoOwningModule { addr: trace_addr })
    }
}
