//! Workflows on top of the persistence gateway

pub mod approval;
pub mod catalog;
pub mod deletion;
pub mod images;
pub mod related;
pub mod requests;
pub mod saga;

pub use approval::{ApprovalOutcome, ApprovalWorkflow};
pub use catalog::{AnimalDraft, AnimalEdit, Catalog};
pub use deletion::{AnimalRemoval, DeletedAnimal};
pub use images::{ImageService, ImageUpload};
pub use related::{related_ids_among, RelatedAnimals};
pub use requests::{AdoptionDesk, AdoptionForm, ListingRequests};
pub use saga::{Saga, StepWarning};

/// Trimmed value, or `None` when blank
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
