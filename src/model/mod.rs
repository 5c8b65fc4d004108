//! Domain types shared across the aggregation pipeline.
//!
//! * [`vocab`]: controlled vocabularies (subjects, media types, ...).
//! * [`request`]: the structured [`SearchRequest`] and the [`PageSpec`].
//! * [`resource`]: resource records as sources deliver them.

mod request;
mod resource;
mod vocab;

pub use request::{LearningObjectiveFilter, PageSpec, SearchRequest, SortKey, DEFAULT_PAGE_SIZE};
pub use resource::{ItemKey, ResourceDetails, ResourceSet, ResourceSummary};
pub use vocab::{
    FederalState, Grade, LearningResourceType, MediaType, ProviderType, Rating, SchoolBook,
    SchoolType, StudyYear, Subject, Vocabulary,
};
