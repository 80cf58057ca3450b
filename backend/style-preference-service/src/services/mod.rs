/// Business logic layer
///
/// - catalog: where quiz images come from (S3 or in-memory)
/// - profiles: persistence of finished quiz results
/// - store: live sessions keyed by preference id
/// - quiz: request-level orchestration over the three
pub mod catalog;
pub mod profiles;
pub mod quiz;
pub mod store;

pub use catalog::{InMemoryCatalog, ItemCatalog, S3Catalog};
pub use profiles::{InMemoryProfileStore, JsonFileProfileStore, PreferenceProfile, ProfileStore};
pub use quiz::QuizService;
pub use store::{PreferenceSession, SessionStore};
