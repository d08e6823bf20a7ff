/// Review records are keyed by the opaque id assigned upstream.
pub type ReviewId = String;

/// Annotations are identified client-side so they can exist before the
/// first save.
pub type AnnotationId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
