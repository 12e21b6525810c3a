/// Integer primary keys (users, categories, images) are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Product primary keys are random UUIDs rather than sequential integers.
pub type ProductId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
