pub mod database;
pub mod events;
pub mod metrics;

pub use database::MongoDb;
pub use events::{channel, EventPublisher, NullEventPublisher, RedisEventPublisher};
pub use metrics::{get_metrics, init_metrics};
