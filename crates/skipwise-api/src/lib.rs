pub mod error;
pub mod http;
pub mod introhater;
pub mod introskipper;
pub mod query;
pub mod schema;
pub mod trakt;

pub use error::ApiError;
pub use introhater::IntroHaterClient;
pub use introskipper::IntroSkipperClient;
pub use query::EpisodeQuery;
pub use schema::{parse_segments, RemoteSegment};
pub use trakt::TraktClient;
