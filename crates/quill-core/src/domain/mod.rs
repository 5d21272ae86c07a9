//! Domain entities - the core business objects.

mod post;

mod subscriber;

pub use post::{Post, slugify};
pub use subscriber::Subscriber;
