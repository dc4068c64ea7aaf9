pub mod backend;
pub mod handle;
pub mod http;
pub mod indices;
pub mod query;

mod error;

pub use backend::{SearchBackend, SearchHit};
pub use error::{Error, Result};
pub use handle::StoreHandle;
pub use http::HttpSearchBackend;
pub use indices::Indices;

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
