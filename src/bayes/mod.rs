mod blocking;
mod client;
mod error;
pub mod http;
mod retry;
mod types;

pub use blocking::BlockingBayesClient;
pub use client::BayesClient;
pub use error::BayesError;
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use retry::RetryPolicy;
pub use types::{
    AssetKind, Game, GamesFilter, GamesPage, GamesQuery, Tag, TagFilter, PAGE_SIZE_SENTINEL,
};
