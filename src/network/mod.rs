mod fetch;
mod response;
mod worker;

pub use fetch::FetchRequest;
pub use response::GraphResponse;
pub use worker::BackgroundFetcher;

#[cfg(test)]
pub(crate) use response::parse_graph_response;
