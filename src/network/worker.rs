use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use reqwest::blocking::Client;
use tracing::debug;

use crate::navigation::Transport;

use super::fetch::{FetchRequest, fetch_graph};
use super::response::GraphResponse;

/// Runs each neighbor-graph request on its own worker thread and hands the
/// result back to the render loop through a channel.
pub struct BackgroundFetcher {
    endpoint: String,
    client: Client,
    rx: Option<Receiver<Result<GraphResponse, String>>>,
}

impl BackgroundFetcher {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
            rx: None,
        }
    }

    pub fn poll(&mut self) -> Option<Result<GraphResponse, String>> {
        let rx = self.rx.take()?;
        match rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => {
                self.rx = Some(rx);
                None
            }
            Err(TryRecvError::Disconnected) => {
                Some(Err("background fetch worker disconnected".to_owned()))
            }
        }
    }
}

impl Transport for BackgroundFetcher {
    fn request(&mut self, request: FetchRequest) {
        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        debug!(focus = %request.focus_node, "spawning neighbor graph fetch");
        thread::spawn(move || {
            let result =
                fetch_graph(&client, &endpoint, &request).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        self.rx = Some(rx);
    }
}
