use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::bot::event::BotEvent;
use crate::bot::{handle_bot_event, BotState, RepositoryClient};

pub type BotEventSender = mpsc::Sender<BotEvent>;

/// Creates a future with a bot process that continuously receives events and reacts to them.
///
/// Every event is handled in its own task, because handlers spend most of their time waiting
/// for the PR state to settle. The future finishes once all senders are dropped and all
/// in-flight events have been handled.
pub fn create_bot_process<Client: RepositoryClient + 'static>(
    state: Arc<dyn BotState<Client>>,
) -> (BotEventSender, impl Future<Output = ()>) {
    let (tx, mut rx) = mpsc::channel::<BotEvent>(1024);

    let service = async move {
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    tracing::trace!("Received event: {event:#?}");
                    let state = state.clone();
                    tasks.spawn(async move {
                        if let Err(error) = handle_bot_event(event, state).await {
                            tracing::error!("Error occurred while handling event: {error:?}");
                        }
                    });
                }
                Some(result) = tasks.join_next() => {
                    if let Err(error) = result {
                        tracing::error!("Event handler task has failed: {error:?}");
                    }
                }
            }
        }

        tracing::debug!("Event channel closed, finishing {} pending event(s)", tasks.len());
        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result {
                tracing::error!("Event handler task has failed: {error:?}");
            }
        }
    };
    (tx, service)
}
