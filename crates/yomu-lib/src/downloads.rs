use async_trait::async_trait;

use crate::models::{DownloadQueueItem, DownloadState, DownloaderState};

pub const NO_DOWNLOADS_MESSAGE: &str = "No downloads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloaderAction {
    Start,
    Stop,
}

impl DownloaderAction {
    pub fn label(&self) -> &'static str {
        match self {
            DownloaderAction::Start => "Start",
            DownloaderAction::Stop => "Stop",
        }
    }
}

/// Start a stopped downloader, stop it otherwise
pub fn toggle_action(state: DownloaderState) -> DownloaderAction {
    match state {
        DownloaderState::Stopped => DownloaderAction::Start,
        DownloaderState::Started => DownloaderAction::Stop,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderRequest {
    pub chapter_id: i64,
    pub to: usize,
}

/// Removing a chapter from the queue.
///
/// A running downloader keeps downloading the chapter unless stopped first,
/// so it's stopped, the chapter removed and its partial download deleted,
/// then the downloader is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePlan {
    pub chapter_id: i64,
    pub stop_first: bool,
    pub restart_after: bool,
}

impl DeletePlan {
    pub fn new(chapter_id: i64, state: DownloaderState) -> Self {
        let is_running = state == DownloaderState::Started;
        Self {
            chapter_id,
            stop_first: is_running,
            restart_after: is_running,
        }
    }
}

/// Downloader mutations a [`DeletePlan`] is carried out with
#[async_trait(?Send)]
pub trait DownloaderActions {
    type Error;

    async fn stop(&self) -> Result<(), Self::Error>;
    async fn start(&self) -> Result<(), Self::Error>;
    async fn dequeue(&self, chapter_id: i64) -> Result<(), Self::Error>;
    async fn delete_downloaded(&self, chapter_id: i64) -> Result<(), Self::Error>;
}

impl DeletePlan {
    /// Both removal steps are attempted and a downloader stopped for the
    /// delete is started again, whatever the removal returned. The first
    /// removal error wins over a restart error.
    pub async fn run<A>(&self, actions: &A) -> Result<(), A::Error>
    where
        A: DownloaderActions + ?Sized,
    {
        if self.stop_first {
            actions.stop().await?;
        }

        let dequeued = actions.dequeue(self.chapter_id).await;
        let deleted = actions.delete_downloaded(self.chapter_id).await;
        if dequeued.is_err() || deleted.is_err() {
            warn!("removing chapter {} from the queue failed", self.chapter_id);
        }

        let restarted = if self.stop_first || self.restart_after {
            actions.start().await
        } else {
            Ok(())
        };

        dequeued.and(deleted).and(restarted)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadQueue {
    pub state: DownloaderState,
    pub items: Vec<DownloadQueueItem>,
}

impl DownloadQueue {
    pub fn new(state: DownloaderState, items: Vec<DownloadQueueItem>) -> Self {
        Self { state, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn toggle_action(&self) -> DownloaderAction {
        toggle_action(self.state)
    }

    /// The start/stop button is useless without anything queued
    pub fn can_toggle(&self) -> bool {
        !self.is_empty()
    }

    /// Request for moving the item at `from` to `to`, `None` when nothing moves
    pub fn reorder(&self, from: usize, to: usize) -> Option<ReorderRequest> {
        if from == to || to >= self.items.len() {
            return None;
        }

        self.items.get(from).map(|item| ReorderRequest {
            chapter_id: item.chapter_id,
            to,
        })
    }

    /// Moves the item locally until the server confirms
    pub fn apply_reorder(&mut self, request: &ReorderRequest) -> bool {
        let Some(from) = self.position(request.chapter_id) else {
            return false;
        };
        if request.to >= self.items.len() {
            return false;
        }

        let item = self.items.remove(from);
        self.items.insert(request.to, item);
        true
    }

    pub fn position(&self, chapter_id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.chapter_id == chapter_id)
    }

    pub fn delete_plan(&self, chapter_id: i64) -> DeletePlan {
        DeletePlan::new(chapter_id, self.state)
    }
}

/// Only failed downloads get a retry button
pub fn retry_allowed(item: &DownloadQueueItem) -> bool {
    item.state == DownloadState::Error
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use futures::executor::block_on;

    use super::*;

    /// Records every call, failing the ones listed in `failing`
    #[derive(Default)]
    struct RecordingActions {
        calls: RefCell<Vec<&'static str>>,
        failing: Vec<&'static str>,
    }

    impl RecordingActions {
        fn failing(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                ..Default::default()
            }
        }

        fn call(&self, name: &'static str) -> Result<(), String> {
            self.calls.borrow_mut().push(name);
            if self.failing.contains(&name) {
                Err(format!("{} failed", name))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait(?Send)]
    impl DownloaderActions for RecordingActions {
        type Error = String;

        async fn stop(&self) -> Result<(), String> {
            self.call("stop")
        }

        async fn start(&self) -> Result<(), String> {
            self.call("start")
        }

        async fn dequeue(&self, _chapter_id: i64) -> Result<(), String> {
            self.call("dequeue")
        }

        async fn delete_downloaded(&self, _chapter_id: i64) -> Result<(), String> {
            self.call("delete")
        }
    }

    fn item(chapter_id: i64, state: DownloadState) -> DownloadQueueItem {
        DownloadQueueItem {
            chapter_id,
            chapter_name: format!("Chapter {}", chapter_id),
            manga_id: 1,
            manga_title: "Manga".to_string(),
            progress: 0.0,
            state,
            tries: 0,
        }
    }

    fn queue(state: DownloaderState) -> DownloadQueue {
        DownloadQueue::new(
            state,
            vec![
                item(1, DownloadState::Downloading),
                item(2, DownloadState::Queued),
                item(3, DownloadState::Error),
            ],
        )
    }

    #[test]
    fn test_reorder() {
        let mut queue = queue(DownloaderState::Started);
        assert_eq!(queue.reorder(1, 1), None);
        assert_eq!(queue.reorder(1, 5), None);

        let request = queue.reorder(2, 0).unwrap();
        assert_eq!(request, ReorderRequest { chapter_id: 3, to: 0 });
        assert!(queue.apply_reorder(&request));

        let ids: Vec<i64> = queue.items.iter().map(|i| i.chapter_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(queue(DownloaderState::Stopped).toggle_action(), DownloaderAction::Start);
        assert_eq!(queue(DownloaderState::Started).toggle_action(), DownloaderAction::Stop);
        assert!(!DownloadQueue::default().can_toggle());
    }

    #[test]
    fn test_delete_plan() {
        let running = queue(DownloaderState::Started).delete_plan(2);
        assert!(running.stop_first && running.restart_after);

        let stopped = queue(DownloaderState::Stopped).delete_plan(2);
        assert!(!stopped.stop_first && !stopped.restart_after);
    }

    #[test]
    fn test_delete_restarts_running_downloader() {
        let actions = RecordingActions::default();
        let plan = queue(DownloaderState::Started).delete_plan(2);
        assert_eq!(block_on(plan.run(&actions)), Ok(()));
        assert_eq!(*actions.calls.borrow(), vec!["stop", "dequeue", "delete", "start"]);

        let actions = RecordingActions::default();
        let plan = queue(DownloaderState::Stopped).delete_plan(2);
        assert_eq!(block_on(plan.run(&actions)), Ok(()));
        assert_eq!(*actions.calls.borrow(), vec!["dequeue", "delete"]);
    }

    #[test]
    fn test_failed_delete_still_restarts() {
        let actions = RecordingActions::failing(vec!["dequeue"]);
        let plan = queue(DownloaderState::Started).delete_plan(2);
        assert_eq!(block_on(plan.run(&actions)), Err("dequeue failed".to_string()));
        assert_eq!(*actions.calls.borrow(), vec!["stop", "dequeue", "delete", "start"]);

        let actions = RecordingActions::failing(vec!["delete", "start"]);
        assert_eq!(block_on(plan.run(&actions)), Err("delete failed".to_string()));
        assert_eq!(actions.calls.borrow().last(), Some(&"start"));
    }

    #[test]
    fn test_failed_stop_leaves_queue_alone() {
        let actions = RecordingActions::failing(vec!["stop"]);
        let plan = queue(DownloaderState::Started).delete_plan(2);
        assert_eq!(block_on(plan.run(&actions)), Err("stop failed".to_string()));
        assert_eq!(*actions.calls.borrow(), vec!["stop"]);
    }

    #[test]
    fn test_retry_only_on_error() {
        let queue = queue(DownloaderState::Started);
        let retryable: Vec<i64> = queue
            .items
            .iter()
            .filter(|item| retry_allowed(item))
            .map(|item| item.chapter_id)
            .collect();
        assert_eq!(retryable, vec![3]);
    }
}
