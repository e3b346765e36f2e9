//! Thread fetcher
//!
//! Follows `conversations.replies` cursors until the thread is exhausted.
//! Remote failures are logged and whatever was collected so far is returned.

use thread2task_slack::{SlackMessage, SlackService};

use crate::domain::entities::ThreadReference;

/// Upper bound on pages followed for a single thread
pub const MAX_PAGES: usize = 50;

/// Fetch every message of a thread, root first
pub async fn fetch_thread(slack: &dyn SlackService, thread: &ThreadReference) -> Vec<SlackMessage> {
    let mut messages = Vec::new();
    let mut cursor: Option<String> = None;

    for page_number in 0..MAX_PAGES {
        let page = match slack
            .conversation_replies(&thread.channel_id, &thread.thread_ts, cursor.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(
                    channel_id = %thread.channel_id,
                    thread_ts = %thread.thread_ts,
                    page = page_number,
                    collected = messages.len(),
                    error = %e,
                    "Failed to fetch thread replies"
                );
                return messages;
            }
        };

        messages.extend(page.messages);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                tracing::debug!(
                    channel_id = %thread.channel_id,
                    thread_ts = %thread.thread_ts,
                    count = messages.len(),
                    "Fetched thread"
                );
                return messages;
            }
        }
    }

    tracing::warn!(
        channel_id = %thread.channel_id,
        thread_ts = %thread.thread_ts,
        max_pages = MAX_PAGES,
        "Thread exceeded page limit, returning partial result"
    );
    messages
}
