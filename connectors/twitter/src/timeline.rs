//! Defensive traversal of paginated timeline responses.
//!
//! Every GraphQL listing (tweet detail, replies, search, home timelines, user
//! tweets) and the trends guide returns a list of *instructions*, each holding
//! *entries*. Content entries carry an `itemContent` object, either directly
//! under `content` or per item inside a module (`content.items[].item`).
//! Cursor and boundary entries routinely lack it. The functions here yield
//! only the entries that have it, in their original order, and never fail on
//! entries that do not.

use serde_json::Value;

/// An entry (or module item) carrying an `itemContent` object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentItem<'a> {
    /// `entryId` of the entry, or of the module item.
    pub entry_id: &'a str,

    /// The `itemContent` object.
    pub item_content: &'a Value,
}

impl<'a> ContentItem<'a> {
    /// `itemContent.itemType`, e.g. `TimelineTweet` or `TimelineTimelineCursor`.
    #[must_use]
    pub fn item_type(&self) -> Option<&'a str> {
        self.item_content
            .get("itemType")
            .or_else(|| self.item_content.get("__typename"))
            .and_then(Value::as_str)
    }

    /// `itemContent.tweet_results.result`, if this item is a tweet.
    #[must_use]
    pub fn tweet_result(&self) -> Option<&'a Value> {
        self.item_content.get("tweet_results")?.get("result")
    }

    /// `itemContent.user_results.result`, if this item is a user.
    #[must_use]
    pub fn user_result(&self) -> Option<&'a Value> {
        self.item_content.get("user_results")?.get("result")
    }
}

/// Kind of pagination cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// Older results.
    Bottom,
    /// Newer results.
    Top,
    /// Further replies inside a conversation thread.
    ShowMore,
}

impl CursorKind {
    fn matches(self, cursor_type: &str) -> bool {
        match self {
            Self::Bottom => cursor_type == "Bottom",
            Self::Top => cursor_type == "Top",
            Self::ShowMore => cursor_type.starts_with("ShowMore"),
        }
    }
}

/// Collect the entries of every recognised instruction in `instructions`.
///
/// Accepts the GraphQL shape (`[{"type": "TimelineAddEntries", "entries": [...]}]`)
/// and the legacy guide shape (`[{"addEntries": {"entries": [...]}}]`).
/// Anything else is ignored.
#[must_use]
pub fn instruction_entries(instructions: &Value) -> Vec<&Value> {
    let Some(instructions) = instructions.as_array() else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for instruction in instructions {
        match instruction.get("type").and_then(Value::as_str) {
            Some("TimelineAddEntries") => {
                push_all(&mut entries, instruction.get("entries"));
            }
            Some("TimelineReplaceEntry" | "TimelinePinEntry") => {
                entries.extend(instruction.get("entry"));
            }
            Some("TimelineAddToModule") => {
                push_all(&mut entries, instruction.get("moduleItems"));
            }
            Some(_) => {}
            None => {
                if let Some(add) = instruction.get("addEntries") {
                    push_all(&mut entries, add.get("entries"));
                }
                if let Some(replace) = instruction.get("replaceEntry") {
                    entries.extend(replace.get("entry"));
                }
            }
        }
    }
    entries
}

fn push_all<'a>(out: &mut Vec<&'a Value>, list: Option<&'a Value>) {
    if let Some(list) = list.and_then(Value::as_array) {
        out.extend(list.iter());
    }
}

/// Yield the `itemContent` of every entry that has one, skipping the rest.
///
/// Module entries contribute each of their items that has an `itemContent`.
/// Module items added by `TimelineAddToModule` (`{"entryId", "item"}`) are
/// handled the same way.
#[must_use]
pub fn content_items<'a>(entries: &[&'a Value]) -> Vec<ContentItem<'a>> {
    let mut items = Vec::new();
    for entry in entries {
        let entry_id = entry_id(entry);

        if let Some(content) = entry.get("content") {
            if let Some(item_content) = content.get("itemContent") {
                items.push(ContentItem {
                    entry_id,
                    item_content,
                });
            } else if let Some(module_items) = content.get("items").and_then(Value::as_array) {
                items.extend(module_items.iter().filter_map(module_item));
            }
        } else if let Some(item) = module_item(entry) {
            items.push(item);
        }
    }
    items
}

/// `entryId` prefix of the reply thread modules in a conversation response.
pub const CONVERSATION_THREAD_PREFIX: &str = "conversationthread-";

/// Whether `entry` is a reply thread module.
///
/// Conversation responses also carry `promoted-tweet-*` items and
/// `tweetdetailrelatedtweets-*` modules; those hold tweets that are not replies.
#[must_use]
pub fn is_conversation_thread(entry: &Value) -> bool {
    entry_id(entry).starts_with(CONVERSATION_THREAD_PREFIX)
}

/// Group the content items of each reply thread entry, one group per entry.
///
/// Conversation responses wrap every reply thread in its own module; the first
/// item is the reply and the rest continue the thread. Entries that are not
/// reply threads, or carry no content items, produce no group.
#[must_use]
pub fn conversation_threads<'a>(entries: &[&'a Value]) -> Vec<Vec<ContentItem<'a>>> {
    entries
        .iter()
        .filter(|entry| is_conversation_thread(entry))
        .map(|entry| content_items(std::slice::from_ref(entry)))
        .filter(|group| !group.is_empty())
        .collect()
}

/// Find the first cursor of `kind` among `entries`, including module items.
#[must_use]
pub fn find_cursor(entries: &[&Value], kind: CursorKind) -> Option<String> {
    entries.iter().find_map(|entry| {
        let content = entry.get("content")?;
        cursor_value(content, kind)
            .or_else(|| cursor_value(content.get("itemContent")?, kind))
            .or_else(|| {
                content
                    .get("items")?
                    .as_array()?
                    .iter()
                    .find_map(|item| cursor_value(item.get("item")?.get("itemContent")?, kind))
            })
    })
}

/// Cursor for the next (older) page.
#[must_use]
pub fn bottom_cursor(entries: &[&Value]) -> Option<String> {
    find_cursor(entries, CursorKind::Bottom)
}

/// Cursor for newer results.
#[must_use]
pub fn top_cursor(entries: &[&Value]) -> Option<String> {
    find_cursor(entries, CursorKind::Top)
}

fn cursor_value(node: &Value, kind: CursorKind) -> Option<String> {
    let cursor_type = node.get("cursorType")?.as_str()?;
    if !kind.matches(cursor_type) {
        return None;
    }
    node.get("value")?.as_str().map(String::from)
}

fn module_item(item: &Value) -> Option<ContentItem<'_>> {
    let item_content = item.get("item")?.get("itemContent")?;
    Some(ContentItem {
        entry_id: entry_id(item),
        item_content,
    })
}

fn entry_id(entry: &Value) -> &str {
    entry.get("entryId").and_then(Value::as_str).unwrap_or("")
}
