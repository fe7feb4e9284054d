use reqwest::Method;

use crate::mailbox::View;

use super::models::{Mutation, PageRequest};

pub fn view_endpoint(view: &View) -> &'static str {
    match view {
        View::Inbox => "/api/emails/inbox",
        View::Sent => "/api/emails/sent",
        View::Drafts => "/api/emails/drafts",
        View::Trash => "/api/emails/trash",
        View::Starred => "/api/emails/starred",
        View::Search(_) => "/api/emails/search",
    }
}

pub fn view_query(view: &View, page: &PageRequest) -> Vec<(String, String)> {
    let mut params = match view {
        View::Drafts => return Vec::new(),
        View::Search(query) => vec![("q".to_string(), query.clone())],
        _ => Vec::new(),
    };
    params.push(("maxResults".to_string(), page.max_results.to_string()));
    if let Some(token) = &page.page_token {
        params.push(("pageToken".to_string(), token.clone()));
    }
    params
}

pub fn message_endpoint(id: &str) -> String {
    format!("/api/emails/{id}")
}

pub fn mutation_endpoint(id: &str, mutation: Mutation) -> (Method, String) {
    match mutation {
        Mutation::Star => (Method::PATCH, format!("/api/emails/{id}/star")),
        Mutation::Unstar => (Method::PATCH, format!("/api/emails/{id}/unstar")),
        Mutation::MarkRead => (Method::PATCH, format!("/api/emails/{id}/read")),
        Mutation::MarkUnread => (Method::PATCH, format!("/api/emails/{id}/unread")),
        Mutation::Trash => (Method::DELETE, format!("/api/emails/{id}")),
        Mutation::Restore => (Method::POST, format!("/api/emails/{id}/untrash")),
        Mutation::PermanentDelete => (Method::DELETE, format!("/api/emails/{id}/permanent")),
    }
}

pub fn send_endpoint() -> &'static str {
    "/api/emails/send"
}

pub fn draft_endpoint() -> &'static str {
    "/api/emails/draft"
}

pub fn upload_endpoint() -> &'static str {
    "/api/emails/upload"
}

pub fn reply_endpoint(id: &str) -> String {
    format!("/api/emails/{id}/reply")
}

pub fn forward_endpoint(id: &str) -> String {
    format!("/api/emails/{id}/forward")
}

pub fn summarize_endpoint(id: &str) -> String {
    format!("/api/emails/{id}/summarize")
}

pub fn attachment_endpoint(message_id: &str, attachment_id: &str) -> String {
    format!("/api/emails/{message_id}/attachments/{attachment_id}")
}

pub fn generate_endpoint() -> &'static str {
    "/api/ai/generate"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_take_no_paging_params() {
        assert!(view_query(&View::Drafts, &PageRequest::first(50)).is_empty());
    }

    #[test]
    fn paged_views_forward_page_token() {
        let page = PageRequest {
            max_results: 25,
            page_token: Some("next".to_string()),
        };
        let query = view_query(&View::Inbox, &page);
        assert_eq!(
            query,
            vec![
                ("maxResults".to_string(), "25".to_string()),
                ("pageToken".to_string(), "next".to_string()),
            ]
        );
    }

    #[test]
    fn search_forwards_page_token_after_query() {
        let page = PageRequest {
            max_results: 10,
            page_token: Some("p2".to_string()),
        };
        let query = view_query(&View::Search("from:alice".to_string()), &page);
        assert_eq!(
            query,
            vec![
                ("q".to_string(), "from:alice".to_string()),
                ("maxResults".to_string(), "10".to_string()),
                ("pageToken".to_string(), "p2".to_string()),
            ]
        );
    }

    #[test]
    fn trash_uses_delete_method() {
        let (method, path) = mutation_endpoint("abc", Mutation::Trash);
        assert_eq!(method, Method::DELETE);
        assert_eq!(path, "/api/emails/abc");
    }
}
