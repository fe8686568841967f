//! Query parameter extractors for lookup and list endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

/// Query parameters for the message history endpoint.
///
/// Empty values (`?before=&limit=`) count as absent.
#[derive(Debug, Deserialize, Default)]
pub struct MessageListQuery {
    /// Page size; clamped by the service, non-positive means default.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<i64>,
    /// Return only messages strictly older than this message id.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub before: Option<String>,
    /// Participant on whose behalf the history is read.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub viewer_id: Option<String>,
}

/// Query string of the `next` link on a message page.
#[derive(Debug, Serialize)]
pub struct NextPageQuery<'a> {
    pub before: String,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_id: Option<&'a str>,
}

/// Query parameters for looking up a chat by its participants.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub user_id1: String,
    pub user_id2: String,
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;

    use super::*;

    fn parse(uri: &str) -> MessageListQuery {
        let uri: Uri = uri.parse().unwrap();
        Query::<MessageListQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_empty_values_are_absent() {
        let query = parse("/messages?before=&limit=&viewer_id=");
        assert!(query.before.is_none());
        assert!(query.limit.is_none());
        assert!(query.viewer_id.is_none());

        let query = parse("/messages");
        assert!(query.before.is_none());
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let query = parse("/messages?limit=-3&before=abc&viewer_id=u1");
        assert_eq!(query.limit, Some(-3));
        assert_eq!(query.before.as_deref(), Some("abc"));
        assert_eq!(query.viewer_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_non_numeric_limit_is_rejected() {
        let uri: Uri = "/messages?limit=abc".parse().unwrap();
        assert!(Query::<MessageListQuery>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn test_next_page_query_escapes_values() {
        let encoded = serde_urlencoded::to_string(NextPageQuery {
            before: "m1".to_string(),
            limit: 2,
            viewer_id: Some("a&limit=1"),
        })
        .unwrap();
        assert_eq!(encoded, "before=m1&limit=2&viewer_id=a%26limit%3D1");

        let uri: Uri = format!("/messages?{encoded}").parse().unwrap();
        let back = Query::<MessageListQuery>::try_from_uri(&uri).unwrap().0;
        assert_eq!(back.viewer_id.as_deref(), Some("a&limit=1"));
        assert_eq!(back.limit, Some(2));
    }
}
