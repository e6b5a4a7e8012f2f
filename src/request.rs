// Request building
// Turns an endpoint path, a fresh parameter map and the credentials into a
// fully signed request descriptor ready for the transport.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use url::{form_urlencoded, Url};

use crate::config::{Credentials, Route};
use crate::signature::{sign, SignatureInput};
use crate::tree::Node;
use crate::xml::XmlCodec;

pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Parameter {0:?} is nested and cannot be form-encoded")]
    NestedFormValue(String),

    #[error("XML encoding is unavailable: no codec configured")]
    CodecUnavailable,

    #[error("XML encode error: {0}")]
    Xml(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// How a POST body is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Form,
    Xml { root: &'static str },
}

// Request parameters, in insertion order.
// Every call takes its own `Params` by value; nothing is shared between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, Node)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn extend(&mut self, other: Params) {
        for (key, value) in other.0 {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_node(self) -> Node {
        Node::Map(self.0)
    }

    pub fn to_form(&self) -> Result<String, EncodeError> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            match value {
                Node::Scalar(s) => serializer.append_pair(key, s),
                Node::Null => serializer.append_pair(key, ""),
                Node::List(_) | Node::Map(_) => {
                    return Err(EncodeError::NestedFormValue(key.to_string()))
                }
            };
        }
        Ok(serializer.finish())
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

// Source of "now" for signing and for the `Date` header.
pub trait Clock: Send + Sync {
    fn unix_timestamp(&self) -> i64;
    fn utc_now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.0, 0).single().unwrap_or_default()
    }
}

// A signed request, built fresh for each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub verb: Verb,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub channel: u64,
    pub path_with_query: String,
    // The canonical string that was signed. Holds no secret.
    pub signing_string: String,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct RequestBuilder<'a> {
    credentials: &'a Credentials,
    base_url: &'a Url,
    clock: &'a dyn Clock,
    codec: Option<&'a dyn XmlCodec>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(
        credentials: &'a Credentials,
        base_url: &'a Url,
        clock: &'a dyn Clock,
        codec: Option<&'a dyn XmlCodec>,
    ) -> Self {
        Self {
            credentials,
            base_url,
            clock,
            codec,
        }
    }

    pub fn build(
        &self,
        path_template: &str,
        channel: Option<u64>,
        params: Params,
        verb: Verb,
        encoding: BodyEncoding,
    ) -> Result<RequestDescriptor, EncodeError> {
        let channel = self.credentials.channel_selector().resolve(channel);
        let path = Route::for_channel(channel).expand(path_template);

        let (path_with_query, body) = match verb {
            Verb::Get => {
                let query = params.to_form()?;
                let path_with_query = if query.is_empty() {
                    path
                } else {
                    format!("{}?{}", path, query)
                };
                (path_with_query, None)
            }
            Verb::Post => (path, Some(self.encode_body(params, encoding)?)),
        };

        // Two separate readings of the clock, only the timestamp is signed
        let timestamp = self.clock.unix_timestamp();
        let date = self.clock.utc_now().format(DATE_FORMAT).to_string();

        let input = SignatureInput {
            channel,
            marketplace_id: self.credentials.marketplace_id(),
            verb,
            timestamp,
            path_with_query: &path_with_query,
        };
        let signing_string = input.canonical_string();
        let signature = sign(self.credentials.private_key(), &input);

        let headers = vec![
            ("Content-type".to_string(), "text/xml".to_string()),
            ("charset".to_string(), "utf-8".to_string()),
            ("Date".to_string(), date),
            (
                "Authorization".to_string(),
                format!(
                    "TourCMS {}:{}:{}",
                    channel,
                    self.credentials.marketplace_id(),
                    signature
                ),
            ),
        ];

        Ok(RequestDescriptor {
            url: format!(
                "{}{}",
                self.base_url.as_str().trim_end_matches('/'),
                path_with_query
            ),
            verb,
            headers,
            body,
            channel,
            path_with_query,
            signing_string,
        })
    }

    fn encode_body(&self, params: Params, encoding: BodyEncoding) -> Result<Bytes, EncodeError> {
        match encoding {
            BodyEncoding::Form => Ok(Bytes::from(params.to_form()?)),
            BodyEncoding::Xml { root } => {
                let codec = self.codec.ok_or(EncodeError::CodecUnavailable)?;
                codec.encode(root, &params.into_node())
            }
        }
    }
}
