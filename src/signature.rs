// Request signing
// TourCMS authenticates every call with an HMAC-SHA256 over a canonical string:
//   {channel}/{marketplace_id}/{verb}/{unix_timestamp}{path_with_query}
// The digest is Base64 encoded and then form-encoded for the Authorization header.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::form_urlencoded;

use crate::request::Verb;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInput<'a> {
    pub channel: u64,
    pub marketplace_id: u64,
    pub verb: Verb,
    pub timestamp: i64,
    // Path and query exactly as sent, starting with `/`, without the host.
    pub path_with_query: &'a str,
}

impl SignatureInput<'_> {
    pub fn canonical_string(&self) -> String {
        // No separator between the timestamp and the path
        format!(
            "{}/{}/{}/{}{}",
            self.channel,
            self.marketplace_id,
            self.verb.as_str(),
            self.timestamp,
            self.path_with_query
        )
    }
}

pub fn sign(secret: &str, input: &SignatureInput<'_>) -> String {
    sign_canonical(secret, &input.canonical_string())
}

pub(crate) fn sign_canonical(secret: &str, canonical: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    let digest = BASE64.encode(mac.finalize().into_bytes());

    // '+', '/' and '=' must be escaped, space would become '+'
    form_urlencoded::byte_serialize(digest.as_bytes()).collect()
}
