// TourCMS marketplace API client
// Signs requests, sends them through a pluggable transport and shapes the XML
// responses into trees with predictable list cardinality.

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod endpoint;
pub mod normalise;
pub mod request;
pub mod signature;
pub mod transport;
pub mod tree;
pub mod xml;

// Re-export key types for convenience
pub use client::{ApiResponse, ClientError, TourCmsClient};
pub use config::{ChannelSelector, ClientConfig, ConfigError, Credentials, ResultType, Route};
pub use diagnostics::{DiagnosticsSink, MemorySink, NoopSink, TracingSink};
pub use endpoint::Endpoint;
pub use normalise::{apply_defaults, normalise, normalise_all};
pub use request::{
    BodyEncoding, Clock, EncodeError, FixedClock, Params, RequestBuilder, RequestDescriptor,
    SystemClock, Verb,
};
pub use signature::{sign, SignatureInput};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
pub use tree::Node;
pub use xml::{DecodeError, QuickXmlCodec, XmlCodec};
