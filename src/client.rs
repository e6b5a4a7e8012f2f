// TourCMS endpoint client
// Every operation is a lookup in the endpoint table plus a fresh parameter map.
// The client owns its collaborators and keeps no per-call state, so a single
// instance can serve concurrent calls.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::Level;

use crate::config::{ClientConfig, ConfigError, ResultType};
use crate::diagnostics::{DiagnosticsSink, NoopSink};
use crate::endpoint::{self, Endpoint};
use crate::normalise::{apply_defaults, normalise_all};
use crate::request::{Clock, EncodeError, Params, RequestBuilder, RequestDescriptor, SystemClock};
use crate::transport::{ReqwestTransport, Transport, TransportError};
use crate::tree::Node;
use crate::xml::{DecodeError, QuickXmlCodec, XmlCodec};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
}

// Outcome of a call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    // Body bytes as received.
    Raw(Bytes),
    // Decoded document, already unwrapped from `<response>`.
    Document(Node),
    // Non-2xx status. The body is not kept.
    HttpError { status: u16 },
}

impl ApiResponse {
    pub fn document(&self) -> Option<&Node> {
        match self {
            ApiResponse::Document(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Node> {
        match self {
            ApiResponse::Document(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn raw(&self) -> Option<&Bytes> {
        match self {
            ApiResponse::Raw(body) => Some(body),
            _ => None,
        }
    }

    // The server's `<error>` text, `OK` on success. `None` for HTTP errors,
    // which carry their code in `status()` instead.
    pub fn error(&self) -> Option<&str> {
        self.document()?.get("error")?.as_str()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiResponse::HttpError { status } => Some(*status),
            _ => None,
        }
    }

    // True for raw bodies and for documents whose error is `OK`.
    pub fn is_ok(&self) -> bool {
        match self {
            ApiResponse::Raw(_) => true,
            ApiResponse::Document(_) => self.error() == Some("OK"),
            ApiResponse::HttpError { .. } => false,
        }
    }
}

pub struct TourCmsClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    codec: Option<Arc<dyn XmlCodec>>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TourCmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourCmsClient")
            .field("config", &self.config)
            .field("codec", &self.codec.is_some())
            .finish_non_exhaustive()
    }
}

impl TourCmsClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
            codec: Some(Arc::new(QuickXmlCodec)),
            diagnostics: Arc::new(NoopSink),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn XmlCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    // Native results fall back to raw bytes and XML bodies cannot be sent.
    pub fn without_codec(mut self) -> Self {
        self.codec = None;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn call(
        &self,
        endpoint: &Endpoint,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let request = RequestBuilder::new(
            &self.config.credentials,
            &self.config.base_url,
            &*self.clock,
            self.codec.as_deref(),
        )
        .build(endpoint.path, channel, params, endpoint.verb, endpoint.body)?;
        self.log_request(&request);

        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            self.diagnostics.log(
                Level::ERROR,
                &format!("HTTP error {} from {}", response.status, endpoint.name),
            );
            return Ok(ApiResponse::HttpError {
                status: response.status,
            });
        }

        match self.config.result_type {
            ResultType::Raw => Ok(ApiResponse::Raw(response.body)),
            ResultType::Native => self.to_native(endpoint, response.body),
        }
    }

    fn log_request(&self, request: &RequestDescriptor) {
        self.diagnostics
            .log(Level::DEBUG, &format!("url is: {}", request.url));
        let headers = request
            .headers
            .iter()
            .map(|(k, v)| format!("{} => {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        self.diagnostics
            .log(Level::DEBUG, &format!("Headers are: {}", headers));
        self.diagnostics.log(
            Level::DEBUG,
            &format!("Signing string is: {}", request.signing_string),
        );
    }

    fn to_native(&self, endpoint: &Endpoint, body: Bytes) -> Result<ApiResponse, ClientError> {
        let Some(codec) = &self.codec else {
            self.diagnostics.log(
                Level::ERROR,
                "no XML codec configured, returning raw response",
            );
            return Ok(ApiResponse::Raw(body));
        };

        let mut tree = unwrap_response(codec.decode(&body)?);
        shape(endpoint, &mut tree);
        Ok(ApiResponse::Document(tree))
    }

    // Operations, in the order of the endpoint table

    pub async fn api_rate_limit_status(
        &self,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::API_RATE_LIMIT_STATUS, Params::new(), channel)
            .await
    }

    // The channel list lives on the marketplace-only `/p/` route, so the
    // configured default channel is ignored and channel 0 is signed.
    pub async fn list_channels(&self) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::LIST_CHANNELS, Params::new(), Some(0))
            .await
    }

    pub async fn show_channel(&self, channel: Option<u64>) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::SHOW_CHANNEL, Params::new(), channel)
            .await
    }

    pub async fn search_tours(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::SEARCH_TOURS, params, channel).await
    }

    pub async fn search_hotels_specific(
        &self,
        tour_id: &str,
        mut params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        params.insert("single_tour_id", tour_id);
        self.call(&endpoint::SEARCH_HOTELS_SPECIFIC, params, channel)
            .await
    }

    pub async fn list_tours(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::LIST_TOURS, params, channel).await
    }

    pub async fn list_tour_images(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::LIST_TOUR_IMAGES, params, channel)
            .await
    }

    pub async fn show_tour(
        &self,
        tour_id: &str,
        mut params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        params.insert("id", tour_id);
        self.call(&endpoint::SHOW_TOUR, params, channel).await
    }

    pub async fn show_tour_departures(
        &self,
        tour_id: &str,
        mut params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        params.insert("id", tour_id);
        self.call(&endpoint::SHOW_TOUR_DEPARTURES, params, channel)
            .await
    }

    pub async fn show_supplier(
        &self,
        supplier_id: &str,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new().with("supplier_id", supplier_id);
        self.call(&endpoint::SHOW_SUPPLIER, params, channel).await
    }

    pub async fn get_booking_redirect_url(
        &self,
        response_url: &str,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new().with("response_url", response_url);
        self.call(&endpoint::GET_BOOKING_REDIRECT_URL, params, channel)
            .await
    }

    pub async fn list_tour_locations(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::LIST_TOUR_LOCATIONS, params, channel)
            .await
    }

    pub async fn list_product_filters(
        &self,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::LIST_PRODUCT_FILTERS, Params::new(), channel)
            .await
    }

    pub async fn show_tour_dates_deals(
        &self,
        tour_id: &str,
        mut params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        params.insert("id", tour_id);
        self.call(&endpoint::SHOW_TOUR_DATES_DEALS, params, channel)
            .await
    }

    pub async fn create_enquiry(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::CREATE_ENQUIRY, params, channel).await
    }

    pub async fn search_enquiries(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::SEARCH_ENQUIRIES, params, channel)
            .await
    }

    pub async fn show_enquiry(
        &self,
        enquiry_id: &str,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new().with("enquiry_id", enquiry_id);
        self.call(&endpoint::SHOW_ENQUIRY, params, channel).await
    }

    pub async fn list_payments(&self, channel: Option<u64>) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::LIST_PAYMENTS, Params::new(), channel)
            .await
    }

    pub async fn show_booking(
        &self,
        booking_id: &str,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new().with("booking_id", booking_id);
        self.call(&endpoint::SHOW_BOOKING, params, channel).await
    }

    pub async fn show_customer(
        &self,
        customer_id: &str,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new().with("customer_id", customer_id);
        self.call(&endpoint::SHOW_CUSTOMER, params, channel).await
    }

    pub async fn search_bookings(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::SEARCH_BOOKINGS, params, channel)
            .await
    }

    pub async fn search_agents(
        &self,
        params: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        self.call(&endpoint::SEARCH_AGENTS, params, channel).await
    }

    // `rates` maps rate ids to customer counts, e.g. `r1=2`.
    pub async fn tour_avail(
        &self,
        tour_id: &str,
        date: &str,
        rates: Params,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let mut params = Params::new().with("id", tour_id).with("date", date);
        params.extend(rates);
        self.call(&endpoint::TOUR_AVAIL, params, channel).await
    }

    // `components` and `customers` are sent as nested XML elements.
    pub async fn start_booking(
        &self,
        booking_key: &str,
        total_customers: u32,
        components: Node,
        customers: Node,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new()
            .with("total_customers", total_customers)
            .with("booking_key", booking_key)
            .with("components", components)
            .with("customers", customers);
        self.call(&endpoint::START_BOOKING, params, channel).await
    }

    pub async fn commit_booking(
        &self,
        booking_id: &str,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let params = Params::new().with("booking_id", booking_id);
        self.call(&endpoint::COMMIT_BOOKING, params, channel).await
    }

    // Adds a note to a booking. `note_type` defaults to `SERVICE`.
    pub async fn booking_note(
        &self,
        booking_id: &str,
        text: &str,
        note_type: Option<&str>,
        channel: Option<u64>,
    ) -> Result<ApiResponse, ClientError> {
        let note = Params::new()
            .with("type", note_type.unwrap_or(DEFAULT_NOTE_TYPE))
            .with("text", text)
            .into_node();
        let params = Params::new()
            .with("booking_id", booking_id)
            .with("note", note);
        self.call(&endpoint::BOOKING_NOTE, params, channel).await
    }
}

pub const DEFAULT_NOTE_TYPE: &str = "SERVICE";

fn unwrap_response(tree: Node) -> Node {
    match tree {
        Node::Map(mut entries) if entries.len() == 1 && entries[0].0 == "response" => {
            entries.pop().map(|(_, inner)| inner).unwrap_or_default()
        }
        other => other,
    }
}

// Normalises list cardinality and fills defaults, only for `error == OK`.
fn shape(endpoint: &Endpoint, tree: &mut Node) {
    if tree.get("error").and_then(Node::as_str) != Some("OK") {
        return;
    }

    match endpoint.scope {
        Some(scope) => {
            if let Some(scoped) = tree.get_mut(scope).filter(|node| node.is_map()) {
                normalise_all(scoped, endpoint.normalise);
            }
        }
        None => normalise_all(tree, endpoint.normalise),
    }
    apply_defaults(tree, endpoint.defaults);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::diagnostics::MemorySink;
    use crate::node_map;
    use crate::request::{FixedClock, Verb};
    use crate::signature::sign_canonical;
    use crate::transport::mock_transport::MockTransport;

    const NOW: i64 = 1_700_000_000;

    fn client(transport: Arc<MockTransport>, result_type: ResultType) -> TourCmsClient {
        let config = ClientConfig::new(Credentials::new(100, "secret", 0))
            .with_result_type(result_type);
        TourCmsClient::new(config)
            .unwrap()
            .with_transport(transport)
            .with_clock(Arc::new(FixedClock(NOW)))
    }

    fn native(transport: Arc<MockTransport>) -> TourCmsClient {
        client(transport, ResultType::Native)
    }

    #[tokio::test]
    async fn test_single_tour_becomes_one_element_list() {
        let transport = Arc::new(MockTransport::new().respond(
            200,
            "<response><error>OK</error><tour><tour_id>1</tour_id></tour></response>",
        ));
        let client = native(transport.clone());

        let response = client.list_tours(Params::new(), None).await.unwrap();

        let tree = response.document().unwrap();
        assert_eq!(
            tree.get("tour"),
            Some(&Node::List(vec![node_map! { "tour_id" => "1" }]))
        );
        assert!(response.is_ok());

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://api.tourcms.com/p/tours/list.xml");
        assert_eq!(requests[0].verb, Verb::Get);
    }

    #[tokio::test]
    async fn test_repeated_tours_stay_a_list() {
        let transport = Arc::new(MockTransport::new().respond(
            200,
            "<response><error>OK</error><tour><tour_id>1</tour_id></tour>\
             <tour><tour_id>2</tour_id></tour></response>",
        ));
        let client = native(transport);

        let response = client.list_tours(Params::new(), None).await.unwrap();

        let tours = response.document().unwrap().get("tour").unwrap();
        assert_eq!(tours.as_list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_is_returned_and_logged() {
        let transport = Arc::new(MockTransport::new().respond(403, "<response/>"));
        let sink = Arc::new(MemorySink::default());
        let client = native(transport).with_diagnostics(sink.clone());

        let response = client.show_channel(Some(3930)).await.unwrap();

        assert_eq!(response, ApiResponse::HttpError { status: 403 });
        assert_eq!(response.status(), Some(403));
        assert_eq!(response.error(), None);
        assert!(!response.is_ok());
        assert!(sink.contains(Level::ERROR, "403"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(MockTransport::new().fail("connection refused"));
        let client = native(transport);

        let result = client.list_payments(Some(3930)).await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
    }

    #[tokio::test]
    async fn test_server_error_skips_normalisation() {
        let transport = Arc::new(MockTransport::new().respond(
            200,
            "<response><error>NOTHING TO LIST</error></response>",
        ));
        let client = native(transport);

        let response = client.search_bookings(Params::new(), None).await.unwrap();

        assert_eq!(response.error(), Some("NOTHING TO LIST"));
        assert_eq!(
            response.into_document().unwrap(),
            node_map! { "error" => "NOTHING TO LIST" }
        );
    }

    #[tokio::test]
    async fn test_search_bookings_fills_count_and_empty_list() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let client = native(transport);

        let response = client.search_bookings(Params::new(), None).await.unwrap();

        let tree = response.document().unwrap();
        assert_eq!(tree.get("booking"), Some(&Node::List(Vec::new())));
        assert_eq!(
            tree.get("total_bookings_count").and_then(Node::as_str),
            Some("0")
        );
    }

    #[tokio::test]
    async fn test_show_booking_normalises_inside_booking() {
        let transport = Arc::new(MockTransport::new().respond(
            200,
            "<response><error>OK</error><booking><booking_id>9</booking_id>\
             <customers><customer><customer_id>1</customer_id></customer></customers>\
             <payments/></booking></response>",
        ));
        let client = native(transport.clone());

        let response = client.show_booking("9", Some(3930)).await.unwrap();

        let booking = response.document().unwrap().get("booking").unwrap();
        assert_eq!(
            booking.get_path(&["customers", "customer"]),
            Some(&Node::List(vec![node_map! { "customer_id" => "1" }]))
        );
        assert_eq!(
            booking.get_path(&["payments", "payment"]),
            Some(&Node::List(Vec::new()))
        );
        assert_eq!(
            booking.get_path(&["components", "component"]),
            Some(&Node::List(Vec::new()))
        );
        assert!(response.document().unwrap().get("customers").is_none());
        assert_eq!(
            transport.requests()[0].path_with_query,
            "/c/booking/show.xml?booking_id=9"
        );
    }

    #[tokio::test]
    async fn test_show_tour_without_tour_element_is_left_alone() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let client = native(transport);

        let response = client.show_tour("24", Params::new(), Some(3930)).await.unwrap();

        assert_eq!(response.into_document().unwrap(), node_map! { "error" => "OK" });
    }

    #[tokio::test]
    async fn test_raw_mode_returns_body_untouched() {
        let body = "<response><error>OK</error></response>";
        let transport = Arc::new(MockTransport::new().respond(200, body));
        let client = client(transport, ResultType::Raw);

        let response = client.api_rate_limit_status(None).await.unwrap();

        assert_eq!(response, ApiResponse::Raw(Bytes::from(body)));
        assert_eq!(response.status(), None);
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_native_without_codec_degrades_to_raw() {
        let body = "<response><error>OK</error></response>";
        let transport = Arc::new(MockTransport::new().respond(200, body));
        let sink = Arc::new(MemorySink::default());
        let client = native(transport)
            .without_codec()
            .with_diagnostics(sink.clone());

        let response = client.list_tours(Params::new(), None).await.unwrap();

        assert_eq!(response, ApiResponse::Raw(Bytes::from(body)));
        assert!(sink.contains(Level::ERROR, "no XML codec"));
    }

    #[tokio::test]
    async fn test_xml_post_without_codec_is_an_encode_error() {
        let transport = Arc::new(MockTransport::new());
        let client = native(transport.clone()).without_codec();

        let result = client.commit_booking("9001", Some(3930)).await;

        assert!(matches!(
            result,
            Err(ClientError::Encode(EncodeError::CodecUnavailable))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_is_a_decode_error() {
        let transport = Arc::new(MockTransport::new().respond(200, "<response><error>"));
        let client = native(transport);

        let result = client.list_tours(Params::new(), None).await;

        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[tokio::test]
    async fn test_request_is_logged_without_secret() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let sink = Arc::new(MemorySink::default());
        let client = native(transport).with_diagnostics(sink.clone());

        client.list_tours(Params::new(), None).await.unwrap();

        assert!(sink.contains(Level::DEBUG, "url is: https://api.tourcms.com/p/tours/list.xml"));
        assert!(sink.contains(Level::DEBUG, "Authorization => TourCMS 0:100:"));
        assert!(sink.contains(Level::DEBUG, "0/100/GET/1700000000/p/tours/list.xml"));
        assert!(sink.records().iter().all(|(_, m)| !m.contains("secret")));
    }

    #[tokio::test]
    async fn test_authorization_header_for_channel_override() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let client = native(transport.clone());

        client
            .search_tours(Params::new().with("country", "GB"), Some(3930))
            .await
            .unwrap();

        let request = &transport.requests()[0];
        let signature = sign_canonical(
            "secret",
            "3930/100/GET/1700000000/c/tours/search.xml?country=GB",
        );
        assert_eq!(
            request.header("Authorization"),
            Some(format!("TourCMS 3930:100:{}", signature).as_str())
        );
    }

    #[tokio::test]
    async fn test_list_channels_always_uses_marketplace_route() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let config = ClientConfig::new(Credentials::new(100, "secret", 3930));
        let client = TourCmsClient::new(config)
            .unwrap()
            .with_transport(transport.clone());

        client.list_channels().await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.channel, 0);
        assert!(request.header("Authorization").unwrap().starts_with("TourCMS 0:100:"));
    }

    #[tokio::test]
    async fn test_tour_avail_puts_id_and_date_before_rates() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let client = native(transport.clone());

        client
            .tour_avail("24", "2024-06-01", Params::new().with("r1", "2"), Some(3930))
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0].path_with_query,
            "/c/tour/datesprices/checkavail.xml?id=24&date=2024-06-01&r1=2"
        );
    }

    #[tokio::test]
    async fn test_booking_note_posts_xml_with_default_type() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let client = native(transport.clone());

        client
            .booking_note("9001", "Late arrival", None, Some(3930))
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.verb, Verb::Post);
        assert_eq!(request.url, "https://api.tourcms.com/c/booking/note/new.xml");
        let body = String::from_utf8(request.body.clone().unwrap().to_vec()).unwrap();
        assert!(body.contains(
            "<booking><booking_id>9001</booking_id>\
             <note><type>SERVICE</type><text>Late arrival</text></note></booking>"
        ));
    }

    #[tokio::test]
    async fn test_start_booking_sends_nested_components() {
        let transport =
            Arc::new(MockTransport::new().respond(200, "<response><error>OK</error></response>"));
        let client = native(transport.clone());

        let components = node_map! {
            "component" => node_map! { "component_key" => "abc" },
        };
        let customers = node_map! {
            "customer" => node_map! { "firstname" => "Ada" },
        };
        client
            .start_booking("key-1", 1, components, customers, Some(3930))
            .await
            .unwrap();

        let body = transport.requests()[0].body.clone().unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("<total_customers>1</total_customers>"));
        assert!(body.contains(
            "<components><component><component_key>abc</component_key></component></components>"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_client() {
        let body = "<response><error>OK</error><tour><tour_id>1</tour_id></tour></response>";
        let transport = Arc::new(
            MockTransport::new()
                .respond(200, body)
                .respond(200, body)
                .respond(200, body),
        );
        let client = native(transport.clone());

        let calls = (0..3).map(|i| {
            client.list_tours(Params::new().with("page", i.to_string()), None)
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap().is_ok()));
        assert_eq!(transport.requests().len(), 3);
    }
}
