// Endpoint table
// Each TourCMS operation is a path template, a verb, a body encoding and the
// key paths whose cardinality gets normalised in a successful response.

use crate::request::{BodyEncoding, Verb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    // May contain `{route}`, filled with `p` or `c` from the effective channel.
    pub path: &'static str,
    pub verb: Verb,
    pub body: BodyEncoding,
    // Sub-document the normalisation paths are relative to. Skipped if absent.
    pub scope: Option<&'static str>,
    pub normalise: &'static [&'static [&'static str]],
    // Top-level keys filled in when missing from a successful response.
    pub defaults: &'static [(&'static str, &'static str)],
}

impl Endpoint {
    const fn get(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            verb: Verb::Get,
            body: BodyEncoding::Form,
            scope: None,
            normalise: &[],
            defaults: &[],
        }
    }

    const fn post_form(name: &'static str, path: &'static str) -> Self {
        Self {
            verb: Verb::Post,
            ..Self::get(name, path)
        }
    }

    const fn post_xml(name: &'static str, path: &'static str, root: &'static str) -> Self {
        Self {
            verb: Verb::Post,
            body: BodyEncoding::Xml { root },
            ..Self::get(name, path)
        }
    }

    const fn normalising(mut self, paths: &'static [&'static [&'static str]]) -> Self {
        self.normalise = paths;
        self
    }

    const fn scoped(mut self, scope: &'static str) -> Self {
        self.scope = Some(scope);
        self
    }

    const fn defaulting(mut self, defaults: &'static [(&'static str, &'static str)]) -> Self {
        self.defaults = defaults;
        self
    }
}

pub const API_RATE_LIMIT_STATUS: Endpoint =
    Endpoint::get("api_rate_limit_status", "/api/rate_limit_status.xml");

pub const LIST_CHANNELS: Endpoint =
    Endpoint::get("list_channels", "/p/channels/list.xml").normalising(&[&["channel"]]);

pub const SHOW_CHANNEL: Endpoint = Endpoint::get("show_channel", "/c/channel/show.xml");

pub const SEARCH_TOURS: Endpoint = Endpoint::get("search_tours", "/{route}/tours/search.xml")
    .normalising(&[&["tour"]])
    .defaulting(&[("total_tour_count", "0")]);

pub const SEARCH_HOTELS_SPECIFIC: Endpoint =
    Endpoint::get("search_hotels_specific", "/c/hotels/search-avail.xml")
        .normalising(&[&["tour"]]);

pub const LIST_TOURS: Endpoint =
    Endpoint::get("list_tours", "/{route}/tours/list.xml").normalising(&[&["tour"]]);

pub const LIST_TOUR_IMAGES: Endpoint =
    Endpoint::get("list_tour_images", "/c/tours/images/list.xml").normalising(&[&["tour"]]);

pub const SHOW_TOUR: Endpoint = Endpoint::get("show_tour", "/c/tour/show.xml")
    .scoped("tour")
    .normalising(&[
        &["geocode_midpoints", "midpoint"],
        &["pickup_points", "pickup"],
        &["documents", "document"],
        &["images", "image"],
        &["videos", "video"],
        &["new_booking", "people_selection", "rate"],
        &["alternative_tours", "tour"],
        &["options", "option"],
        &["custom_fields", "field"],
        &["categories", "group"],
    ]);

pub const SHOW_TOUR_DEPARTURES: Endpoint =
    Endpoint::get("show_tour_departures", "/c/tour/datesprices/dep/show.xml")
        .scoped("tour")
        .normalising(&[&["dates_and_prices", "departure"]]);

pub const SHOW_SUPPLIER: Endpoint = Endpoint::get("show_supplier", "/c/supplier/show.xml");

pub const GET_BOOKING_REDIRECT_URL: Endpoint = Endpoint::post_xml(
    "get_booking_redirect_url",
    "/c/booking/new/get_redirect_url.xml",
    "url",
);

pub const LIST_TOUR_LOCATIONS: Endpoint =
    Endpoint::get("list_tour_locations", "/p/tours/locations.xml").normalising(&[&["location"]]);

pub const LIST_PRODUCT_FILTERS: Endpoint =
    Endpoint::get("list_product_filters", "/c/tours/filters.xml");

pub const SHOW_TOUR_DATES_DEALS: Endpoint = Endpoint::get(
    "show_tour_dates_deals",
    "/c/tour/datesprices/datesndeals/search.xml",
)
.normalising(&[&["dates_and_prices", "date"]]);

pub const CREATE_ENQUIRY: Endpoint = Endpoint::post_form("create_enquiry", "/c/enquiry/new.xml");

pub const SEARCH_ENQUIRIES: Endpoint =
    Endpoint::get("search_enquiries", "/{route}/enquiries/search.xml")
        .normalising(&[&["enquiry"]])
        .defaulting(&[("total_enquiries_count", "0")]);

pub const SHOW_ENQUIRY: Endpoint = Endpoint::get("show_enquiry", "/c/enquiry/show.xml");

pub const LIST_PAYMENTS: Endpoint =
    Endpoint::get("list_payments", "/c/booking/payment/list.xml").normalising(&[&["payment"]]);

pub const SHOW_BOOKING: Endpoint = Endpoint::get("show_booking", "/c/booking/show.xml")
    .scoped("booking")
    .normalising(&[
        &["customers", "customer"],
        &["components", "component"],
        &["payments", "payment"],
        &["custom_fields", "field"],
    ]);

pub const SHOW_CUSTOMER: Endpoint = Endpoint::get("show_customer", "/c/customer/show.xml")
    .normalising(&[&["customer", "custom_fields", "field"]]);

pub const SEARCH_BOOKINGS: Endpoint =
    Endpoint::get("search_bookings", "/{route}/bookings/search.xml")
        .normalising(&[&["booking"]])
        .defaulting(&[("total_bookings_count", "0")]);

pub const SEARCH_AGENTS: Endpoint =
    Endpoint::get("search_agents", "/c/agents/search.xml").normalising(&[&["agent"]]);

pub const TOUR_AVAIL: Endpoint = Endpoint::get("tour_avail", "/c/tour/datesprices/checkavail.xml")
    .normalising(&[&["available_components", "component"]]);

pub const START_BOOKING: Endpoint =
    Endpoint::post_xml("start_booking", "/c/booking/new/start.xml", "booking");

pub const COMMIT_BOOKING: Endpoint =
    Endpoint::post_xml("commit_booking", "/c/booking/new/commit.xml", "booking");

pub const BOOKING_NOTE: Endpoint =
    Endpoint::post_xml("booking_note", "/c/booking/note/new.xml", "booking");

pub const ALL: &[Endpoint] = &[
    API_RATE_LIMIT_STATUS,
    LIST_CHANNELS,
    SHOW_CHANNEL,
    SEARCH_TOURS,
    SEARCH_HOTELS_SPECIFIC,
    LIST_TOURS,
    LIST_TOUR_IMAGES,
    SHOW_TOUR,
    SHOW_TOUR_DEPARTURES,
    SHOW_SUPPLIER,
    GET_BOOKING_REDIRECT_URL,
    LIST_TOUR_LOCATIONS,
    LIST_PRODUCT_FILTERS,
    SHOW_TOUR_DATES_DEALS,
    CREATE_ENQUIRY,
    SEARCH_ENQUIRIES,
    SHOW_ENQUIRY,
    LIST_PAYMENTS,
    SHOW_BOOKING,
    SHOW_CUSTOMER,
    SEARCH_BOOKINGS,
    SEARCH_AGENTS,
    TOUR_AVAIL,
    START_BOOKING,
    COMMIT_BOOKING,
    BOOKING_NOTE,
];

pub fn by_name(name: &str) -> Option<&'static Endpoint> {
    ALL.iter().find(|endpoint| endpoint.name == name)
}
