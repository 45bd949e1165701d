//! HTTP client and XML conversion utilities.

mod http;
mod xml;

pub use http::HttpClient;
pub use xml::xml_fragment_to_json;
