//! Image generation provider clients

pub mod http_client;
mod kie;

pub use http_client::{HttpClient, HttpClientTrait, RawResponse};
pub use kie::{
    KieImageProvider, DEFAULT_IMAGE_SIZE, DEFAULT_KIE_BASE_URL, INVALID_RESPONSE_MESSAGE,
    PAYLOAD_TOO_LARGE_MESSAGE,
};
