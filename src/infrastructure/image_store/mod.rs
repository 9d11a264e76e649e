//! Object storage for demo uploads

mod in_memory;
mod s3;

pub use in_memory::InMemoryImageStore;
pub use s3::{build_public_url, S3ImageStore, S3ImageStoreConfig};

/// Object key for an uploaded demo image
pub(crate) fn object_key(content_type: &str) -> String {
    let extension = match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    };

    format!("demo-uploads/{}.{}", uuid::Uuid::new_v4(), extension)
}
