use hyper::body::Bytes;
use hyper::{Method, Uri};

/// Derives cache keys from buffered requests.
///
/// GET requests are keyed on the URI alone. Other methods append the body so
/// that queries with different payloads never share an entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDeriver;

impl KeyDeriver {
    pub fn new() -> Self {
        KeyDeriver
    }

    pub fn derive(&self, method: &Method, uri: &Uri, body: &Bytes) -> String {
        if method == Method::GET {
            uri.to_string()
        } else {
            format!("{}#{}", uri, String::from_utf8_lossy(body))
        }
    }
}
