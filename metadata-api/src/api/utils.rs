use crate::errors::Result;
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use hyper::Response;
use hyper::body::Bytes;
use serde::Serialize;

/// Serializes a value into a JSON response body.
pub fn json_response<T: Serialize>(value: &T) -> Result<Response<Bytes>> {
    let bytes = serde_json::to_vec(value).map(Bytes::from)?;

    let mut response = Response::new(bytes);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
