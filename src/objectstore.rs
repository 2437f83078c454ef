//! Object store client: a single `get_object` operation against an
//! S3-compatible store. The retry/signing configuration
//! (`signature_version="v4"`, `max_attempts=10`, `mode="standard"`) matches
//! the reference deployment this proxy replaces exactly, rather than
//! inventing a different backoff policy.

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::Credentials;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::config::ProxyConfig;
use crate::server::constants::PROXY_CHUNK_SIZE;

/// The object body plus the handful of S3 response fields the proxy is
/// allowed to relay downstream.
pub struct ObjectBody {
    pub is_range_response: bool,
    pub accept_ranges: Option<String>,
    pub content_length: Option<String>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_range: Option<String>,
    pub stream: std::pin::Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>,
}

pub enum ObjectOutcome {
    Found(ObjectBody),
    NotFound,
    Error,
}

pub struct ObjectStoreClient {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl ObjectStoreClient {
    pub async fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.aws_default_region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(10));

        if let (Some(access_key), Some(secret_key)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "s3proxy-static",
            ));
        }

        let shared_config = loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.s3_endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client,
            bucket: config.aws_s3_bucket.clone(),
        })
    }

    /// Fetches `key`, optionally honoring a byte-`range` header forwarded
    /// verbatim from the client.
    pub async fn get_object(&self, key: &str, range: Option<&str>) -> ObjectOutcome {
        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(r) = range {
            request = request.range(r);
        }

        let output = match request.send().await {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|svc| svc.is_no_such_key())
                    .unwrap_or(false)
                {
                    return ObjectOutcome::NotFound;
                }
                tracing::warn!(target = "s3proxy::objectstore", "get_object failed: {err}");
                return ObjectOutcome::Error;
            }
        };

        let is_range_response = range.is_some();
        let content_length = output.content_length().map(|v| v.to_string());
        let content_type = output.content_type().map(|v| v.to_string());
        let etag = output.e_tag().map(|v| v.to_string());
        let last_modified = output
            .last_modified()
            .and_then(|dt| dt.fmt(aws_smithy_types::date_time::Format::HttpDate).ok());
        let content_range = output.content_range().map(|v| v.to_string());
        let accept_ranges = output.accept_ranges().map(|v| v.to_string());

        let stream = Box::pin(rechunk(output.body, PROXY_CHUNK_SIZE));

        ObjectOutcome::Found(ObjectBody {
            is_range_response,
            accept_ranges,
            content_length,
            content_type,
            etag,
            last_modified,
            content_range,
            stream,
        })
    }
}

/// Re-chunks the SDK's `ByteStream` into fixed `chunk_size` pieces, the same
/// discipline as the source's `body_upstream`'s
/// `streamingBody.iter_chunks(chunk_size=16384)`.
fn rechunk(
    body: aws_smithy_types::byte_stream::ByteStream,
    chunk_size: usize,
) -> impl Stream<Item = std::io::Result<Bytes>> {
    struct State {
        body: aws_smithy_types::byte_stream::ByteStream,
        buf: BytesMut,
        done: bool,
    }

    stream::unfold(
        State {
            body,
            buf: BytesMut::new(),
            done: false,
        },
        move |mut state| async move {
            loop {
                if state.buf.len() >= chunk_size {
                    let chunk = state.buf.split_to(chunk_size).freeze();
                    return Some((Ok(chunk), state));
                }
                if state.done {
                    if state.buf.is_empty() {
                        return None;
                    }
                    let chunk = state.buf.split().freeze();
                    return Some((Ok(chunk), state));
                }
                match state.body.next().await {
                    Some(Ok(bytes)) => state.buf.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        return Some((
                            Err(std::io::Error::other(e.to_string())),
                            state,
                        ));
                    }
                    None => state.done = true,
                }
            }
        },
    )
}
