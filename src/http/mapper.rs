// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, error::TransportError, http::ResponseMetadata};

/// Maps transport-specific failures into the broker's [`TransportError`].
///
/// The broker hands over whatever [`ResponseMetadata`] the handle captured before failing, so
/// mappers can keep the HTTP status and `Retry-After` hint attached to the error.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TransportError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TransportError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => TransportError::Request(inner),
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_unknown_transport_error(meta),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		return TransportError::TimedOut {
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		};
	}

	TransportError::from(err)
}

pub(crate) fn map_generic_transport_error(
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> TransportError {
	TransportError::Other { message: message.to_string(), status: meta_status(meta) }
}

pub(crate) fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> TransportError {
	TransportError::Other { message: "unrecognized transport failure".into(), status: meta_status(meta) }
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(feature = "reqwest")]
fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
