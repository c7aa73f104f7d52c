//! Interaction signature middleware for Actix Web.
//!
//! Discord signs every interaction it delivers with the application's Ed25519 key. The signature covers the
//! `X-Signature-Timestamp` header value followed by the raw request body, and is sent hex-encoded in the
//! `X-Signature-Ed25519` header.
//!
//! Discord probes the endpoint with bad signatures when it is registered and expects them to be rejected with a 401,
//! so every route that receives interactions must be wrapped with this middleware.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::errors::ServerError;

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

pub struct SignatureMiddlewareFactory {
    key: Option<VerifyingKey>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl SignatureMiddlewareFactory {
    pub fn new(key: Option<VerifyingKey>, enabled: bool) -> Self {
        SignatureMiddlewareFactory { key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService { key: self.key, enabled: self.enabled, service: Rc::new(service) }))
    }
}

pub struct SignatureMiddlewareService<S> {
    key: Option<VerifyingKey>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let key = self.key;
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking interaction signature");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let key = key.ok_or_else(|| {
                warn!("🔐️ No public key is configured, so no interaction can be verified. Denying access.");
                ServerError::InvalidSignature("No public key is configured.".into())
            })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ServerError::InvalidRequestBody(e.to_string())
            })?;
            let signature = header_value(&req, SIGNATURE_HEADER)?;
            let timestamp = header_value(&req, TIMESTAMP_HEADER)?;
            verify_interaction(&key, &signature, &timestamp, data.as_ref())?;
            trace!("🔐️ Signature check for request ✅️");
            req.set_payload(bytes_to_payload(data));
            service.call(req).await
        })
    }
}

fn header_value(req: &ServiceRequest, name: &str) -> Result<String, ServerError> {
    let value = req.headers().get(name).ok_or_else(|| {
        warn!("🔐️ No {name} header found in request. Denying access.");
        ServerError::InvalidSignature(format!("Missing {name} header."))
    })?;
    value
        .to_str()
        .map(|s| s.to_string())
        .map_err(|e| ServerError::InvalidSignature(format!("Unreadable {name} header. {e}")))
}

/// Checks a hex-encoded Ed25519 signature over `timestamp || body`.
pub fn verify_interaction(
    key: &VerifyingKey,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<(), ServerError> {
    let bytes = hex::decode(signature_hex).map_err(|e| ServerError::InvalidSignature(e.to_string()))?;
    let signature = Signature::from_slice(&bytes).map_err(|e| ServerError::InvalidSignature(e.to_string()))?;
    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);
    key.verify(&message, &signature).map_err(|e| {
        warn!("🔐️ Invalid interaction signature. Denying access.");
        ServerError::InvalidSignature(e.to_string())
    })
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

#[cfg(test)]
mod test {
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;

    fn sign(key: &SigningKey, timestamp: &str, body: &str) -> String {
        hex::encode(key.sign(format!("{timestamp}{body}").as_bytes()).to_bytes())
    }

    #[test]
    fn valid_signature() {
        let key = SigningKey::from_bytes(&[3u8; 32]);
        let sig = sign(&key, "1700000000", r#"{"type":1}"#);
        assert!(verify_interaction(&key.verifying_key(), &sig, "1700000000", br#"{"type":1}"#).is_ok());
    }

    #[test]
    fn timestamp_is_part_of_the_message() {
        let key = SigningKey::from_bytes(&[3u8; 32]);
        let sig = sign(&key, "1700000000", r#"{"type":1}"#);
        let err = verify_interaction(&key.verifying_key(), &sig, "1700000001", br#"{"type":1}"#).unwrap_err();
        assert!(matches!(err, ServerError::InvalidSignature(_)));
    }

    #[test]
    fn garbage_signatures() {
        let key = SigningKey::from_bytes(&[3u8; 32]).verifying_key();
        assert!(verify_interaction(&key, "zz", "1", b"{}").is_err());
        assert!(verify_interaction(&key, "abcd", "1", b"{}").is_err());
    }
}
