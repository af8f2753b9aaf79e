//! Client core for the RegulaAI compliance-scanning service.
//!
//! This crate contains the wire types, the credential state, the operation
//! catalogue, the request executor that maps HTTP outcomes onto a stable error
//! taxonomy, and the decoder for streamed batch-scan results. The network
//! exchange itself is supplied through the [`Transport`] trait.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a transport must do; the `transport` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`SiteId`, `ApiKeyId`, `RequestId`) |
//! | [`types`] | Request/response shapes and the error envelope |
//! | [`errors`] | `ClientError` taxonomy and `TransportError` |
//! | [`credentials`] | `AuthCredential` and `CredentialStore` |
//! | [`config`] | `ClientConfiguration` |
//! | [`transport`] | The `Transport` port |
//! | [`operations`] | Static endpoint declarations |
//! | [`executor`] | `RequestExecutor` and the status mapping |
//! | [`batch`] | NDJSON batch decoding |
//! | [`client`] | `RegulaClient`, the typed facade |

pub mod batch;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod executor;
pub mod identifiers;
pub mod operations;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use batch::{decode_batch, decode_batch_report, BatchReport};
pub use client::{ClientBuilder, RegulaClient};
pub use config::ClientConfiguration;
pub use credentials::{AuthCredential, AuthMethod, CredentialStore};
pub use errors::{ClientError, ErrorKind, TransportError};
pub use executor::RequestExecutor;
pub use identifiers::{ApiKeyId, RequestId, SiteId};
pub use operations::{Operation, RequestKind, ResponseKind};
pub use transport::{Method, Transport, TransportRequest, TransportResponse};
pub use types::{
    ApiErrorEnvelope, ApiKeyCreateRequest, ApiKeyResponse, BatchItemFailure, BatchScanRequest,
    CheckoutSessionRequest, CheckoutSessionResponse, ComplianceScore, Cookie, EmailSettingsRequest,
    ErrorDetail, IntegrationStatusResponse, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, ScanRequest, ScanResponse, Severity, SlackWebhookRequest,
    TestIntegrationRequest, ValidationIssue, Violation,
};
