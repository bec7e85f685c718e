//! Upload / verify sequencing: hash → contract call → ledger record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app::ledger_client::EventSink;
use crate::crypto::hashing::{hash_file, DocumentDigest};
use crate::domain::{EventKind, NewEvent, Session};
use crate::infra::error::{ActionError, GatewayError, HashError};
use crate::infra::ethereum::{ContractGateway, ReadMethod, WriteMethod};

/// Marker prepended to digests before they reach the contract and the ledger.
pub const HASH_PREFIX: &str = "0x";

pub fn prefixed(digest: &DocumentDigest) -> String {
    format!("{}{}", HASH_PREFIX, digest.to_hex())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    pub document_hash: String,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub document_hash: String,
    pub exists: bool,
}

/// User-visible status line for an upload attempt.
pub fn upload_status(result: &Result<Uploaded, ActionError>) -> String {
    match result {
        Ok(_) => "Document hash uploaded successfully!".to_string(),
        Err(e) if e.is_precondition() => e.to_string(),
        Err(e) => format!("Upload failed or hash exists: {}", e),
    }
}

/// User-visible status line for a verify attempt.
pub fn verify_status(result: &Result<Verification, ActionError>) -> String {
    match result {
        Ok(v) if v.exists => "Verified".to_string(),
        Ok(_) => "Not Verified".to_string(),
        Err(e) if e.is_precondition() => e.to_string(),
        Err(e) => format!("Verification failed: {}", e),
    }
}

fn failure_message(err: &ActionError) -> String {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        "unknown error".to_string()
    } else {
        msg
    }
}

async fn hash_in_background(path: PathBuf) -> Result<DocumentDigest, HashError> {
    tokio::task::spawn_blocking(move || hash_file(&path))
        .await
        .map_err(|e| HashError::Digest(format!("hashing task failed: {}", e)))?
}

/// Holds the wallet session and runs one action at a time against it.
///
/// The session lock is held for the whole action, so wallet interactions never overlap.
pub struct Orchestrator {
    gateway: Arc<dyn ContractGateway>,
    sink: Arc<dyn EventSink>,
    session: Mutex<Option<Session>>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn ContractGateway>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            gateway,
            sink,
            session: Mutex::new(None),
        }
    }

    /// Establishes a new session, replacing any previous one.
    ///
    /// On failure the previous session is discarded as well.
    pub async fn connect(&self) -> Result<Session, GatewayError> {
        let mut guard = self.session.lock().await;
        *guard = None;
        let session = self.gateway.connect().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    pub async fn disconnect(&self) {
        self.session.lock().await.take();
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    pub async fn upload(&self, file: Option<&Path>) -> Result<Uploaded, ActionError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(ActionError::NotConnected)?;
        let file = file.ok_or(ActionError::NoFileSelected("upload"))?;
        let account = session.account_hex();

        let result = self.try_upload(session, file).await;
        let event = match &result {
            Ok(uploaded) => {
                info!(document = %uploaded.document_hash, tx = %uploaded.transaction_hash, "document uploaded");
                NewEvent::new(EventKind::Upload)
                    .document_hash(uploaded.document_hash.clone())
                    .transaction_hash(uploaded.transaction_hash.clone())
                    .verified(true)
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                NewEvent::new(EventKind::UploadFailed)
                    .error_msg(failure_message(e))
                    .verified(false)
            }
        };
        self.sink.submit(event.user_address(account).timestamp(Utc::now()));
        result
    }

    async fn try_upload(&self, session: &Session, file: &Path) -> Result<Uploaded, ActionError> {
        let digest = hash_in_background(file.to_path_buf()).await?;
        let receipt = self
            .gateway
            .submit_write(session, WriteMethod::UploadDocument(digest), session.account)
            .await?;
        Ok(Uploaded {
            document_hash: prefixed(&digest),
            transaction_hash: receipt.transaction_hash,
        })
    }

    pub async fn verify(&self, file: Option<&Path>) -> Result<Verification, ActionError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(ActionError::NotConnected)?;
        let file = file.ok_or(ActionError::NoFileSelected("verify"))?;
        let account = session.account_hex();

        let result = self.try_verify(session, file).await;
        let event = match &result {
            Ok(v) => {
                info!(document = %v.document_hash, exists = v.exists, "document checked");
                NewEvent::new(EventKind::Verify)
                    .document_hash(v.document_hash.clone())
                    .verified(v.exists)
            }
            Err(e) => {
                warn!(error = %e, "verify failed");
                NewEvent::new(EventKind::VerifyFailed)
                    .error_msg(failure_message(e))
                    .verified(false)
            }
        };
        self.sink.submit(event.user_address(account).timestamp(Utc::now()));
        result
    }

    async fn try_verify(&self, session: &Session, file: &Path) -> Result<Verification, ActionError> {
        let digest = hash_in_background(file.to_path_buf()).await?;
        let exists = self
            .gateway
            .submit_read(session, ReadMethod::VerifyDocument(digest))
            .await?;
        Ok(Verification {
            document_hash: prefixed(&digest),
            exists,
        })
    }
}
