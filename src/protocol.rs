//! Length-prefixed JSON protocol for driving a store from a host process.
//!
//! Every message is a 4-byte little-endian length followed by that many
//! bytes of UTF-8 JSON. A request is an object with a single key naming the
//! operation:
//!
//! ```json
//! {"view_file": {"filename": "site.com/alice"}}
//! ```
//!
//! The response always carries `status` (empty on success, the error text
//! otherwise) and, on success, one key named after the operation:
//!
//! ```json
//! {"status": "", "view_file": {"filename": "site.com/alice", ...}}
//! ```

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::constants::{DEFAULT_MODE, MAX_FRAME_LEN};
use crate::core::domain::{Fields, PublicKeyRecord, SecretRecord};
use crate::core::history::VersionedStore;
use crate::core::keyring::Keyring;
use crate::core::path::{self, ROOT};
use crate::core::store::PasswordStore;
use crate::error::{Result, ValidationError};

/// Read one frame. `None` on end of input before a length prefix.
///
/// # Errors
///
/// `FrameTooLarge` when the announced length exceeds the limit; I/O errors
/// for truncated frames.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("length prefix cut short after {} byte(s)", filled),
                )
                .into())
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ValidationError::FrameTooLarge(len).into());
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

/// Write one frame and flush.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ValidationError::FrameTooLarge(payload.len()).into());
    }
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// An operation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    ListFiles(ListFilesRequest),
    ViewFile(ViewFileRequest),
    AddFile(AddFileRequest),
    EditFile(EditFileRequest),
    DeleteFile(DeleteFileRequest),
    AddRecipient(RecipientRequest),
    RemoveRecipient(RecipientRequest),
    ScanStore(ScanStoreRequest),
}

impl Request {
    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListFiles(_) => "list_files",
            Self::ViewFile(_) => "view_file",
            Self::AddFile(_) => "add_file",
            Self::EditFile(_) => "edit_file",
            Self::DeleteFile(_) => "delete_file",
            Self::AddRecipient(_) => "add_recipient",
            Self::RemoveRecipient(_) => "remove_recipient",
            Self::ScanStore(_) => "scan_store",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFilesRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ViewFileRequest {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddFileRequest {
    pub filename: String,
    pub password: String,
    pub username: String,
    pub sitename: String,
    pub data: String,
    pub rest: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditFileRequest {
    pub orig_file: String,
    pub filename: String,
    pub password: String,
    pub username: String,
    pub sitename: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteFileRequest {
    #[serde(default)]
    pub file: String,
}

/// Shared by `add_recipient` and `remove_recipient`. Always targets the
/// root domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecipientRequest {
    pub num_skip: usize,
    pub fingerprint: String,
    pub scan_store: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanStoreRequest {}

/// A response frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Response {
    pub status: String,
    #[serde(flatten)]
    pub body: Option<ResponseBody>,
}

impl Response {
    fn ok(body: ResponseBody) -> Self {
        Self {
            status: String::new(),
            body: Some(body),
        }
    }

    fn failed(status: String) -> Self {
        Self { status, body: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseBody {
    ListFiles(ListFilesResponse),
    ViewFile(ViewFileResponse),
    AddFile(Empty),
    EditFile(Empty),
    DeleteFile(Empty),
    AddRecipient(RecipientResponse),
    RemoveRecipient(RecipientResponse),
    ScanStore(ScanStoreResponse),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewFileResponse {
    pub filename: String,
    pub sitename: String,
    pub username: String,
    pub password: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipientResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_store: Option<ScanStoreResponse>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStoreResponse {
    pub num_files: usize,
    pub key_map: BTreeMap<String, PublicKeyRecord>,
    pub unused_key_map: BTreeMap<String, PublicKeyRecord>,
    pub key_file_count_map: BTreeMap<String, usize>,
    pub missing_key_file_count_map: BTreeMap<String, usize>,
}

/// Answers requests against one store.
pub struct Handler<'a, K: Keyring, S: VersionedStore> {
    store: &'a mut PasswordStore<K, S>,
}

impl<'a, K: Keyring, S: VersionedStore> Handler<'a, K, S> {
    pub fn new(store: &'a mut PasswordStore<K, S>) -> Self {
        Self { store }
    }

    /// Decode, dispatch and encode one request payload.
    ///
    /// Request failures, including malformed JSON, become a response with
    /// a non-empty `status`.
    pub fn handle_payload(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let response = match serde_json::from_slice::<Request>(payload) {
            Ok(request) => self.handle(request),
            Err(e) => Response::failed(format!("could not decode request: {}", e)),
        };
        Ok(serde_json::to_vec(&response)?)
    }

    pub fn handle(&mut self, request: Request) -> Response {
        let operation = request.name();
        debug!(operation, "handling request");
        match self.dispatch(request) {
            Ok(body) => Response::ok(body),
            Err(e) => {
                warn!(operation, error = %e, "request failed");
                Response::failed(e.to_string())
            }
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<ResponseBody> {
        Ok(match request {
            Request::ListFiles(_) => ResponseBody::ListFiles(ListFilesResponse {
                files: self.store.list()?,
            }),
            Request::ViewFile(req) => ResponseBody::ViewFile(self.view_file(req)?),
            Request::AddFile(req) => {
                self.add_file(req)?;
                ResponseBody::AddFile(Empty {})
            }
            Request::EditFile(req) => {
                self.edit_file(req)?;
                ResponseBody::EditFile(Empty {})
            }
            Request::DeleteFile(req) => {
                self.store.delete(&req.file)?;
                ResponseBody::DeleteFile(Empty {})
            }
            Request::AddRecipient(req) => {
                self.store
                    .add_recipient(ROOT, &req.fingerprint, req.num_skip)?;
                ResponseBody::AddRecipient(self.recipient_response(req.scan_store)?)
            }
            Request::RemoveRecipient(req) => {
                self.store
                    .remove_recipient(ROOT, &req.fingerprint, req.num_skip)?;
                ResponseBody::RemoveRecipient(self.recipient_response(req.scan_store)?)
            }
            Request::ScanStore(_) => ResponseBody::ScanStore(self.scan_store()?),
        })
    }

    fn view_file(&self, req: ViewFileRequest) -> Result<ViewFileResponse> {
        let record = self.store.read(&req.filename)?;
        let fields = record.fields();

        // `site.com/user` names the site by its directory.
        let dir = path::parent(&req.filename);
        let mut sitename = if dir != ROOT && dir.contains('.') && !dir.contains('/') {
            dir.to_string()
        } else {
            String::new()
        };
        if let Some(site) = fields.get("sitename").filter(|s| !s.is_empty()) {
            sitename = site.to_string();
        }

        let username = match fields.usernames().first() {
            Some(user) => user.to_string(),
            None => req
                .filename
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        Ok(ViewFileResponse {
            data: fields.to_string(),
            sitename,
            username,
            password: record.secret().to_string(),
            filename: req.filename,
        })
    }

    fn add_file(&mut self, req: AddFileRequest) -> Result<()> {
        let mut fields = Fields::parse(&req.data);
        for [key, value] in &req.rest {
            fields.set(key, value)?;
        }
        set_nonempty(&mut fields, "username", &req.username)?;
        set_nonempty(&mut fields, "sitename", &req.sitename)?;

        let filename = if req.filename.is_empty() {
            join(&req.sitename, &req.username)
        } else {
            req.filename
        };
        let record = SecretRecord::new(req.password, fields)?;
        self.store.create(&filename, &record, DEFAULT_MODE)
    }

    fn edit_file(&mut self, req: EditFileRequest) -> Result<()> {
        let mut fields = Fields::parse(&req.data);
        set_nonempty(&mut fields, "username", &req.username)?;
        set_nonempty(&mut fields, "sitename", &req.sitename)?;

        let filename = if req.filename.is_empty() {
            fields.remove("username");
            fields.remove("sitename");
            join(&req.sitename, &req.username)
        } else {
            req.filename
        };
        let record = SecretRecord::new(req.password, fields)?;

        if !req.orig_file.is_empty() && req.orig_file != filename {
            self.store.replace(&req.orig_file, &filename, &record)
        } else {
            self.store.update(&filename, &record)
        }
    }

    fn recipient_response(&self, scan: bool) -> Result<RecipientResponse> {
        Ok(RecipientResponse {
            scan_store: if scan { Some(self.scan_store()?) } else { None },
        })
    }

    fn scan_store(&self) -> Result<ScanStoreResponse> {
        let report = self.store.scan()?;
        let keys = self.store.keyring().list_keys()?;

        let mut response = ScanStoreResponse {
            num_files: report.files,
            key_file_count_map: report.per_key.clone(),
            missing_key_file_count_map: report.unknown,
            ..Default::default()
        };
        for key in keys {
            if report.per_key.contains_key(&key.fingerprint) {
                response.key_map.insert(key.fingerprint.clone(), key);
            } else {
                response.unused_key_map.insert(key.fingerprint.clone(), key);
            }
        }
        Ok(response)
    }
}

fn set_nonempty(fields: &mut Fields, key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Ok(());
    }
    fields.set(key, value)
}

fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim().trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Answer framed requests from `reader` until end of input.
///
/// # Errors
///
/// Frame-level failures end the loop: oversized or truncated frames and
/// write errors. Failed requests do not.
pub fn serve<K, S, R, W>(store: &mut PasswordStore<K, S>, reader: &mut R, writer: &mut W) -> Result<usize>
where
    K: Keyring,
    S: VersionedStore,
    R: Read,
    W: Write,
{
    let mut handler = Handler::new(store);
    let mut served = 0;
    while let Some(payload) = read_frame(reader)? {
        let response = handler.handle_payload(&payload)?;
        write_frame(writer, &response)?;
        served += 1;
    }
    debug!(served, "input closed");
    Ok(served)
}
