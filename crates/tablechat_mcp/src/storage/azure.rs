//! Azure Table Storage over its REST API.

use super::{Continuation, Entity, EntityPage, EntityQuery, TableConnection, TableStore};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tablechat_error::{ConfigError, StorageError, StorageErrorKind, ToolError};
use tracing::{debug, error, instrument};

/// Environment variable holding the storage secret.
pub const CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";

const API_VERSION: &str = "2019-02-02";
const ACCEPT_NO_METADATA: &str = "application/json;odata=nometadata";
const CONTINUATION_PARTITION_HEADER: &str = "x-ms-continuation-nextpartitionkey";
const CONTINUATION_ROW_HEADER: &str = "x-ms-continuation-nextrowkey";

const DEV_ACCOUNT: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// How requests are authorised.
#[derive(Clone, PartialEq, Eq)]
enum Credential {
    SharedKey { account: String, key: Vec<u8> },
    Sas(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .finish_non_exhaustive(),
            Credential::Sas(_) => f.write_str("Sas(..)"),
        }
    }
}

/// A parsed storage connection string.
///
/// # Examples
///
/// ```
/// use tablechat_mcp::ConnectionString;
///
/// let parsed = ConnectionString::parse(
///     "DefaultEndpointsProtocol=https;AccountName=acme;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
/// ).unwrap();
/// assert_eq!(parsed.table_endpoint(), "https://acme.table.core.windows.net");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    table_endpoint: String,
    credential: Credential,
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let mut protocol = "https".to_string();
        let mut account = None;
        let mut key = None;
        let mut suffix = "core.windows.net".to_string();
        let mut table_endpoint = None;
        let mut sas = None;
        let mut development = false;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                StorageError::new(StorageErrorKind::ConnectionString(format!(
                    "expected Key=Value, got \"{}\"",
                    part
                )))
            })?;
            match name {
                "DefaultEndpointsProtocol" => protocol = value.to_string(),
                "AccountName" => account = Some(value.to_string()),
                "AccountKey" => key = Some(value.to_string()),
                "EndpointSuffix" => suffix = value.to_string(),
                "TableEndpoint" => table_endpoint = Some(value.trim_end_matches('/').to_string()),
                "SharedAccessSignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                _ => debug!(key = name, "Ignoring connection string key"),
            }
        }

        if development {
            account = Some(DEV_ACCOUNT.to_string());
            key = Some(DEV_ACCOUNT_KEY.to_string());
            table_endpoint.get_or_insert_with(|| DEV_TABLE_ENDPOINT.to_string());
        }

        let table_endpoint = match (table_endpoint, &account) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{}://{}.table.{}", protocol, account, suffix),
            (None, None) => {
                return Err(StorageError::new(StorageErrorKind::ConnectionString(
                    "AccountName or TableEndpoint is required".to_string(),
                )));
            }
        };

        let credential = match (account, key, sas) {
            (Some(account), Some(key), _) => {
                let key = STANDARD.decode(key.as_bytes()).map_err(|e| {
                    StorageError::new(StorageErrorKind::ConnectionString(format!(
                        "AccountKey is not valid base64: {}",
                        e
                    )))
                })?;
                Credential::SharedKey { account, key }
            }
            (_, _, Some(token)) => Credential::Sas(token),
            _ => {
                return Err(StorageError::new(StorageErrorKind::ConnectionString(
                    "AccountName/AccountKey or SharedAccessSignature is required".to_string(),
                )));
            }
        };

        Ok(Self {
            table_endpoint,
            credential,
        })
    }

    /// Base URL of the table service.
    pub fn table_endpoint(&self) -> &str {
        &self.table_endpoint
    }
}

/// Store backed by a real Azure (or Azurite) table.
#[derive(Debug, Clone)]
pub struct AzureTableStore {
    connection_string: Option<String>,
    table: String,
}

impl AzureTableStore {
    /// Create a store; the connection string is only validated on first use.
    pub fn new(connection_string: Option<String>, table: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.filter(|s| !s.trim().is_empty()),
            table: table.into(),
        }
    }

    /// Read the connection string from `AZURE_STORAGE_CONNECTION_STRING`.
    pub fn from_env(table: impl Into<String>) -> Self {
        Self::new(std::env::var(CONNECTION_STRING_ENV).ok(), table)
    }

    /// Whether a connection string was supplied at all.
    pub fn has_credential(&self) -> bool {
        self.connection_string.is_some()
    }
}

#[async_trait]
impl TableStore for AzureTableStore {
    #[instrument(skip(self), fields(table = %self.table))]
    async fn connect(&self) -> Result<Box<dyn TableConnection>, ToolError> {
        let raw = self.connection_string.as_deref().ok_or_else(|| {
            error!("{} not set", CONNECTION_STRING_ENV);
            ConfigError::new(format!("{} not set", CONNECTION_STRING_ENV))
        })?;
        let connection = ConnectionString::parse(raw)?;

        debug!(endpoint = %connection.table_endpoint, "Opening table connection");
        Ok(Box::new(AzureConnection {
            client: reqwest::Client::new(),
            connection,
            table: self.table.clone(),
        }))
    }
}

struct AzureConnection {
    client: reqwest::Client,
    connection: ConnectionString,
    table: String,
}

#[derive(Deserialize)]
struct ODataPage {
    #[serde(default)]
    value: Vec<Entity>,
}

impl AzureConnection {
    fn resource_path(&self) -> String {
        format!("{}/{}()", self.connection.table_endpoint, self.table)
    }

    fn query_string(
        &self,
        query: &EntityQuery,
        continuation: Option<&Continuation>,
    ) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(filter) = &query.filter {
            params.push(("$filter", filter.clone()));
        }
        if let Some(select) = &query.select {
            params.push(("$select", select.join(",")));
        }
        if let Some(top) = query.top {
            params.push(("$top", top.to_string()));
        }
        if let Some(next) = continuation {
            params.push(("NextPartitionKey", next.next_partition_key.clone()));
            if let Some(row) = &next.next_row_key {
                params.push(("NextRowKey", row.clone()));
            }
        }

        let mut pairs: Vec<String> = params
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(&v)))
            .collect();
        if let Credential::Sas(token) = &self.connection.credential {
            pairs.push(token.clone());
        }
        pairs.join("&")
    }
}

#[async_trait]
impl TableConnection for AzureConnection {
    #[instrument(skip(self, continuation), fields(table = %self.table, filter = ?query.filter))]
    async fn query_page(
        &mut self,
        query: &EntityQuery,
        continuation: Option<&Continuation>,
    ) -> Result<EntityPage, StorageError> {
        let path = self.resource_path();
        let query_string = self.query_string(query, continuation);
        let url = if query_string.is_empty() {
            path.clone()
        } else {
            format!("{}?{}", path, query_string)
        };

        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();

        let mut request = self
            .client
            .get(&url)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("Accept", ACCEPT_NO_METADATA)
            .header("DataServiceVersion", "3.0;NetFx")
            .header("MaxDataServiceVersion", "3.0;NetFx");

        if let Credential::SharedKey { account, key } = &self.connection.credential {
            let url_path = reqwest::Url::parse(&path)
                .map_err(|e| {
                    StorageError::new(StorageErrorKind::ConnectionString(format!(
                        "Invalid table endpoint: {}",
                        e
                    )))
                })?
                .path()
                .to_string();
            let signature = sign_shared_key_lite(key, &date, account, &url_path)?;
            request = request.header(
                "Authorization",
                format!("SharedKeyLite {}:{}", account, signature),
            );
        }

        let response = request.send().await.map_err(|e| {
            error!("Table request failed: {}", e);
            StorageError::new(StorageErrorKind::Http(e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Table service returned error");
            return Err(StorageError::new(StorageErrorKind::Api {
                status: status.as_u16(),
                message: odata_error_message(&body),
            }));
        }

        let continuation = response
            .headers()
            .get(CONTINUATION_PARTITION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|partition| Continuation {
                next_partition_key: partition.to_string(),
                next_row_key: response
                    .headers()
                    .get(CONTINUATION_ROW_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            });

        let page: ODataPage = response.json().await.map_err(|e| {
            StorageError::new(StorageErrorKind::Deserialization(e.to_string()))
        })?;

        debug!(entities = page.value.len(), more = continuation.is_some(), "Fetched page");
        Ok(EntityPage {
            entities: page.value,
            continuation,
        })
    }

    async fn close(self: Box<Self>) {
        debug!(table = %self.table, "Closing table connection");
    }
}

/// `Base64(HMAC-SHA256(key, "{date}\n/{account}{path}"))`
fn sign_shared_key_lite(
    key: &[u8],
    date: &str,
    account: &str,
    url_path: &str,
) -> Result<String, StorageError> {
    let string_to_sign = format!("{}\n/{}{}", date, account, url_path);
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StorageError::new(StorageErrorKind::Signing(e.to_string())))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Pull `odata.error.message.value` out of an error body, else return it raw.
fn odata_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/odata.error/message/value")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_key_connection_string() {
        let parsed = ConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=acme;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(parsed.table_endpoint(), "https://acme.table.core.windows.net");
        assert_eq!(
            parsed.credential,
            Credential::SharedKey {
                account: "acme".to_string(),
                key: b"secret".to_vec()
            }
        );
    }

    #[test]
    fn test_parse_development_storage() {
        let parsed = ConnectionString::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(parsed.table_endpoint(), DEV_TABLE_ENDPOINT);
    }

    #[test]
    fn test_parse_sas_with_explicit_endpoint() {
        let parsed = ConnectionString::parse(
            "TableEndpoint=https://acme.table.core.windows.net/;SharedAccessSignature=?sv=2019&sig=abc",
        )
        .unwrap();
        assert_eq!(parsed.table_endpoint(), "https://acme.table.core.windows.net");
        assert_eq!(parsed.credential, Credential::Sas("sv=2019&sig=abc".to_string()));
    }

    #[test]
    fn test_parse_rejects_missing_credential() {
        assert!(ConnectionString::parse("AccountName=acme").is_err());
        assert!(ConnectionString::parse("AccountName=acme;AccountKey=%%%").is_err());
        assert!(ConnectionString::parse("garbage").is_err());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = sign_shared_key_lite(b"secret", "Mon, 01 Jan 2024 00:00:00 GMT", "acme", "/mainData()")
            .unwrap();
        let b = sign_shared_key_lite(b"secret", "Mon, 01 Jan 2024 00:00:00 GMT", "acme", "/mainData()")
            .unwrap();
        let c = sign_shared_key_lite(b"secret", "Tue, 02 Jan 2024 00:00:00 GMT", "acme", "/mainData()")
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(STANDARD.decode(&a).unwrap().len(), 32);
    }

    #[test]
    fn test_query_string_encodes_filter_with_percent_twenty() {
        let conn = AzureConnection {
            client: reqwest::Client::new(),
            connection: ConnectionString::parse("AccountName=acme;AccountKey=c2VjcmV0").unwrap(),
            table: "mainData".to_string(),
        };
        let query = EntityQuery {
            filter: Some("city eq 'Atlanta'".to_string()),
            select: Some(vec!["city".to_string(), "RowKey".to_string()]),
            top: Some(5),
        };
        let qs = conn.query_string(&query, None);
        assert_eq!(
            qs,
            "%24filter=city%20eq%20%27Atlanta%27&%24select=city%2CRowKey&%24top=5"
        );
    }

    #[test]
    fn test_odata_error_message_extraction() {
        let body = r#"{"odata.error":{"code":"InvalidInput","message":{"lang":"en-US","value":"One of the request inputs is not valid."}}}"#;
        assert_eq!(
            odata_error_message(body),
            "One of the request inputs is not valid."
        );
        assert_eq!(odata_error_message("plain"), "plain");
    }

    #[tokio::test]
    async fn test_missing_connection_string_fails_on_first_use() {
        let store = AzureTableStore::new(None, "mainData");
        assert!(!store.has_credential());
        let err = store.connect().await.err().expect("connect must fail");
        assert!(err.to_string().contains(CONNECTION_STRING_ENV));
    }
}
