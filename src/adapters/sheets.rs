//! Google Sheets v4 / Drive v3 client covering the handful of calls the
//! roster check needs.

use crate::adapters::auth::{fetch_access_token, AccessToken, ServiceAccountKey};
use crate::config::VoteCheckConfig;
use crate::domain::model::RgbColor;
use crate::domain::ports::Worksheet;
use crate::utils::a1;
use crate::utils::error::{Result, VoteCheckError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// 到期前多久就先換新 token
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Clones share one token, so a refresh by any worksheet is seen by all.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    client: Client,
    key: Option<Arc<ServiceAccountKey>>,
    token: Arc<Mutex<AccessToken>>,
    sheets_api_base_url: String,
    drive_api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheets {
    /// Uses a fixed bearer token that is never refreshed.
    pub fn with_token(
        client: Client,
        token: impl Into<String>,
        sheets_api_base_url: impl Into<String>,
        drive_api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            key: None,
            token: Arc::new(Mutex::new(AccessToken::new(token, i64::MAX))),
            sheets_api_base_url: sheets_api_base_url.into(),
            drive_api_base_url: drive_api_base_url.into(),
        }
    }

    /// Signs in with a service-account key and keeps it for later refreshes.
    pub async fn with_service_account(
        client: Client,
        key: ServiceAccountKey,
        sheets_api_base_url: impl Into<String>,
        drive_api_base_url: impl Into<String>,
    ) -> Result<Self> {
        let token = fetch_access_token(&client, &key).await?;
        tracing::info!("🔐 Authenticated as {}", key.client_email);

        Ok(Self {
            client,
            key: Some(Arc::new(key)),
            token: Arc::new(Mutex::new(token)),
            sheets_api_base_url: sheets_api_base_url.into(),
            drive_api_base_url: drive_api_base_url.into(),
        })
    }

    /// 用服務帳號憑證登入
    pub async fn connect(config: &VoteCheckConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&config.service_account_file)?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Self::with_service_account(
            client,
            key,
            config.sheets_api_base_url.clone(),
            config.drive_api_base_url.clone(),
        )
        .await
    }

    /// Current bearer token, re-fetched once it is close to expiry.
    async fn bearer(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if let Some(key) = &self.key {
            if token.expires_within(chrono::TimeDelta::seconds(TOKEN_REFRESH_MARGIN_SECS)) {
                tracing::info!("🔄 Access token expires at {}, refreshing", token.expires_at);
                *token = fetch_access_token(&self.client, key).await?;
            }
        }

        Ok(token.secret.clone())
    }

    fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base).map_err(|e| VoteCheckError::ConfigError {
            message: format!("Invalid API base URL '{}': {}", base, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| VoteCheckError::ConfigError {
                message: format!("API base URL '{}' cannot be a base", base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(body);

        Err(VoteCheckError::SheetsApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let token = self.bearer().await?;
        let response = self.client.get(url).bearer_auth(token).send().await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Opens a spreadsheet by its Drive file name. The first match wins.
    pub async fn open(&self, name: &str) -> Result<Spreadsheet> {
        let mut url = Self::endpoint(&self.drive_api_base_url, &["files"])?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME_TYPE
        );
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("fields", "files(id,name)")
            .append_pair("includeItemsFromAllDrives", "true")
            .append_pair("supportsAllDrives", "true");

        let list: DriveFileList = self.get_json(url).await?;
        let file = list
            .files
            .into_iter()
            .next()
            .ok_or_else(|| VoteCheckError::SpreadsheetNotFound {
                name: name.to_string(),
            })?;

        tracing::info!("📄 Opened spreadsheet '{}' ({})", file.name, file.id);
        Ok(Spreadsheet {
            api: self.clone(),
            id: file.id,
            name: file.name,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Spreadsheet {
    api: GoogleSheets,
    id: String,
    name: String,
}

impl Spreadsheet {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn worksheet(&self, title: &str) -> Result<SheetsWorksheet> {
        let mut url = GoogleSheets::endpoint(
            &self.api.sheets_api_base_url,
            &["spreadsheets", self.id.as_str()],
        )?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");

        let metadata: SpreadsheetMetadata = self.api.get_json(url).await?;
        let properties = metadata
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == title)
            .ok_or_else(|| VoteCheckError::WorksheetNotFound {
                title: title.to_string(),
            })?;

        tracing::info!("📑 Using worksheet '{}'", properties.title);
        Ok(SheetsWorksheet {
            api: self.api.clone(),
            spreadsheet_id: self.id.clone(),
            sheet_id: properties.sheet_id,
            title: properties.title,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SheetsWorksheet {
    api: GoogleSheets,
    spreadsheet_id: String,
    sheet_id: i64,
    title: String,
}

impl SheetsWorksheet {
    pub fn sheet_id(&self) -> i64 {
        self.sheet_id
    }

    /// `'Form Responses 1'!B2`
    pub fn qualified_range(&self, range: &str) -> String {
        format!("'{}'!{}", self.title.replace('\'', "''"), range)
    }

    pub fn values_url(&self, range: &str) -> Result<Url> {
        GoogleSheets::endpoint(
            &self.api.sheets_api_base_url,
            &[
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.qualified_range(range).as_str(),
            ],
        )
    }

    fn batch_update_url(&self) -> Result<Url> {
        GoogleSheets::endpoint(
            &self.api.sheets_api_base_url,
            &["spreadsheets", format!("{}:batchUpdate", self.spreadsheet_id).as_str()],
        )
    }
}

impl Worksheet for SheetsWorksheet {
    async fn cell_value(&self, row: u32, col: u32) -> Result<Option<String>> {
        let url = self.values_url(&a1::cell_label(row, col))?;
        let range: ValueRange = self.api.get_json(url).await?;

        let value = range
            .values
            .into_iter()
            .next()
            .and_then(|r| r.into_iter().next())
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty());

        Ok(value)
    }

    async fn format_background(&self, range: &str, color: RgbColor) -> Result<()> {
        let grid = a1::parse_range(range, self.sheet_id)?;
        let body = json!({
            "requests": [{
                "repeatCell": {
                    "range": grid,
                    "cell": {
                        "userEnteredFormat": { "backgroundColor": color }
                    },
                    "fields": "userEnteredFormat.backgroundColor"
                }
            }]
        });

        let url = self.batch_update_url()?;
        tracing::debug!("POST {} ({})", url, range);
        let token = self.api.bearer().await?;
        let response = self
            .api
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        GoogleSheets::checked(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn api(server: &MockServer) -> GoogleSheets {
        GoogleSheets::with_token(
            Client::new(),
            "test-token",
            server.url("/v4"),
            server.url("/drive/v3"),
        )
    }

    fn worksheet(server: &MockServer, title: &str) -> SheetsWorksheet {
        SheetsWorksheet {
            api: api(server),
            spreadsheet_id: "sheet-123".to_string(),
            sheet_id: 987,
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_by_name() {
        let server = MockServer::start();
        let drive_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/drive/v3/files")
                .header("Authorization", "Bearer test-token")
                .query_param(
                    "q",
                    "name = 'ICSSC Election' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
                );
            then.status(200).json_body(json!({
                "files": [{"id": "sheet-123", "name": "ICSSC Election"}]
            }));
        });

        let spreadsheet = api(&server).open("ICSSC Election").await.unwrap();

        drive_mock.assert();
        assert_eq!(spreadsheet.id(), "sheet-123");
        assert_eq!(spreadsheet.name(), "ICSSC Election");
    }

    #[tokio::test]
    async fn test_open_missing_spreadsheet() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/drive/v3/files");
            then.status(200).json_body(json!({"files": []}));
        });

        let err = api(&server).open("Nope").await.unwrap_err();
        assert!(matches!(err, VoteCheckError::SpreadsheetNotFound { name } if name == "Nope"));
    }

    #[tokio::test]
    async fn test_select_worksheet_by_title() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet-123");
            then.status(200).json_body(json!({
                "sheets": [
                    {"properties": {"sheetId": 0, "title": "Summary"}},
                    {"properties": {"sheetId": 555, "title": "Responses"}}
                ]
            }));
        });

        let spreadsheet = Spreadsheet {
            api: api(&server),
            id: "sheet-123".to_string(),
            name: "ICSSC Election".to_string(),
        };

        let ws = spreadsheet.worksheet("Responses").await.unwrap();
        assert_eq!(ws.sheet_id(), 555);

        let err = spreadsheet.worksheet("Missing").await.unwrap_err();
        assert!(matches!(err, VoteCheckError::WorksheetNotFound { .. }));
    }

    #[test]
    fn test_values_url_quotes_title() {
        let server = MockServer::start();
        let ws = worksheet(&server, "Form Responses 1");
        assert_eq!(ws.qualified_range("B2"), "'Form Responses 1'!B2");

        let url = ws.values_url("B2").unwrap();
        assert!(url
            .path()
            .ends_with("/v4/spreadsheets/sheet-123/values/'Form%20Responses%201'!B2"));

        let ws = worksheet(&server, "Bob's Sheet");
        assert_eq!(ws.qualified_range("A1"), "'Bob''s Sheet'!A1");
    }

    #[tokio::test]
    async fn test_read_cell_value() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/sheet-123/values/'Responses'!B2");
            then.status(200).json_body(json!({
                "range": "Responses!B2",
                "majorDimension": "ROWS",
                "values": [["alice@uci.edu"]]
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/sheet-123/values/'Responses'!B3");
            then.status(200).json_body(json!({
                "range": "Responses!B3",
                "majorDimension": "ROWS"
            }));
        });

        let ws = worksheet(&server, "Responses");
        assert_eq!(
            ws.cell_value(2, 2).await.unwrap(),
            Some("alice@uci.edu".to_string())
        );
        assert_eq!(ws.cell_value(3, 2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_format_background_sends_repeat_cell() {
        let server = MockServer::start();
        let format_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/sheet-123:batchUpdate")
                .header("Authorization", "Bearer test-token")
                .json_body(json!({
                    "requests": [{
                        "repeatCell": {
                            "range": {
                                "sheetId": 987,
                                "startRowIndex": 2,
                                "endRowIndex": 3,
                                "startColumnIndex": 0,
                                "endColumnIndex": 11
                            },
                            "cell": {
                                "userEnteredFormat": {
                                    "backgroundColor": {"red": 1.0, "green": 0.5, "blue": 0.5}
                                }
                            },
                            "fields": "userEnteredFormat.backgroundColor"
                        }
                    }]
                }));
            then.status(200).json_body(json!({"spreadsheetId": "sheet-123", "replies": [{}]}));
        });

        let ws = worksheet(&server, "Responses");
        ws.format_background("A3:K3", RgbColor::INVALID).await.unwrap();

        format_mock.assert();
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v4/spreadsheets/sheet-123:batchUpdate");
            then.status(403).json_body(json!({
                "error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}
            }));
        });

        let ws = worksheet(&server, "Responses");
        let err = ws
            .format_background("A3:K3", RgbColor::INVALID)
            .await
            .unwrap_err();

        match err {
            VoteCheckError::SheetsApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn service_account(server: &MockServer) -> ServiceAccountKey {
        let mut key = ServiceAccountKey::from_json_str(include_str!(
            "../../tests/fixtures/service_account.json"
        ))
        .unwrap();
        key.token_uri = server.url("/token");
        key
    }

    async fn sign_in(server: &MockServer) -> GoogleSheets {
        GoogleSheets::with_service_account(
            Client::new(),
            service_account(server),
            server.url("/v4"),
            server.url("/drive/v3"),
        )
        .await
        .unwrap()
    }

    fn mock_drive_files<'a>(server: &'a MockServer, bearer: &str) -> httpmock::Mock<'a> {
        let authorization = format!("Bearer {}", bearer);
        server.mock(move |when, then| {
            when.method(GET)
                .path("/drive/v3/files")
                .header("Authorization", authorization);
            then.status(200).json_body(json!({
                "files": [{"id": "sheet-123", "name": "ICSSC Election"}]
            }));
        })
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refreshed() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({
                "access_token": "ya29.short-lived",
                "expires_in": 5,
                "token_type": "Bearer"
            }));
        });
        let drive_mock = mock_drive_files(&server, "ya29.short-lived");

        let api = sign_in(&server).await;
        token_mock.assert_hits(1);

        // 5 秒的 token 一直落在換新的範圍內，每次呼叫前都重拿
        api.open("ICSSC Election").await.unwrap();
        api.open("ICSSC Election").await.unwrap();

        token_mock.assert_hits(3);
        drive_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_refreshed_token_is_sent() {
        let server = MockServer::start();
        let mut first = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "ya29.first", "expires_in": 30}));
        });

        let api = sign_in(&server).await;
        first.assert_hits(1);
        first.delete();

        let second = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "ya29.second", "expires_in": 3599}));
        });
        let stale = mock_drive_files(&server, "ya29.first");
        let fresh = mock_drive_files(&server, "ya29.second");

        // worksheet 共用同一份 token，換過一次之後就不用再換
        let copy = api.clone();
        api.open("ICSSC Election").await.unwrap();
        copy.open("ICSSC Election").await.unwrap();

        second.assert_hits(1);
        fresh.assert_hits(2);
        stale.assert_hits(0);
    }

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "ya29.hour", "expires_in": 3599}));
        });
        let drive_mock = mock_drive_files(&server, "ya29.hour");

        let api = sign_in(&server).await;
        api.open("ICSSC Election").await.unwrap();
        api.open("ICSSC Election").await.unwrap();

        token_mock.assert_hits(1);
        drive_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_failed_refresh_aborts_request() {
        let server = MockServer::start();
        let mut token_mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "ya29.first", "expires_in": 10}));
        });

        let api = sign_in(&server).await;
        token_mock.delete();
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(json!({"error": "invalid_grant"}));
        });
        let drive_mock = mock_drive_files(&server, "ya29.first");

        let err = api.open("ICSSC Election").await.unwrap_err();
        assert!(matches!(err, VoteCheckError::SheetsApiError { status: 400, .. }));
        drive_mock.assert_hits(0);
    }
}
