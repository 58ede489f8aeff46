use crate::domain::model::{MajorCode, MajorLookup, NetId};
use crate::domain::ports::Directory;
use crate::utils::error::{Result, VoteCheckError};
use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

const MAJOR_LABEL: &str = "Major";

/// UCI campus directory (`https://directory.uci.edu/people/{net_id}.txt`).
pub struct UciDirectory {
    base_url: String,
    client: Client,
}

impl UciDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        // 找不到的學生會被導向搜尋頁，不能跟隨
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn profile_url(&self, net_id: &NetId) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            VoteCheckError::InvalidConfigValueError {
                field: "DIRECTORY_BASE_URL".to_string(),
                value: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        url.path_segments_mut()
            .map_err(|_| VoteCheckError::InvalidConfigValueError {
                field: "DIRECTORY_BASE_URL".to_string(),
                value: self.base_url.clone(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(&format!("{}.txt", net_id));

        Ok(url)
    }
}

#[async_trait]
impl Directory for UciDirectory {
    async fn find_major(&self, net_id: &NetId) -> Result<MajorLookup> {
        let url = self.profile_url(net_id)?;
        tracing::debug!("Looking up {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            tracing::debug!("Directory answered {} for {}", response.status(), net_id);
            tracing::info!("{} - Not in UCI directory", net_id);
            return Ok(MajorLookup::NotListed);
        }

        let body = response.text().await?;
        match extract_major(&profile_text(&body)) {
            Some(major) => {
                tracing::info!("{} - {}", net_id, major);
                Ok(MajorLookup::Found(major))
            }
            None => {
                tracing::warn!("{} - no Major field in directory profile", net_id);
                Ok(MajorLookup::MissingMajorField)
            }
        }
    }
}

/// Plain text of the profile's `<body>`, line breaks kept.
pub fn profile_text(document: &str) -> String {
    let html = Html::parse_document(document);
    match Selector::parse("body") {
        Ok(selector) => html
            .select(&selector)
            .next()
            .map(|body| body.text().collect::<String>())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Second word of the first line mentioning "Major".
pub fn extract_major(text: &str) -> Option<MajorCode> {
    text.lines()
        .find(|line| line.contains(MAJOR_LABEL))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(MajorCode::new)
}
