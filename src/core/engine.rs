use crate::app::{roster, updater};
use crate::config::VoteCheckConfig;
use crate::domain::model::{MissingMajorPolicy, RosterLayout, RunSummary};
use crate::domain::ports::{Directory, Worksheet};
use crate::utils::error::Result;
use crate::utils::pacing::Pacer;

pub struct VoteCheckEngine<W: Worksheet, D: Directory> {
    sheet: W,
    directory: D,
    layout: RosterLayout,
    policy: MissingMajorPolicy,
    pacer: Pacer,
}

impl<W: Worksheet, D: Directory> VoteCheckEngine<W, D> {
    pub fn new(sheet: W, directory: D, config: &VoteCheckConfig) -> Self {
        Self {
            sheet,
            directory,
            layout: config.layout.clone(),
            policy: config.missing_major,
            pacer: config.pacer(),
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Collecting net IDs from the response sheet");
        let net_ids = roster::collect_net_ids(&self.sheet, &self.layout, &self.pacer).await?;
        tracing::info!("Collected {} net IDs", net_ids.len());

        tracing::info!("🔍 Checking majors against the UCI directory");
        let summary = updater::update_voting_sheet(
            &self.sheet,
            &self.directory,
            &net_ids,
            &self.layout,
            self.policy,
            &self.pacer,
        )
        .await?;

        tracing::info!(
            "✅ Checked {} voters: {} eligible, {} flagged",
            summary.collected,
            summary.eligible,
            summary.flagged
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MajorCode, MajorLookup, NetId, RgbColor};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 記憶體中的回覆表
    struct MemorySheet {
        emails: HashMap<u32, String>,
        highlighted: Mutex<Vec<String>>,
    }

    impl Worksheet for MemorySheet {
        async fn cell_value(&self, row: u32, col: u32) -> Result<Option<String>> {
            assert_eq!(col, 2);
            Ok(self.emails.get(&row).cloned())
        }

        async fn format_background(&self, range: &str, _color: RgbColor) -> Result<()> {
            self.highlighted.lock().unwrap().push(range.to_string());
            Ok(())
        }
    }

    struct MajorTable(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl Directory for MajorTable {
        async fn find_major(&self, net_id: &NetId) -> Result<MajorLookup> {
            Ok(match self.0.get(net_id.as_str()) {
                Some(code) => MajorLookup::Found(MajorCode::new(*code)),
                None => MajorLookup::NotListed,
            })
        }
    }

    fn config() -> VoteCheckConfig {
        VoteCheckConfig::from_vars(HashMap::from([
            ("ELECTION_FORM".to_string(), "Election".to_string()),
            ("ELECTION_SHEET".to_string(), "Responses".to_string()),
            ("SERVICE_ACCOUNT_FILE".to_string(), "sa.json".to_string()),
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_collects_then_flags() {
        let sheet = MemorySheet {
            emails: HashMap::from([
                (2, "alice@uci.edu".to_string()),
                (3, "bob@uci.edu".to_string()),
                (4, "zot@uci.edu".to_string()),
            ]),
            highlighted: Mutex::new(Vec::new()),
        };
        let directory = MajorTable(HashMap::from([("alice", "CmptSci"), ("bob", "History")]));

        let engine = VoteCheckEngine::new(sheet, directory, &config()).with_pacer(Pacer::none());
        let summary = engine.run().await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                collected: 3,
                eligible: 1,
                flagged: 2
            }
        );
        assert_eq!(
            *engine.sheet.highlighted.lock().unwrap(),
            vec!["A3:K3".to_string(), "A4:K4".to_string()]
        );
    }
}
