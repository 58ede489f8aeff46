use crate::domain::model::{MajorLookup, MissingMajorPolicy, NetId, RgbColor};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A single worksheet of the election response spreadsheet.
pub trait Worksheet: Send + Sync {
    /// `None` when the cell has no value. Rows and columns are 1-based.
    fn cell_value(
        &self,
        row: u32,
        col: u32,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// `range` is A1 notation, e.g. `A3:K3`.
    fn format_background(
        &self,
        range: &str,
        color: RgbColor,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_major(&self, net_id: &NetId) -> Result<MajorLookup>;

    async fn is_eligible(&self, net_id: &NetId, policy: MissingMajorPolicy) -> Result<bool> {
        self.find_major(net_id).await?.eligibility(net_id, policy)
    }
}
