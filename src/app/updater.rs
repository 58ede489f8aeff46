use crate::domain::model::{MissingMajorPolicy, NetId, RgbColor, RosterLayout, RunSummary};
use crate::domain::ports::{Directory, Worksheet};
use crate::utils::a1;
use crate::utils::error::{Result, VoteCheckError};
use crate::utils::pacing::Pacer;

/// 逐列檢查資格，不符合的整列標成淺紅色
///
/// Stops at the first error. Rows highlighted before that stay highlighted.
pub async fn update_voting_sheet<W, D>(
    sheet: &W,
    directory: &D,
    net_ids: &[NetId],
    layout: &RosterLayout,
    policy: MissingMajorPolicy,
    pacer: &Pacer,
) -> Result<RunSummary>
where
    W: Worksheet,
    D: Directory + ?Sized,
{
    let mut summary = RunSummary {
        collected: net_ids.len(),
        ..RunSummary::default()
    };

    for (position, net_id) in net_ids.iter().enumerate() {
        let row = layout
            .row_for(position)
            .ok_or_else(|| VoteCheckError::InvalidRange {
                range: format!("row {} + {}", layout.start_row, position),
            })?;

        if directory.is_eligible(net_id, policy).await? {
            summary.eligible += 1;
        } else {
            let range = a1::row_span(row, &layout.first_col, &layout.last_col);
            tracing::debug!("Flagging {} at {}", net_id, range);
            sheet.format_background(&range, RgbColor::INVALID).await?;
            summary.flagged += 1;
        }

        pacer.pause().await;
    }

    Ok(summary)
}
