use crate::domain::model::{NetId, RosterLayout};
use crate::domain::ports::Worksheet;
use crate::utils::error::Result;
use crate::utils::pacing::Pacer;

/// An empty or absent email cell ends the roster. A blank cell in the middle
/// of the responses therefore cuts the roster short.
pub fn is_end_of_roster(cell: Option<&str>) -> bool {
    cell.map_or(true, str::is_empty)
}

/// Reads the email column top to bottom and turns each address into a net ID.
///
/// The Nth ID returned belongs to row `layout.start_row + N`.
pub async fn collect_net_ids<W: Worksheet>(
    sheet: &W,
    layout: &RosterLayout,
    pacer: &Pacer,
) -> Result<Vec<NetId>> {
    let mut net_ids = Vec::new();
    let mut row = layout.start_row;

    loop {
        let cell = sheet.cell_value(row, layout.email_col).await?;
        if is_end_of_roster(cell.as_deref()) {
            tracing::debug!("Roster ends at row {}", row);
            break;
        }

        let net_id = NetId::from_email(cell.as_deref().unwrap_or_default());
        tracing::info!("{}", net_id);
        net_ids.push(net_id);

        row += 1;
        pacer.pause().await;
    }

    Ok(net_ids)
}
