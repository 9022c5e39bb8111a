//! Stealth and viewport setup for freshly opened pages

use anyhow::Result;
use chromiumoxide::Page;
use chromiumoxide_cdp::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide_cdp::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;

use super::js_scripts::STEALTH_SCRIPT;

/// Install stealth patches on every future document and pin a desktop
/// viewport so the portal serves its desktop card layout.
pub async fn enhance_page(page: &Page) -> Result<()> {
    match page
        .execute(AddScriptToEvaluateOnNewDocumentParams {
            source: STEALTH_SCRIPT.to_string(),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        })
        .await
    {
        Ok(_) => log::debug!("Stealth patches registered for new documents"),
        // Not fatal
        Err(e) => log::warn!("Failed to register stealth patches: {e}"),
    }

    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(1920)
            .height(1080)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await?;

    Ok(())
}
