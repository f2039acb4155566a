//! Watched toggle command handler

use crate::calendar::compute_window;
use crate::config::Config;
use crate::domain::EpisodeId;
use crate::state::SharedState;

use super::format_event;

pub async fn cmd_watched(config: &Config, episode_id: i64, unwatch: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let id = EpisodeId::new(episode_id);

    let episode = state.library.set_watched(id, !unwatch).await?;
    state.library.save().await?;

    let Some(air_time) = episode.air_time() else {
        println!("Episode {id} updated; it has no air date so it is not on the calendar.");
        return Ok(());
    };

    let stats = state.calendar.apply_episode_update(episode).await?;
    tracing::debug!(?stats, "Applied watched toggle");

    let Some(day) = state.calendar.locate(id).await else {
        println!("Episode {id} updated.");
        return Ok(());
    };

    // Load the rest of that day so the listing is complete.
    let window = compute_window(day.date(), state.calendar.default_mode());
    state.calendar.get_events_for_date_range(window).await?;

    let offset = state.calendar.offset().await;
    println!(
        "Episode {id} marked {} (aired {})",
        if unwatch { "not watched" } else { "watched" },
        air_time.with_timezone(&offset).format("%Y-%m-%d %H:%M %:z")
    );
    println!("{:-<60}", "");
    for event in state.calendar.get_events(day.date()).await {
        println!("{}", format_event(&event, offset));
    }

    Ok(())
}
