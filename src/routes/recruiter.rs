use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::{
    error::Result,
    middleware::auth::Principal,
    models::user::UserRole,
    services::feed_service::ApplicationEvent,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/recruiter/jobs",
    responses(
        (status = 200, description = "The recruiter's jobs with application counts", body = crate::services::report_service::RecruiterDashboard),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a recruiter")
    )
)]
pub async fn job_stats(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<impl IntoResponse> {
    let recruiter = principal.require_role(UserRole::Recruiter)?;
    let dashboard = state.report_service.recruiter_dashboard(recruiter.id).await?;
    Ok(Json(dashboard))
}

fn to_sse(event: &ApplicationEvent) -> Option<Event> {
    match Event::default().event(event.kind.as_str()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode application event");
            None
        }
    }
}

/// Events for `recruiter_id` only. Ends when the feed shuts down.
fn recruiter_events(
    rx: tokio::sync::broadcast::Receiver<ApplicationEvent>,
    recruiter_id: Uuid,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.recruiter_id == recruiter_id => {
                    if let Some(sse) = to_sse(&event) {
                        return Some((Ok(sse), rx));
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%recruiter_id, skipped, "application feed subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// Live application events for the recruiter's jobs.
///
/// Advisory only: events published while disconnected are not replayed.
#[utoipa::path(
    get,
    path = "/api/recruiter/applications/stream",
    responses(
        (status = 200, description = "text/event-stream of application.created and application.status_changed"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a recruiter")
    )
)]
pub async fn application_stream(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<impl IntoResponse> {
    let recruiter = principal.require_role(UserRole::Recruiter)?;
    tracing::debug!(recruiter_id = %recruiter.id, "application feed subscribed");
    let events = recruiter_events(state.feed.subscribe(), recruiter.id);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;
    use crate::services::feed_service::{ApplicationEventKind, ApplicationFeed};
    use futures_util::StreamExt;

    fn event_for(recruiter_id: Uuid) -> ApplicationEvent {
        ApplicationEvent {
            kind: ApplicationEventKind::StatusChanged,
            application_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            recruiter_id,
            status: ApplicationStatus::Viewed,
            at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn stream_only_carries_the_recruiters_own_events() {
        let feed = ApplicationFeed::new();
        let mine = Uuid::new_v4();
        let events = recruiter_events(feed.subscribe(), mine);
        futures_util::pin_mut!(events);

        feed.publish(event_for(Uuid::new_v4()));
        feed.publish(event_for(mine));
        drop(feed);

        assert!(events.next().await.is_some());
        assert!(events.next().await.is_none());
    }
}
