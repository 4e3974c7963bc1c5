use std::{panic::AssertUnwindSafe, sync::Arc};

use {
    futures::FutureExt,
    tokio::task::JoinHandle,
    tortuga_commands::{HandlerRegistry, SlashContext},
    tortuga_common::{BotError, SlashEvent},
    tracing::info,
};

#[cfg(feature = "metrics")]
use tortuga_metrics::{counter, dispatch as dispatch_metrics, histogram, labels};

use crate::{
    DispatchReport, Error, NotFoundHandler, Outcome, RouteKind, Shared,
    render::{log_failure, respond_error},
};

/// Routes slash interactions to [`SlashHandler`](tortuga_commands::SlashHandler)s.
#[derive(Clone)]
pub struct SlashDispatcher {
    shared: Arc<Shared>,
    not_found: Arc<dyn NotFoundHandler>,
}

impl SlashDispatcher {
    pub(crate) fn new(shared: Arc<Shared>, not_found: Arc<dyn NotFoundHandler>) -> Self {
        Self { shared, not_found }
    }

    pub(crate) fn with_not_found(mut self, not_found: Arc<dyn NotFoundHandler>) -> Self {
        self.not_found = not_found;
        self
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.shared.registry
    }

    pub fn workers(&self) -> usize {
        self.shared.pool.size()
    }

    /// Spawn the handler named by the interaction and return immediately.
    pub fn dispatch(&self, event: SlashEvent) -> JoinHandle<DispatchReport> {
        info!(
            command = %event.command_name,
            user = %event.user,
            channel = %event.channel.id,
            "slash command received"
        );
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::EVENTS_TOTAL, labels::KIND => "slash").increment(1);

        let shared = Arc::clone(&self.shared);
        let not_found = Arc::clone(&self.not_found);
        self.shared.pool.spawn(run(shared, not_found, event))
    }
}

async fn run(
    shared: Arc<Shared>,
    not_found: Arc<dyn NotFoundHandler>,
    event: SlashEvent,
) -> DispatchReport {
    let command = event.command_name.clone();
    let report = |outcome| DispatchReport {
        kind: RouteKind::Slash,
        command: command.clone(),
        outcome,
    };

    let Some(factory) = shared.registry.slash(&command).cloned() else {
        #[cfg(feature = "metrics")]
        counter!(dispatch_metrics::NOT_FOUND_TOTAL, labels::KIND => "slash").increment(1);
        if let Err(source) = not_found.slash_not_found(&event).await {
            let err = Error::Execution {
                kind: RouteKind::Slash,
                command: command.clone(),
                source,
            };
            log_failure(&err);
            respond_error(&shared, &event.interaction, err.into()).await;
        }
        return report(Outcome::NotFound);
    };

    let interaction = event.interaction.clone();
    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();

    let execution = AssertUnwindSafe(async {
        let handler = factory().map_err(|source| Error::Instantiation {
            kind: RouteKind::Slash,
            command: command.clone(),
            source,
        })?;
        let ctx = SlashContext::new(event, Arc::clone(&shared.client), shared.palette);
        handler
            .handle(ctx)
            .await
            .map_err(|source| Error::Execution {
                kind: RouteKind::Slash,
                command: command.clone(),
                source,
            })
    })
    .catch_unwind()
    .await;

    #[cfg(feature = "metrics")]
    histogram!(dispatch_metrics::HANDLER_DURATION_SECONDS, labels::KIND => "slash")
        .record(started.elapsed().as_secs_f64());

    let result = execution.unwrap_or_else(|payload| {
        Err(Error::Execution {
            kind: RouteKind::Slash,
            command: command.clone(),
            source: BotError::panicked(payload.as_ref()),
        })
    });

    match result {
        Ok(()) => report(Outcome::Handled),
        Err(err) => {
            log_failure(&err);
            let warning = err.is_warning();
            #[cfg(feature = "metrics")]
            counter!(
                dispatch_metrics::FAILURES_TOTAL,
                labels::KIND => "slash",
                labels::SEVERITY => if warning { "warning" } else { "error" }
            )
            .increment(1);
            respond_error(&shared, &interaction, err.into()).await;
            report(Outcome::Failed { warning })
        },
    }
}
