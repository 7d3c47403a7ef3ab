use std::net::SocketAddr;

// ── Command metrics ─────────────────────────────────────────────

/// Counter: shell commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "roombook_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "roombook_command_duration_seconds";

// ── Booking metrics ─────────────────────────────────────────────

/// Counter: reservation attempts. Labels: outcome (confirmed, conflict).
pub const RESERVATIONS_TOTAL: &str = "roombook_reservations_total";

/// Counter: hourly slots freed by cancellation.
pub const CANCELLATIONS_TOTAL: &str = "roombook_cancellations_total";

/// Counter: waitlisted requests promoted into a freed slot.
pub const PROMOTIONS_TOTAL: &str = "roombook_promotions_total";

/// Counter: hourly requests added to a waitlist.
pub const WAITLIST_ENQUEUED_TOTAL: &str = "roombook_waitlist_enqueued_total";

/// Gauge: confirmed bookings in the index.
pub const BOOKINGS_ACTIVE: &str = "roombook_bookings_active";

/// Counter: waitlist journal compactions.
pub const JOURNAL_COMPACTIONS_TOTAL: &str = "roombook_journal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
