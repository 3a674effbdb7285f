//! Prometheus metrics for the group pipeline.
//!
//! This module provides metrics for:
//! - Group outcomes and create attempts
//! - Challenge solving
//! - Token refreshes and photo uploads

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

// =============================================================================
// Groups
// =============================================================================

/// Group requests processed, by recorded outcome.
pub static GROUPS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("groupforge_groups_processed_total", "Group requests processed"),
        &["result"], // "have_photo", "no_photo", "not_created"
    )
    .unwrap()
});

/// Create-group calls, by classified outcome.
pub static CREATE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "groupforge_create_attempts_total",
            "Create-group calls issued to the platform",
        ),
        &["outcome"], // "created", "challenge", "rejected", "unextractable", "transport"
    )
    .unwrap()
});

/// Wall time spent on one group request.
pub static GROUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "groupforge_group_duration_seconds",
            "Duration of processing one group request",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// External services
// =============================================================================

/// Challenge solve attempts by result.
pub static CHALLENGE_SOLVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("groupforge_challenge_solves_total", "Challenge solve attempts"),
        &["result"], // "solved", "failed", "timeout", "cancelled"
    )
    .unwrap()
});

/// Access token refreshes by result.
pub static TOKEN_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("groupforge_token_refreshes_total", "Access token refreshes"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Photo upload sub-pipeline runs by result (failures labelled with the stage).
pub static PHOTO_UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("groupforge_photo_uploads_total", "Group photo uploads"),
        &["result"], // "success", "request_server", "upload", "save", "render"
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

/// Get all metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(GROUPS_PROCESSED.clone()),
        Box::new(CREATE_ATTEMPTS.clone()),
        Box::new(GROUP_DURATION.clone()),
        Box::new(CHALLENGE_SOLVES.clone()),
        Box::new(TOKEN_REFRESHES.clone()),
        Box::new(PHOTO_UPLOADS.clone()),
    ]
}

/// Process-wide registry holding every pipeline metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
