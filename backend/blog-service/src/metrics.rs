use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Force registration of every counter so they show up before first use
pub fn initialize_metrics() {
    let _ = &*LOGIN_TOTAL;
    let _ = &*REGISTRATION_TOTAL;
    let _ = &*TOKEN_REVOCATIONS_TOTAL;
    let _ = &*ACCESS_REJECTED_TOTAL;
    let _ = &*PASSWORD_VERIFICATIONS_TOTAL;
}

fn counter_vec(name: &str, help: &str, label: &str) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), &[label])
        .expect("hardcoded metric definition is invalid - fix source code");
    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        tracing::error!("failed to register {} counter: {}", name, e);
    }
    counter
}

/// Login attempts by outcome (success / failure)
static LOGIN_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter_vec(
        "blog_login_total",
        "Login attempts by outcome",
        "outcome",
    )
});

/// Registration attempts by outcome (success / conflict / invalid)
static REGISTRATION_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter_vec(
        "blog_registration_total",
        "Registration attempts by outcome",
        "outcome",
    )
});

fn counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help)
        .expect("hardcoded metric definition is invalid - fix source code");
    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        tracing::error!("failed to register {} counter: {}", name, e);
    }
    counter
}

static TOKEN_REVOCATIONS_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("blog_token_revocations_total", "Tokens revoked through logout"));

/// Argon2 verifications, including the ones run for unknown usernames
static PASSWORD_VERIFICATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    counter(
        "blog_password_verifications_total",
        "Argon2 password verifications performed",
    )
});

/// Requests turned away by the access middleware, by reason
static ACCESS_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter_vec(
        "blog_access_rejected_total",
        "Requests rejected by authentication or authorization",
        "reason",
    )
});

#[inline]
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    LOGIN_TOTAL.with_label_values(&[outcome]).inc();
}

#[inline]
pub fn record_registration(outcome: &str) {
    REGISTRATION_TOTAL.with_label_values(&[outcome]).inc();
}

#[inline]
pub fn inc_token_revocations() {
    TOKEN_REVOCATIONS_TOTAL.inc();
}

#[inline]
pub fn record_access_rejected(reason: &str) {
    ACCESS_REJECTED_TOTAL.with_label_values(&[reason]).inc();
}

#[inline]
pub fn inc_password_verifications() {
    PASSWORD_VERIFICATIONS_TOTAL.inc();
}

pub fn password_verifications() -> u64 {
    PASSWORD_VERIFICATIONS_TOTAL.get()
}
