//! Slack request signing (HMAC-SHA256 over `v0:{timestamp}:{body}`).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::error::{SlackError, SlackResult};

/// Requests older (or newer) than this are rejected as replays.
pub const MAX_TIMESTAMP_AGE_SECS: u64 = 300;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

type HmacSha256 = Hmac<Sha256>;

/// Verify a request against the current wall clock.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &str,
    signature: &str,
) -> SlackResult<()> {
    let now = u64::try_from(chrono::Utc::now().timestamp())
        .map_err(|_| SlackError::Signature("system clock before epoch".into()))?;
    verify_signature_at(signing_secret, timestamp, body, signature, now)
}

/// Verify a request as of `now` (seconds since the epoch).
pub fn verify_signature_at(
    signing_secret: &str,
    timestamp: &str,
    body: &str,
    signature: &str,
    now: u64,
) -> SlackResult<()> {
    let ts: u64 = timestamp
        .parse()
        .map_err(|_| SlackError::Signature("invalid timestamp".into()))?;

    if now.abs_diff(ts) > MAX_TIMESTAMP_AGE_SECS {
        warn!(timestamp = ts, now, "Slack request timestamp outside replay window");
        return Err(SlackError::Signature(
            "request timestamp is too old or in the future".into(),
        ));
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|digest| hex::decode(digest).ok())
        .ok_or_else(|| SlackError::Signature("malformed signature".into()))?;

    let mut mac = keyed_mac(signing_secret)?;
    mac.update(format!("v0:{timestamp}:{body}").as_bytes());
    if mac.verify_slice(&provided).is_err() {
        warn!("Slack signature mismatch");
        return Err(SlackError::Signature("signature mismatch".into()));
    }

    debug!("Slack signature verified");
    Ok(())
}

/// The `v0=` signature Slack would send for this request.
pub fn sign(signing_secret: &str, timestamp: &str, body: &str) -> SlackResult<String> {
    let mut mac = keyed_mac(signing_secret)?;
    mac.update(format!("v0:{timestamp}:{body}").as_bytes());
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

fn keyed_mac(signing_secret: &str) -> SlackResult<HmacSha256> {
    HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| SlackError::Signature("invalid signing secret".into()))
}
