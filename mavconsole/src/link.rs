//! Link quality diagnostics.
//!
//! The host owns the links and reports per-link counters as [`LinkStats`].
//! On each primary HEARTBEAT the monitor turns them into one `Link{n}` field
//! per link on row 1. RADIO / RADIO_STATUS become the `Radio` field.
//!
//! # Link line
//!
//! ```text
//! Link {label} down
//! Link {label} OK {pct:.1}% ({n} pkts, {n} lost, {d:.2}s delay[, !KEY][, !SIGNING][, {n} badsigs])
//! ```
//!
//! Healthy links are dark green. Any signing problem, or a delay above one
//! second, escalates to orange. A down link is red.

use std::fmt;

use crate::message::RadioStatus;
use crate::sink::{StatusColor, StatusField};

/// Row used by link fields.
pub const LINK_ROW: u8 = 1;

/// Delay above which a link line turns orange, seconds.
pub const LINK_DELAY_WARN_SECS: f64 = 1.0;

/// Radio margin: RSSI below noise + this is shown red.
pub const RADIO_MARGIN: u16 = 10;

/// Message-signing counters of a link, when the link supports signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SigningStats {
    /// Signed packets received.
    pub sig_count: u32,
    /// Whether a secret key is configured locally.
    pub has_secret_key: bool,
    /// Whether outgoing packets are signed.
    pub sign_outgoing: bool,
    /// Packets rejected for a bad signature.
    pub badsig_count: u32,
}

/// Per-link counters reported by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkStats {
    /// 1-based link number.
    pub link_num: u8,
    /// Human label, e.g. the device or URL.
    pub label: String,
    pub packets_received: u64,
    pub packets_lost: u64,
    /// Whether the link is currently down.
    pub link_error: bool,
    /// Seconds this link lags behind the freshest link.
    pub delay: f64,
    /// `None` when the link has no signing support.
    pub signing: Option<SigningStats>,
}

impl LinkStats {
    /// A healthy link with the given counters.
    pub fn new(link_num: u8, label: impl Into<String>, received: u64, lost: u64) -> Self {
        Self {
            link_num,
            label: label.into(),
            packets_received: received,
            packets_lost: lost,
            ..Default::default()
        }
    }

    pub fn with_error(mut self, link_error: bool) -> Self {
        self.link_error = link_error;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_signing(mut self, signing: SigningStats) -> Self {
        self.signing = Some(signing);
        self
    }

    /// Percentage of packets received, 100 when nothing was counted.
    pub fn received_percent(&self) -> f64 {
        let total = self.packets_received + self.packets_lost;
        if total == 0 {
            100.0
        } else {
            100.0 * self.packets_received as f64 / total as f64
        }
    }
}

/// Summary of a link's signing situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningState {
    /// No signed traffic seen, or no signing support.
    #[default]
    None,
    /// Signed packets arrive but no key is configured to verify them.
    Unverifiable,
    /// Signed packets arrive but outgoing packets are unsigned.
    UnsignedReply,
    /// Signed in both directions, all signatures valid.
    Verified,
    /// Signed in both directions, some signatures rejected.
    BadSignatures,
}

impl SigningState {
    /// Classify signing counters.
    pub fn from_stats(stats: Option<&SigningStats>) -> Self {
        match stats {
            Some(s) if s.sig_count > 0 => {
                if !s.has_secret_key {
                    SigningState::Unverifiable
                } else if !s.sign_outgoing {
                    SigningState::UnsignedReply
                } else if s.badsig_count > 0 {
                    SigningState::BadSignatures
                } else {
                    SigningState::Verified
                }
            }
            _ => SigningState::None,
        }
    }

    /// Whether this state warrants a warning color.
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            SigningState::Unverifiable | SigningState::UnsignedReply | SigningState::BadSignatures
        )
    }
}

impl fmt::Display for SigningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SigningState::None => "none",
            SigningState::Unverifiable => "unverifiable",
            SigningState::UnsignedReply => "unsigned reply",
            SigningState::Verified => "verified",
            SigningState::BadSignatures => "bad signatures",
        })
    }
}

/// Derived view of one link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub link_num: u8,
    pub text: String,
    pub color: StatusColor,
    pub signing: SigningState,
}

impl LinkRecord {
    /// Derive the display line for `stats`. `delay` is the delay to show
    /// (0 when delay checking is off).
    pub fn derive(stats: &LinkStats, delay: f64) -> Self {
        let signing = SigningState::from_stats(stats.signing.as_ref());

        if stats.link_error {
            return Self {
                link_num: stats.link_num,
                text: format!("Link {} down", stats.label),
                color: StatusColor::Red,
                signing,
            };
        }

        let mut bits = vec![
            format!("{} pkts", stats.packets_received),
            format!("{} lost", stats.packets_lost),
            format!("{:.2}s delay", delay),
        ];

        match signing {
            SigningState::Unverifiable => bits.push("!KEY".to_string()),
            SigningState::UnsignedReply => bits.push("!SIGNING".to_string()),
            _ => {}
        }
        if signing != SigningState::None {
            if let Some(s) = stats.signing.as_ref().filter(|s| s.badsig_count > 0) {
                bits.push(format!("{} badsigs", s.badsig_count));
            }
        }

        let color = if signing.is_problem() || delay > LINK_DELAY_WARN_SECS {
            StatusColor::Orange
        } else {
            StatusColor::DarkGreen
        };

        Self {
            link_num: stats.link_num,
            text: format!(
                "Link {} OK {:.1}% ({})",
                stats.label,
                stats.received_percent(),
                bits.join(", ")
            ),
            color,
            signing,
        }
    }

    /// Status key for this link.
    pub fn key(&self) -> String {
        link_key(self.link_num)
    }

    pub fn to_field(&self) -> StatusField {
        StatusField::new(self.key(), self.text.clone(), self.color, LINK_ROW)
    }
}

fn link_key(link_num: u8) -> String {
    format!("Link{}", link_num)
}

/// Tracks how many link fields are on screen.
#[derive(Debug, Default)]
pub struct LinkMonitor {
    max_link_num: usize,
}

impl LinkMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of link fields last shown.
    pub fn shown_links(&self) -> usize {
        self.max_link_num
    }

    /// Fields to emit for the current links.
    ///
    /// When the number of links changed, every previously shown link field
    /// is blanked first.
    pub fn update(&mut self, links: &[LinkStats], check_delay: bool) -> Vec<StatusField> {
        let mut fields = Vec::new();

        if self.max_link_num != links.len() {
            tracing::debug!(from = self.max_link_num, to = links.len(), "Link count changed");
            for n in 1..=self.max_link_num {
                let key = link_key(u8::try_from(n).unwrap_or(u8::MAX));
                fields.push(StatusField::new(key, "", StatusColor::Black, LINK_ROW));
            }
            self.max_link_num = links.len();
        }

        for stats in links {
            let delay = if check_delay { stats.delay } else { 0.0 };
            fields.push(LinkRecord::derive(stats, delay).to_field());
        }
        fields
    }
}

/// `Radio` field for RADIO / RADIO_STATUS.
pub fn radio_status_field(radio: &RadioStatus) -> StatusField {
    let weak = u16::from(radio.rssi) < u16::from(radio.noise) + RADIO_MARGIN
        || u16::from(radio.remrssi) < u16::from(radio.remnoise) + RADIO_MARGIN;
    let color = if weak {
        StatusColor::Red
    } else {
        StatusColor::Black
    };
    StatusField::new(
        "Radio",
        format!(
            "Radio {}/{} {}/{}",
            radio.rssi, radio.noise, radio.remrssi, radio.remnoise
        ),
        color,
        0,
    )
}
