//! Device classification from user agent and viewport signals.
//!
//! Everything here is a pure function of its inputs, so callers gather the
//! signals (from a browser, request headers, or a test) and pass them in.

/// Narrow side of the screen below which a device counts as small
const SMALL_SCREEN_PX: u32 = 768;

/// Score at or above which a device is classified as mobile
const MOBILE_SCORE_THRESHOLD: u8 = 3;

const MOBILE_UA_MARKERS: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSignals<'a> {
    pub user_agent: &'a str,
    pub screen_width: u32,
    pub screen_height: u32,
    pub device_pixel_ratio: f64,
    pub has_touch: bool,
    pub has_orientation: bool,
}

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_UA_MARKERS.iter().any(|marker| ua.contains(marker))
}

/// Weighted evidence that the device is mobile.
/// Touch and pixel density only count on small screens.
pub fn mobile_score(signals: &DeviceSignals) -> u8 {
    let small_screen = signals.screen_width.min(signals.screen_height) < SMALL_SCREEN_PX;

    let mut score = 0;
    if is_mobile_user_agent(signals.user_agent) {
        score += 3;
    }
    if small_screen {
        score += 2;
    }
    if signals.has_touch && small_screen {
        score += 2;
    }
    if signals.device_pixel_ratio > 1.5 && small_screen {
        score += 1;
    }
    if signals.has_orientation {
        score += 1;
    }
    score
}

pub fn classify(signals: &DeviceSignals) -> DeviceType {
    if mobile_score(signals) >= MOBILE_SCORE_THRESHOLD {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}

/// Layout breakpoint for a viewport width in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    pub fn from_width(width: u32) -> Self {
        match width {
            0..=767 => Breakpoint::Mobile,
            768..=1023 => Breakpoint::Tablet,
            _ => Breakpoint::Desktop,
        }
    }
}
