// Adaptive rate controller
// Turns response status codes into an advised request rate and a recommended pause.
// It only computes advice; Transport decides whether to apply it.

use std::sync::Mutex;
use std::time::Duration;

const MIN_RATE: u32 = 1;
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const WAF_PAUSE: Duration = Duration::from_secs(1);
const UNAVAILABLE_PAUSE: Duration = Duration::from_secs(2);

/// What the controller recommends after one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advice {
    pub rate: u32,
    pub pause: Duration,
}

#[derive(Debug)]
struct ControllerState {
    current_rate: u32,
    consecutive_429: u32,
}

#[derive(Debug)]
pub struct AdaptiveController {
    base_rate: u32,
    state: Mutex<ControllerState>,
}

impl AdaptiveController {
    pub fn new(base_rate: u32) -> Self {
        let base_rate = base_rate.max(MIN_RATE);
        Self {
            base_rate,
            state: Mutex::new(ControllerState {
                current_rate: base_rate,
                consecutive_429: 0,
            }),
        }
    }

    pub fn on_response(&self, status: u16) -> Advice {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let pause = match status {
            429 => {
                state.consecutive_429 = state.consecutive_429.saturating_add(1);
                state.current_rate = (state.current_rate / 2).max(MIN_RATE);
                backoff_for(state.consecutive_429)
            }
            // Possibly a WAF
            403 => {
                state.current_rate = (state.current_rate / 2).max(MIN_RATE);
                WAF_PAUSE
            }
            503 => UNAVAILABLE_PAUSE,
            _ => {
                state.consecutive_429 = 0;
                if state.current_rate < self.base_rate {
                    state.current_rate += 1;
                }
                Duration::ZERO
            }
        };
        Advice {
            rate: state.current_rate,
            pause,
        }
    }

    pub fn current_rate(&self) -> u32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).current_rate
    }

    pub fn base_rate(&self) -> u32 {
        self.base_rate
    }
}

/// min(2^n seconds, 30s)
fn backoff_for(consecutive: u32) -> Duration {
    1u64.checked_shl(consecutive)
        .map(Duration::from_secs)
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}
