// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Telemetry record and request back-pressure.
//!
//! Requests are queued and served one per diagnostic tick. When the queue is full the oldest
//! pending request is dropped and answered `busy`, so a flooding client always gets the freshest
//! samples and never stalls the loop.

use heapless::Deque;

use crate::config::TELEMETRY_QUEUE_DEPTH;

pub const TELEMETRY_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryRecord {
    pub pitch: f32,
    pub average_wheel_velocity: f32,
    pub yaw: f32,
}

impl TelemetryRecord {
    /// Three little-endian `f32`s in field order.
    pub fn to_bytes(&self) -> [u8; TELEMETRY_LEN] {
        let mut out = [0u8; TELEMETRY_LEN];
        out[0..4].copy_from_slice(&self.pitch.to_le_bytes());
        out[4..8].copy_from_slice(&self.average_wheel_velocity.to_le_bytes());
        out[8..12].copy_from_slice(&self.yaw.to_le_bytes());
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryRequest {
    pub seq: u16,
}

pub struct TelemetryQueue {
    pending: Deque<TelemetryRequest, TELEMETRY_QUEUE_DEPTH>,
    next_seq: u16,
}

impl TelemetryQueue {
    pub fn new() -> Self {
        Self {
            pending: Deque::new(),
            next_seq: 0,
        }
    }

    /// Queue a request. Returns the request that was dropped to make room, if any.
    pub fn push(&mut self) -> Option<TelemetryRequest> {
        let req = TelemetryRequest { seq: self.next_seq };
        self.next_seq = self.next_seq.wrapping_add(1);

        let dropped = if self.pending.is_full() {
            self.pending.pop_front()
        } else {
            None
        };
        // Cannot fail: one slot was freed above if the queue was full.
        let _ = self.pending.push_back(req);
        dropped
    }

    /// Oldest pending request.
    pub fn pop(&mut self) -> Option<TelemetryRequest> {
        self.pending.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for TelemetryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_pitch_velocity_yaw() {
        let r = TelemetryRecord {
            pitch: 1.0,
            average_wheel_velocity: 2.0,
            yaw: 3.0,
        };
        let b = r.to_bytes();
        assert_eq!(f32::from_le_bytes([b[0], b[1], b[2], b[3]]), 1.0);
        assert_eq!(f32::from_le_bytes([b[4], b[5], b[6], b[7]]), 2.0);
        assert_eq!(f32::from_le_bytes([b[8], b[9], b[10], b[11]]), 3.0);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut q = TelemetryQueue::new();
        for _ in 0..TELEMETRY_QUEUE_DEPTH {
            assert_eq!(q.push(), None);
        }
        assert_eq!(q.push(), Some(TelemetryRequest { seq: 0 }));
        assert_eq!(q.push(), Some(TelemetryRequest { seq: 1 }));
        assert_eq!(q.len(), TELEMETRY_QUEUE_DEPTH);

        assert_eq!(q.pop(), Some(TelemetryRequest { seq: 2 }));
    }

    #[test]
    fn served_in_order() {
        let mut q = TelemetryQueue::new();
        q.push();
        q.push();
        assert_eq!(q.pop().map(|r| r.seq), Some(0));
        assert_eq!(q.pop().map(|r| r.seq), Some(1));
        assert!(q.is_empty());
    }
}
