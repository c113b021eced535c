use super::window::{in_window, next_seq};
use crate::consts::{MAX_RETRIES, RTO};
use crate::protocol::DataFrame;
use bytes::Bytes;
use tokio::time::Instant;

/// One entry of the slotted send buffer, indexed by sequence number. The
/// encoded frame is kept verbatim so retransmissions repeat the original
/// bytes exactly.
#[derive(Debug, Clone)]
struct Slot {
    frame: Bytes,
    armed: bool,
    expires_at: Instant,
    retries: u32,
}

/// Outcome of one retransmission sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sweep {
    /// No armed timer has expired.
    Idle,
    /// These slots expired and were re-armed; their frames must be resent,
    /// oldest first.
    Retransmit(Vec<u8>),
    /// A slot ran out of retries; the peer is unreachable.
    GiveUp { seq: u8, retries: u32 },
}

/// Sender-side window state: `LAR` (last ack received) and `LFS` (last frame
/// sent) bound the open interval of in-flight sequence numbers. Pure
/// bookkeeping — the session layer owns the clock, the lock, and the socket.
#[derive(Debug)]
pub struct SendWindow {
    sws: u16,
    send_size: u16,
    lar: u8,
    lfs: u8,
    slots_available: u16,
    slots: Vec<Slot>,
}

impl SendWindow {
    /// `window` must already be validated against the session bounds.
    pub fn new(window: usize) -> Self {
        let sws = window as u16;
        let send_size = sws * 2;
        let idle = Slot {
            frame: Bytes::new(),
            armed: false,
            expires_at: Instant::now(),
            retries: 0,
        };
        Self {
            sws,
            send_size,
            lar: 0,
            lfs: 0,
            slots_available: sws,
            slots: vec![idle; send_size as usize],
        }
    }

    pub fn slots_available(&self) -> u16 {
        self.slots_available
    }

    /// True when every submitted frame has been acknowledged.
    pub fn is_empty(&self) -> bool {
        self.lar == self.lfs
    }

    /// Claims the next sequence number for `payload`, stores its encoded
    /// frame, and arms the slot's retransmission timer. The caller must hold
    /// a free slot.
    pub fn stage(&mut self, payload: Bytes, now: Instant) -> (u8, Bytes) {
        debug_assert!(self.slots_available > 0);
        self.lfs = next_seq(self.lfs, self.send_size);
        let frame = DataFrame::new(self.lfs, payload).encode();
        let slot = &mut self.slots[usize::from(self.lfs)];
        slot.frame = frame.clone();
        slot.armed = true;
        slot.expires_at = now + RTO;
        slot.retries = 0;
        self.slots_available -= 1;
        (self.lfs, frame)
    }

    /// Applies a cumulative acknowledgement and returns the number of slots
    /// released. Zero means the ACK was stale, duplicate, or out of window,
    /// and nothing changed.
    pub fn acknowledge(&mut self, ack: u8) -> u16 {
        if u16::from(ack) >= self.send_size || !in_window(self.lar, self.lfs, ack) {
            return 0;
        }
        let mut released = 0;
        while self.lar != ack {
            self.lar = next_seq(self.lar, self.send_size);
            self.slots[usize::from(self.lar)].armed = false;
            self.slots_available += 1;
            released += 1;
        }
        released
    }

    /// Walks the in-flight interval oldest first, re-arming every expired
    /// slot for another round. Retry counters carry across re-arms; a slot
    /// that exceeds [`MAX_RETRIES`] expiries turns the sweep into a give-up.
    pub fn sweep(&mut self, now: Instant) -> Sweep {
        let mut expired = Vec::new();
        let mut seq = self.lar;
        while seq != self.lfs {
            seq = next_seq(seq, self.send_size);
            let slot = &mut self.slots[usize::from(seq)];
            if !slot.armed || slot.expires_at > now {
                continue;
            }
            slot.retries += 1;
            if slot.retries > MAX_RETRIES {
                return Sweep::GiveUp {
                    seq,
                    retries: slot.retries,
                };
            }
            slot.expires_at = now + RTO;
            expired.push(seq);
        }
        if expired.is_empty() {
            Sweep::Idle
        } else {
            Sweep::Retransmit(expired)
        }
    }

    /// The stored wire bytes for `seq`, for retransmission.
    pub fn frame(&self, seq: u8) -> &Bytes {
        &self.slots[usize::from(seq)].frame
    }

    #[cfg(test)]
    fn is_armed(&self, seq: u8) -> bool {
        self.slots[usize::from(seq)].armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK;
    use std::time::Duration;

    fn staged(window: &mut SendWindow, count: usize, now: Instant) {
        for i in 0..count {
            window.stage(Bytes::from(vec![i as u8; 16]), now);
        }
    }

    #[test]
    fn staging_fills_the_window() {
        let now = Instant::now();
        let mut window = SendWindow::new(4);
        assert_eq!(window.slots_available(), 4);

        staged(&mut window, 4, now);
        assert_eq!(window.slots_available(), 0);
        assert!(!window.is_empty());
        // armed exactly on the open interval (0, 4]
        for seq in 1..=4 {
            assert!(window.is_armed(seq));
        }
        assert!(!window.is_armed(0));
        assert!(!window.is_armed(5));
    }

    #[test]
    fn cumulative_ack_releases_every_slot_up_to_it() {
        let now = Instant::now();
        let mut window = SendWindow::new(4);
        staged(&mut window, 4, now);

        assert_eq!(window.acknowledge(3), 3);
        assert_eq!(window.slots_available(), 3);
        assert!(!window.is_armed(1));
        assert!(!window.is_armed(2));
        assert!(!window.is_armed(3));
        assert!(window.is_armed(4));

        assert_eq!(window.acknowledge(4), 1);
        assert!(window.is_empty());
        assert_eq!(window.slots_available(), 4);
    }

    #[test]
    fn duplicate_and_stale_acks_change_nothing() {
        let now = Instant::now();
        let mut window = SendWindow::new(4);
        staged(&mut window, 3, now);

        assert_eq!(window.acknowledge(2), 2);
        // the boundary itself is outside the open interval
        assert_eq!(window.acknowledge(2), 0);
        // never sent
        assert_eq!(window.acknowledge(7), 0);
        // not a sequence number of this session at all
        assert_eq!(window.acknowledge(200), 0);
        assert_eq!(window.slots_available(), 3);
    }

    #[test]
    fn sequence_numbers_wrap_through_the_send_size() {
        let now = Instant::now();
        let mut window = SendWindow::new(2);
        let mut expect = 0u8;
        for _ in 0..10 {
            let (seq, _) = window.stage(Bytes::from_static(b"x"), now);
            expect = next_seq(expect, 4);
            assert_eq!(seq, expect);
            assert_eq!(window.acknowledge(seq), 1);
        }
        assert!(window.is_empty());
    }

    #[test]
    fn sweep_rearms_expired_slots_oldest_first() {
        let now = Instant::now();
        let mut window = SendWindow::new(4);
        staged(&mut window, 3, now);

        assert_eq!(window.sweep(now), Sweep::Idle);

        let later = now + RTO + TICK;
        assert_eq!(window.sweep(later), Sweep::Retransmit(vec![1, 2, 3]));
        // freshly re-armed, nothing due until another timeout passes
        assert_eq!(window.sweep(later), Sweep::Idle);
        assert_eq!(
            window.sweep(later + RTO + TICK),
            Sweep::Retransmit(vec![1, 2, 3])
        );
    }

    #[test]
    fn acknowledged_slots_drop_out_of_the_sweep() {
        let now = Instant::now();
        let mut window = SendWindow::new(4);
        staged(&mut window, 4, now);
        window.acknowledge(2);

        assert_eq!(
            window.sweep(now + RTO + TICK),
            Sweep::Retransmit(vec![3, 4])
        );
    }

    #[test]
    fn retries_exhaust_into_give_up() {
        let mut now = Instant::now();
        let mut window = SendWindow::new(1);
        window.stage(Bytes::from_static(b"doomed"), now);

        for round in 1..=MAX_RETRIES {
            now += RTO + Duration::from_millis(1);
            assert_eq!(
                window.sweep(now),
                Sweep::Retransmit(vec![1]),
                "round {round}"
            );
        }
        now += RTO + Duration::from_millis(1);
        assert_eq!(
            window.sweep(now),
            Sweep::GiveUp {
                seq: 1,
                retries: MAX_RETRIES + 1
            }
        );
    }

    #[test]
    fn stored_frames_are_retransmitted_verbatim() {
        let now = Instant::now();
        let mut window = SendWindow::new(2);
        let (seq, wire) = window.stage(Bytes::from_static(b"keep me"), now);
        assert_eq!(window.frame(seq), &wire);
    }
}
