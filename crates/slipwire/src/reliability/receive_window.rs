use super::window::{in_window, next_seq};
use bytes::Bytes;

/// What one intact data frame did to the window.
#[derive(Debug)]
pub struct Accept {
    /// Payloads promoted to the application by this arrival, in sequence
    /// order. Empty when the frame was out of window or filled a gap that is
    /// still open.
    pub delivered: Vec<Bytes>,
    /// The cumulative acknowledgement to emit: the last in-order sequence
    /// number after any advance.
    pub ack: u8,
}

/// Receiver-side window state: `LFR` (last frame received in order) and
/// `LAF` (last acceptable frame) bound the acceptance interval; arrivals
/// inside it are parked in the slotted buffer until the gap before them
/// closes.
#[derive(Debug)]
pub struct ReceiveWindow {
    receive_size: u16,
    lfr: u8,
    laf: u8,
    slots: Vec<Option<Bytes>>,
}

impl ReceiveWindow {
    /// `window` must already be validated against the session bounds.
    pub fn new(window: usize) -> Self {
        let rws = window as u16;
        let receive_size = rws * 2;
        Self {
            receive_size,
            lfr: 0,
            laf: rws as u8,
            slots: vec![None; receive_size as usize],
        }
    }

    /// Ingests one intact frame. An arrival outside `(LFR, LAF]` is a
    /// duplicate or runs ahead of the window and changes nothing; either way
    /// the caller re-ACKs the returned cumulative sequence number, which is
    /// how a peer whose ACK was lost hears it again.
    pub fn accept(&mut self, seq: u8, payload: Bytes) -> Accept {
        let mut delivered = Vec::new();
        if u16::from(seq) < self.receive_size && in_window(self.lfr, self.laf, seq) {
            self.slots[usize::from(seq)] = Some(payload);
            loop {
                let next = next_seq(self.lfr, self.receive_size);
                let Some(ready) = self.slots[usize::from(next)].take() else {
                    break;
                };
                delivered.push(ready);
                self.lfr = next;
                self.laf = next_seq(self.laf, self.receive_size);
            }
        }
        Accept {
            delivered,
            ack: self.lfr,
        }
    }
}
